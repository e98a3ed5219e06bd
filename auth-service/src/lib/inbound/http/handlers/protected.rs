use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

pub async fn protected(
    user: AuthenticatedUser,
) -> Result<ApiSuccess<ProtectedResponseData>, ApiError> {
    Ok(ApiSuccess::new(StatusCode::OK, user.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectedResponseData {
    pub message: String,
    pub email: String,
    pub name: String,
}

impl From<AuthenticatedUser> for ProtectedResponseData {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            message: format!(
                "This is a protected route. Hello, {} ({})!",
                user.name, user.email
            ),
            email: user.email,
            name: user.name,
        }
    }
}
