use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let Json(body) = payload?;

    // A malformed email is just another unknown account
    let email = EmailAddress::new(body.email).map_err(|_| ApiError::invalid_credentials())?;

    let session = state
        .user_service
        .authenticate(&email, &body.password)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LoginResponseData {
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            token_type: BEARER.to_string(),
        },
    ))
}

pub(crate) const BEARER: &str = "Bearer";

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "identifier")]
    email: String,
    #[serde(alias = "secret")]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}
