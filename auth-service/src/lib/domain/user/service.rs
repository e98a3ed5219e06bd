use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::JwtError;
use auth::TokenKind;
use chrono::Utc;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserSession;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
    /// Unknown emails are verified against this so both login failure paths
    /// cost one Argon2 run at the configured work factor.
    unknown_user_password_hash: String,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Password hashing and token issuance
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        let unknown_user_password_hash = authenticator.decoy_password_hash();

        Self {
            repository,
            authenticator,
            unknown_user_password_hash,
        }
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        let password_hash = self.authenticator.hash_password(&command.password)?;

        let user = User {
            id: UserId::new(),
            email: command.email,
            name: command.name,
            password_hash,
            created_at: Utc::now(),
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, "User created");

        Ok(created_user)
    }

    async fn authenticate(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<UserSession, UserError> {
        let Some(user) = self.repository.find_by_email(email).await? else {
            let _ = self
                .authenticator
                .verify_password(password, &self.unknown_user_password_hash);
            tracing::info!("Login rejected: unknown email");
            return Err(UserError::InvalidCredentials);
        };

        let tokens = self
            .authenticator
            .authenticate(password, &user.password_hash, &user.identity())
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => {
                    tracing::info!(user_id = %user.id, "Login rejected: wrong password");
                    UserError::InvalidCredentials
                }
                AuthenticationError::PasswordError(err) => UserError::Password(err),
                AuthenticationError::JwtError(err) => UserError::Token(err),
            })?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(UserSession { user, tokens })
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, UserError> {
        let claims = self.authenticator.validate_refresh_token(refresh_token)?;

        let email = EmailAddress::new(claims.sub)
            .map_err(|_| JwtError::InvalidToken("subject is not an email address".to_string()))?;

        let user = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or_else(|| JwtError::InvalidToken("subject is no longer registered".to_string()))?;

        let access_token = self
            .authenticator
            .issue_token(&user.identity(), TokenKind::Access)?;
        tracing::debug!(user_id = %user.id, "Access token refreshed");

        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use auth::PasswordHasher;
    use auth::Secret;
    use auth::WorkFactor;
    use chrono::Duration;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::DisplayName;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;
        }
    }

    fn test_authenticator() -> Arc<Authenticator> {
        let hasher = PasswordHasher::with_work_factor(WorkFactor {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();

        Arc::new(
            Authenticator::new(&Secret::from("test-secret-key-for-jwt-signing-at-least-32-bytes"))
                .with_password_hasher(hasher),
        )
    }

    fn stored_user(authenticator: &Authenticator, password: &str) -> User {
        User {
            id: UserId::new(),
            email: EmailAddress::new("a@x.com".to_string()).unwrap(),
            name: DisplayName::new("Ann".to_string()).unwrap(),
            password_hash: authenticator.hash_password(password).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn email(raw: &str) -> EmailAddress {
        EmailAddress::new(raw.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "a@x.com"
                    && user.name.as_str() == "Ann"
                    && user.password_hash.starts_with("$argon2")
                    && user.password_hash != "pw123!"
            })
            .times(1)
            .returning(|user| Ok(user));

        let service = UserService::new(Arc::new(repository), test_authenticator());

        let command = CreateUserCommand::new(
            email("a@x.com"),
            DisplayName::new("Ann".to_string()).unwrap(),
            "pw123!".to_string(),
        );

        let user = service.create_user(command).await.unwrap();
        assert_eq!(user.email.as_str(), "a@x.com");
        assert_eq!(user.name.as_str(), "Ann");
        assert!(user.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let mut repository = MockTestUserRepository::new();

        repository.expect_create().times(1).returning(|user| {
            Err(UserError::EmailAlreadyExists(
                user.email.as_str().to_string(),
            ))
        });

        let service = UserService::new(Arc::new(repository), test_authenticator());

        let command = CreateUserCommand::new(
            email("a@x.com"),
            DisplayName::new("Ann".to_string()).unwrap(),
            "pw123!".to_string(),
        );

        let result = service.create_user(command).await;
        assert!(matches!(
            result.unwrap_err(),
            UserError::EmailAlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let authenticator = test_authenticator();
        let user = stored_user(&authenticator, "pw123!");

        let mut repository = MockTestUserRepository::new();
        let returned_user = user.clone();
        repository
            .expect_find_by_email()
            .withf(|e| e.as_str() == "a@x.com")
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));

        let service = UserService::new(Arc::new(repository), Arc::clone(&authenticator));

        let session = service
            .authenticate(&email("a@x.com"), "pw123!")
            .await
            .unwrap();

        assert_eq!(session.user.id, user.id);
        assert_ne!(session.tokens.access_token, session.tokens.refresh_token);

        let access = authenticator
            .validate_access_token(&session.tokens.access_token)
            .unwrap();
        assert_eq!(access.sub, "a@x.com");
        assert_eq!(access.name, "Ann");

        let refresh = authenticator
            .validate_refresh_token(&session.tokens.refresh_token)
            .unwrap();
        assert_eq!(refresh.exp - refresh.iat, Duration::days(7).num_seconds());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let authenticator = test_authenticator();
        let user = stored_user(&authenticator, "pw123!");

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(Arc::new(repository), authenticator);

        let result = service.authenticate(&email("a@x.com"), "wrong").await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository), test_authenticator());

        let result = service.authenticate(&email("z@x.com"), "pw123!").await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[test]
    fn test_unknown_user_hash_uses_configured_work_factor() {
        let service = UserService::new(
            Arc::new(MockTestUserRepository::new()),
            test_authenticator(),
        );

        assert!(service
            .unknown_user_password_hash
            .starts_with("$argon2id$v=19$m=64,t=1,p=1$"));
    }

    #[tokio::test]
    async fn test_authenticate_database_error() {
        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Err(UserError::DatabaseError("connection refused".to_string())));

        let service = UserService::new(Arc::new(repository), test_authenticator());

        let result = service.authenticate(&email("a@x.com"), "pw123!").await;
        assert!(matches!(result, Err(UserError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_refresh_access_token_success() {
        let authenticator = test_authenticator();
        let user = stored_user(&authenticator, "pw123!");
        let refresh_token = authenticator
            .issue_token(&user.identity(), TokenKind::Refresh)
            .unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .withf(|e| e.as_str() == "a@x.com")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(Arc::new(repository), Arc::clone(&authenticator));

        let access_token = service.refresh_access_token(&refresh_token).await.unwrap();
        let claims = authenticator.validate_access_token(&access_token).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.token_type, TokenKind::Access);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let authenticator = test_authenticator();
        let user = stored_user(&authenticator, "pw123!");
        let access_token = authenticator
            .issue_token(&user.identity(), TokenKind::Access)
            .unwrap();

        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_email().times(0);

        let service = UserService::new(Arc::new(repository), authenticator);

        let result = service.refresh_access_token(&access_token).await;
        assert!(matches!(
            result,
            Err(UserError::Token(JwtError::WrongTokenType { .. }))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rejects_deleted_user() {
        let authenticator = test_authenticator();
        let user = stored_user(&authenticator, "pw123!");
        let refresh_token = authenticator
            .issue_token(&user.identity(), TokenKind::Refresh)
            .unwrap();

        let mut repository = MockTestUserRepository::new();
        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository), authenticator);

        let result = service.refresh_access_token(&refresh_token).await;
        assert!(matches!(
            result,
            Err(UserError::Token(JwtError::InvalidToken(_)))
        ));
    }
}
