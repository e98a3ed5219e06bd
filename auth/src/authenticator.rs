use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::Claims;
use crate::jwt::Identity;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenKind;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::secret::Secret;

/// How long each kind of token stays valid after issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl TokenLifetimes {
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access,
            TokenKind::Refresh => self.refresh,
        }
    }
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::days(7),
        }
    }
}

/// Authentication coordinator combining password verification and JWT generation.
///
/// Built once at startup from the signing secret and shared read-only between
/// requests.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    lifetimes: TokenLifetimes,
}

/// Result of successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived token presented on protected routes
    pub access_token: String,
    /// Long-lived token exchanged for new access tokens
    pub refresh_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create an authenticator with default token lifetimes and work factor.
    pub fn new(secret: &Secret) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(secret.expose()),
            lifetimes: TokenLifetimes::default(),
        }
    }

    pub fn with_token_lifetimes(mut self, lifetimes: TokenLifetimes) -> Self {
        self.lifetimes = lifetimes;
        self
    }

    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    /// Hash to verify against when the account does not exist.
    pub fn decoy_password_hash(&self) -> String {
        self.password_hasher.decoy_hash()
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash. Never errors: an
    /// unreadable hash simply does not match.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue an access/refresh token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        identity: &Identity,
    ) -> Result<TokenPair, AuthenticationError> {
        if !self.verify_password(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.issue_token_pair(identity)?)
    }

    /// Issue both tokens for `identity` without checking a password.
    pub fn issue_token_pair(&self, identity: &Identity) -> Result<TokenPair, JwtError> {
        let now = Utc::now();

        Ok(TokenPair {
            access_token: self.issue_token_at(identity, TokenKind::Access, now)?,
            refresh_token: self.issue_token_at(identity, TokenKind::Refresh, now)?,
        })
    }

    pub fn issue_token(&self, identity: &Identity, kind: TokenKind) -> Result<String, JwtError> {
        self.issue_token_at(identity, kind, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_token_at(
        &self,
        identity: &Identity,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = Claims::new(identity, kind, now, self.lifetimes.ttl(kind));
        self.jwt_handler.encode(&claims)
    }

    /// Validate a token of either kind against the wall clock.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed, tampered, foreign-algorithm, or missing claims
    /// * `TokenExpired` - `now` is at or past the token's expiration
    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let claims: Claims = self.jwt_handler.decode(token)?;

        if claims.is_expired(now.timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }

    /// Validate a token and require it to be an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        expect_kind(self.validate_token(token)?, TokenKind::Access)
    }

    /// Validate a token and require it to be a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        expect_kind(self.validate_token(token)?, TokenKind::Refresh)
    }
}

fn expect_kind(claims: Claims, expected: TokenKind) -> Result<Claims, JwtError> {
    if claims.token_type == expected {
        Ok(claims)
    } else {
        Err(JwtError::WrongTokenType { expected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::WorkFactor;

    fn authenticator(secret: &str) -> Authenticator {
        let hasher = PasswordHasher::with_work_factor(WorkFactor {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid work factor");

        Authenticator::new(&Secret::from(secret)).with_password_hasher(hasher)
    }

    fn ann() -> Identity {
        Identity::new("a@x.com", "Ann")
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!");

        let password = "pw123!";
        let hash = authenticator
            .hash_password(password)
            .expect("Failed to hash password");
        assert_ne!(hash, password);

        let tokens = authenticator
            .authenticate(password, &hash, &ann())
            .expect("Authentication failed");

        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());
        assert_ne!(tokens.access_token, tokens.refresh_token);

        let access = authenticator
            .validate_access_token(&tokens.access_token)
            .expect("Token validation failed");
        let refresh = authenticator
            .validate_refresh_token(&tokens.refresh_token)
            .expect("Token validation failed");

        assert_eq!(access.identity(), ann());
        assert_eq!(refresh.identity(), ann());
        assert_eq!(access.exp - access.iat, 15 * 60);
        assert_eq!(refresh.exp - refresh.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!");

        let hash = authenticator
            .hash_password("pw123!")
            .expect("Failed to hash password");

        let result = authenticator.authenticate("wrong_password", &hash, &ann());
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_malformed_hash_is_invalid_credentials() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!");

        let result = authenticator.authenticate("pw123!", "pw123!", &ann());
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_decoy_hash_matches_hasher_cost() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!");
        let real = authenticator.hash_password("pw123!").expect("Failed to hash password");
        let decoy = authenticator.decoy_password_hash();

        let params = |hash: &str| hash.split('$').nth(3).map(str::to_string);
        assert_eq!(params(&decoy), params(&real));
        assert!(!authenticator.verify_password("pw123!", &decoy));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!");
        let token = authenticator
            .issue_token(&ann(), TokenKind::Access)
            .expect("Failed to issue token");

        let first = authenticator.validate_token(&token).expect("first validation");
        let second = authenticator.validate_token(&token).expect("second validation");

        assert_eq!(first, second);
    }

    #[test]
    fn test_token_expires_at_ttl() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!");
        let issued = Utc::now();
        let token = authenticator
            .issue_token_at(&ann(), TokenKind::Access, issued)
            .expect("Failed to issue token");

        let just_before = issued + Duration::minutes(15) - Duration::seconds(1);
        assert!(authenticator.validate_token_at(&token, just_before).is_ok());

        let at_expiry = issued + Duration::minutes(15);
        assert_eq!(
            authenticator.validate_token_at(&token, at_expiry),
            Err(JwtError::TokenExpired)
        );

        let long_after = issued + Duration::days(1);
        assert_eq!(
            authenticator.validate_token_at(&token, long_after),
            Err(JwtError::TokenExpired)
        );
    }

    #[test]
    fn test_expired_token_against_wall_clock() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!");
        let token = authenticator
            .issue_token_at(&ann(), TokenKind::Access, Utc::now() - Duration::hours(1))
            .expect("Failed to issue token");

        assert_eq!(
            authenticator.validate_access_token(&token),
            Err(JwtError::TokenExpired)
        );
    }

    #[test]
    fn test_token_from_other_secret_is_invalid() {
        let issuer = authenticator("secret1_at_least_32_bytes_long_key!");
        let verifier = authenticator("secret2_at_least_32_bytes_long_key!");

        let token = issuer
            .issue_token(&ann(), TokenKind::Access)
            .expect("Failed to issue token");

        assert!(matches!(
            verifier.validate_token(&token),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_token_kind_is_enforced() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!");
        let tokens = authenticator
            .issue_token_pair(&ann())
            .expect("Failed to issue tokens");

        assert_eq!(
            authenticator.validate_access_token(&tokens.refresh_token),
            Err(JwtError::WrongTokenType {
                expected: TokenKind::Access
            })
        );
        assert_eq!(
            authenticator.validate_refresh_token(&tokens.access_token),
            Err(JwtError::WrongTokenType {
                expected: TokenKind::Refresh
            })
        );
    }

    #[test]
    fn test_custom_lifetimes() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!")
            .with_token_lifetimes(TokenLifetimes {
                access: Duration::minutes(1),
                refresh: Duration::hours(2),
            });

        let tokens = authenticator
            .issue_token_pair(&ann())
            .expect("Failed to issue tokens");
        let access = authenticator
            .validate_token(&tokens.access_token)
            .expect("valid access token");
        let refresh = authenticator
            .validate_token(&tokens.refresh_token)
            .expect("valid refresh token");

        assert_eq!(access.exp - access.iat, 60);
        assert_eq!(refresh.exp - refresh.iat, 2 * 60 * 60);
    }

    #[test]
    fn test_validate_invalid_token() {
        let authenticator = authenticator("test_secret_key_at_least_32_bytes!");

        let result = authenticator.validate_token("invalid.token.here");
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }
}
