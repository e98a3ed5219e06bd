//! Authentication utilities library
//!
//! Provides the credential and token core of the service:
//! - Password hashing (Argon2id, tunable work factor)
//! - JWT token generation and validation (HS256 only)
//! - Authentication coordination (access + refresh token pairs)
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("not_my_password", &hash));
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::{Authenticator, Identity, Secret, TokenKind};
//!
//! let auth = Authenticator::new(&Secret::from("secret_key_at_least_32_bytes_long!"));
//! let identity = Identity::new("a@x.com", "Ann");
//! let token = auth.issue_token(&identity, TokenKind::Access).unwrap();
//! let claims = auth.validate_access_token(&token).unwrap();
//! assert_eq!(claims.identity(), identity);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, Identity, Secret};
//!
//! let auth = Authenticator::new(&Secret::from("secret_key_at_least_32_bytes_long!"));
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and generate tokens
//! let identity = Identity::new("a@x.com", "Ann");
//! let tokens = auth.authenticate("password123", &hash, &identity).unwrap();
//!
//! // Validate token
//! let claims = auth.validate_access_token(&tokens.access_token).unwrap();
//! assert_eq!(claims.sub, "a@x.com");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod secret;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use authenticator::TokenLifetimes;
pub use authenticator::TokenPair;
pub use jwt::Claims;
pub use jwt::Identity;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::WorkFactor;
pub use secret::Secret;
