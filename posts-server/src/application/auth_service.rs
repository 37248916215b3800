use crate::data::token_denylist::TokenDenylist;
use crate::data::user_repository::UserRepository;
use crate::domain::user::{LoginUserRequest, RegisterUserRequest, UserResponse};
use crate::domain::DomainError;
use crate::infrastructure::jwt::{IssuedToken, JwtService};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identity attached to a request by the bearer-token middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

pub struct AuthService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    denylist: Arc<dyn TokenDenylist + Send + Sync>,
    jwt_service: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        denylist: Arc<dyn TokenDenylist + Send + Sync>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_repo,
            denylist,
            jwt_service,
        }
    }

    pub async fn register(&self, req: RegisterUserRequest) -> Result<UserResponse, DomainError> {
        tracing::debug!("=== REGISTRATION START ===");

        let shape = req.validate();
        let mut errors = shape.as_ref().err().cloned().unwrap_or_default();

        let email = req.email.as_deref().map(str::trim).unwrap_or_default();
        if !email.is_empty() && !errors.has("email") {
            tracing::debug!("Checking if email exists...");
            match self.user_repo.find_by_email(email).await {
                Ok(_) => {
                    tracing::warn!("Registration failed: email already exists");
                    errors.taken("email");
                }
                Err(DomainError::UserNotFound) => {}
                Err(e) => return Err(e),
            }
        }

        let new_user = match shape {
            Ok(user) if errors.is_empty() => user,
            _ => {
                tracing::debug!("Registration rejected by validation: {:?}", errors);
                return Err(DomainError::Validation(errors));
            }
        };

        tracing::debug!("Hashing password...");
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = match argon2.hash_password(new_user.password.as_bytes(), &salt) {
            Ok(hash) => hash.to_string(),
            Err(e) => {
                tracing::error!("Password hashing failed: {}", e);
                return Err(DomainError::InternalError(format!(
                    "Password hashing failed: {}",
                    e
                )));
            }
        };

        let user = self.user_repo.create(new_user, password_hash).await?;

        tracing::info!(
            "User registered successfully: id={}, email={}",
            user.id,
            user.email
        );

        Ok(UserResponse::from(user))
    }

    pub async fn login(&self, req: LoginUserRequest) -> Result<TokenResponse, DomainError> {
        tracing::debug!("=== LOGIN START ===");

        let credentials = req.validate()?;

        let user = match self.user_repo.find_by_email(&credentials.email).await {
            Ok(u) => u,
            Err(DomainError::UserNotFound) => {
                tracing::warn!("Login for unknown email: {}", credentials.email);
                return Err(DomainError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let parsed_hash = match PasswordHash::new(&user.password_hash) {
            Ok(h) => h,
            Err(e) => {
                tracing::error!("Invalid password hash format: {}", e);
                return Err(DomainError::InternalError(format!(
                    "Invalid password hash: {}",
                    e
                )));
            }
        };

        if Argon2::default()
            .verify_password(credentials.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Invalid password for user id={}", user.id);
            return Err(DomainError::InvalidCredentials);
        }

        let issued = self.jwt_service.generate_token(user.id, &user.email)?;

        tracing::info!("User logged in successfully: id={}", user.id);

        Ok(self.token_response(issued, UserResponse::from(user)))
    }

    /// Accepts a bearer token only if its signature and expiry check out and
    /// it has not been revoked.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, DomainError> {
        let claims = self.jwt_service.verify_token(token)?;

        if self.denylist.is_revoked(&claims.jti).await? {
            tracing::warn!("Rejected revoked token jti={}", claims.jti);
            return Err(DomainError::Unauthorized(
                "Token has been revoked".to_string(),
            ));
        }

        Ok(AuthenticatedUser {
            user_id: claims.user_id()?,
            expires_at: claims.expires_at(),
            jti: claims.jti,
        })
    }

    pub async fn profile(&self, auth: &AuthenticatedUser) -> Result<UserResponse, DomainError> {
        let user = self.user_repo.find_by_id(auth.user_id).await?;
        Ok(UserResponse::from(user))
    }

    /// Issues a fresh token for the caller and revokes the one presented.
    pub async fn refresh(&self, auth: &AuthenticatedUser) -> Result<TokenResponse, DomainError> {
        let user = self.user_repo.find_by_id(auth.user_id).await?;
        let issued = self.jwt_service.generate_token(user.id, &user.email)?;

        self.denylist.revoke(&auth.jti, auth.expires_at).await?;

        tracing::info!(
            "Token refreshed for user id={}: {} -> {}",
            user.id,
            auth.jti,
            issued.claims.jti
        );

        Ok(self.token_response(issued, UserResponse::from(user)))
    }

    pub async fn logout(&self, auth: &AuthenticatedUser) -> Result<(), DomainError> {
        self.denylist.revoke(&auth.jti, auth.expires_at).await?;
        tracing::info!("User id={} signed out, jti={}", auth.user_id, auth.jti);
        Ok(())
    }

    fn token_response(&self, issued: IssuedToken, user: UserResponse) -> TokenResponse {
        TokenResponse {
            token: issued.token,
            token_type: "bearer".to_string(),
            expires_in: self.jwt_service.ttl_seconds(),
            user,
        }
    }
}
