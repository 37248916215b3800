use crate::domain::DomainError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, DomainError> {
        self.sub
            .parse()
            .map_err(|_| DomainError::Unauthorized("Malformed token subject".to_string()))
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, DomainError> {
        tracing::debug!(
            "Initializing JwtService with secret length: {}, ttl: {} minutes",
            secret.len(),
            ttl.num_minutes()
        );

        if secret.is_empty() {
            return Err(DomainError::InternalError(
                "JWT secret must not be empty".to_string(),
            ));
        }

        if secret.len() < 32 {
            tracing::warn!(
                "JWT secret is too short ({} chars). Minimum recommended is 32 chars.",
                secret.len()
            );
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Token lifetime in seconds, as reported to clients in `expires_in`.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn generate_token(&self, user_id: i64, email: &str) -> Result<IssuedToken, DomainError> {
        tracing::debug!("Generating token for user_id: {}", user_id);

        let now = Utc::now();
        let expiration = now.checked_add_signed(self.ttl).ok_or_else(|| {
            DomainError::InternalError("Token expiry is out of range".to_string())
        })?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        match encode(&Header::default(), &claims, &self.encoding_key) {
            Ok(token) => {
                tracing::debug!("Token encoded successfully, jti: {}", claims.jti);
                Ok(IssuedToken { token, claims })
            }
            Err(e) => {
                tracing::error!("Failed to encode token: {}", e);
                Err(DomainError::InternalError(format!(
                    "Failed to generate token: {}",
                    e
                )))
            }
        }
    }

    /// Checks signature and expiry. Revocation is the caller's concern.
    pub fn verify_token(&self, token: &str) -> Result<Claims, DomainError> {
        // No leeway: a token stops verifying exactly when the denylist may
        // forget its jti.
        let mut validation = Validation::default();
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => {
                tracing::debug!("Token verified for sub: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                tracing::warn!("Token verification failed: {}", e);
                Err(DomainError::Unauthorized(format!("Invalid token: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_verifies() {
        let jwt = JwtService::new(SECRET, Duration::minutes(60)).unwrap();
        let issued = jwt.generate_token(42, "ammar@gmail.com").unwrap();

        let claims = jwt.verify_token(&issued.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.email, "ammar@gmail.com");
        assert_eq!(claims.jti, issued.claims.jti);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(jwt.ttl_seconds(), 3600);
    }

    #[test]
    fn every_token_gets_its_own_id() {
        let jwt = JwtService::new(SECRET, Duration::minutes(60)).unwrap();
        let a = jwt.generate_token(1, "a@b.cd").unwrap();
        let b = jwt.generate_token(1, "a@b.cd").unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtService::new(SECRET, Duration::minutes(-10)).unwrap();
        let issued = jwt.generate_token(1, "a@b.cd").unwrap();
        assert!(matches!(
            jwt.verify_token(&issued.token),
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_just_past_expiry_is_rejected() {
        let jwt = JwtService::new(SECRET, Duration::seconds(-30)).unwrap();
        let issued = jwt.generate_token(1, "a@b.cd").unwrap();
        assert!(matches!(
            jwt.verify_token(&issued.token),
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let ours = JwtService::new(SECRET, Duration::minutes(60)).unwrap();
        let theirs = JwtService::new("another-secret-another-secret-xx", Duration::minutes(60))
            .unwrap();
        let issued = theirs.generate_token(1, "a@b.cd").unwrap();
        assert!(ours.verify_token(&issued.token).is_err());
        assert!(ours.verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(JwtService::new("", Duration::minutes(60)).is_err());
    }
}
