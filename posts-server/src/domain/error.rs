use crate::domain::validation::ValidationErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("The given data was invalid")]
    Validation(ValidationErrors),

    #[error("User not found")]
    UserNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Validation failures share the not-found status so that every endpoint
    /// reports rejected input the same way the post endpoints always have.
    pub fn to_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::UserNotFound | Self::PostNotFound => 404,
            Self::InvalidCredentials | Self::Unauthorized(_) => 401,
            Self::DatabaseError(_) | Self::InternalError(_) => 500,
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}
