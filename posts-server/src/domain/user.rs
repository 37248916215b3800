use crate::domain::validation::{ValidationErrors, MAX_STRING_LENGTH};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RegisterUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Registration data that passed the shape rules; email uniqueness is left
/// to the service and the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = errors.require("name", self.name.as_deref());
        if let Some(name) = name {
            errors.max_chars("name", name, MAX_STRING_LENGTH);
        }

        let email = errors.require("email", self.email.as_deref());
        if let Some(email) = email {
            errors.email("email", email);
            errors.max_chars("email", email, MAX_STRING_LENGTH);
        }

        // Passwords are taken verbatim, surrounding whitespace included.
        let password = match self.password.as_deref() {
            Some(p) if !p.is_empty() => {
                errors.min_chars("password", p, MIN_PASSWORD_LENGTH);
                Some(p)
            }
            _ => {
                errors.add("password", "The password field is required.");
                None
            }
        };

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

impl LoginUserRequest {
    pub fn validate(&self) -> Result<Credentials, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = errors.require("email", self.email.as_deref());
        let password = match self.password.as_deref() {
            Some(p) if !p.is_empty() => Some(p),
            _ => {
                errors.add("password", "The password field is required.");
                None
            }
        };

        match (email, password) {
            (Some(email), Some(password)) => Ok(Credentials {
                email: email.to_string(),
                password: password.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}
