pub mod error;
pub mod post;
pub mod user;
pub mod validation;

pub use error::DomainError;
pub use post::Post;
pub use user::User;
pub use validation::ValidationErrors;
