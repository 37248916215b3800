//! HTTP client for the posts API: every endpoint, typed, with the bearer
//! token carried between calls.

pub mod error;
pub mod http_client;
pub mod models;

pub use error::ClientError;
pub use http_client::PostsClient;
pub use models::{Envelope, Message, Post, PostRecord, TokenData, User};
