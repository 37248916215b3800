use crate::error::ClientError;
use crate::models::{
    Envelope, LoginRequest, Message, Post, PostRecord, PostRequest, RegisterRequest, TokenData,
    User,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Typed client for the posts API. Holds the current bearer token: login and
/// refresh replace it, logout drops it.
#[derive(Debug, Clone)]
pub struct PostsClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl PostsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        match &self.token {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Err(ClientError::MissingToken),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/api/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("HTTP {} <- {}", status, body);
        decode_envelope(status, &body)
    }

    // ============== Auth ==============

    pub async fn register(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<User, ClientError> {
        let req = RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        let request = self.client.post(self.url("register")).json(&req);
        require_data(self.send(request).await?)
    }

    pub async fn login(
        &mut self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<TokenData, ClientError> {
        let req = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        let request = self.client.post(self.url("login")).json(&req);
        let tokens: TokenData = require_data(self.send(request).await?)?;
        self.set_token(tokens.token.clone());
        Ok(tokens)
    }

    pub async fn profile(&self) -> Result<User, ClientError> {
        let request = self.authorized(self.client.get(self.url("user-profile")))?;
        require_data(self.send(request).await?)
    }

    pub async fn refresh(&mut self) -> Result<TokenData, ClientError> {
        let request = self.authorized(self.client.post(self.url("refresh")))?;
        let tokens: TokenData = require_data(self.send(request).await?)?;
        self.set_token(tokens.token.clone());
        Ok(tokens)
    }

    pub async fn logout(&mut self) -> Result<String, ClientError> {
        let request = self.authorized(self.client.post(self.url("logout")))?;
        let envelope: Envelope<serde_json::Value> = self.send(request).await?;
        self.clear_token();
        Ok(envelope.message.to_string())
    }

    // ============== Posts ==============

    pub async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        let request = self.client.get(self.url("post"));
        require_data(self.send(request).await?)
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, ClientError> {
        let request = self.client.get(self.url(&format!("post/{}", id)));
        require_data(self.send(request).await?)
    }

    pub async fn create_post(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Post, ClientError> {
        let req = PostRequest {
            title: title.into(),
            description: description.into(),
        };
        let request = self.authorized(self.client.post(self.url("post")))?.json(&req);
        require_data(self.send(request).await?)
    }

    pub async fn update_post(
        &self,
        id: i64,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<PostRecord, ClientError> {
        let req = PostRequest {
            title: title.into(),
            description: description.into(),
        };
        let request = self
            .authorized(self.client.patch(self.url(&format!("updatePost/{}", id))))?
            .json(&req);
        require_data(self.send(request).await?)
    }

    pub async fn delete_post(&self, id: i64) -> Result<PostRecord, ClientError> {
        let request =
            self.authorized(self.client.post(self.url(&format!("deletePost/{}", id))))?;
        require_data(self.send(request).await?)
    }
}

/// Maps a response onto the envelope, turning non-success statuses into the
/// matching `ClientError`. A 404 carrying a field map is a validation failure.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Envelope<T>, ClientError> {
    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(ClientError::SerializationError(e.to_string()));
        }
        Err(_) => {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body.to_string(),
            });
        }
    };

    match status {
        s if s.is_success() => Ok(envelope),
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized(envelope.message.to_string())),
        StatusCode::NOT_FOUND => match envelope.message {
            Message::Fields(fields) => Err(ClientError::Validation(fields)),
            Message::Text(text) => Err(ClientError::NotFound(text)),
        },
        _ => Err(ClientError::Api {
            status: status.as_u16(),
            message: envelope.message.to_string(),
        }),
    }
}

fn require_data<T>(envelope: Envelope<T>) -> Result<T, ClientError> {
    envelope.data.ok_or_else(|| {
        ClientError::SerializationError(format!(
            "response carried no data (message: {})",
            envelope.message
        ))
    })
}
