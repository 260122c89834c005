use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::session::SessionStore;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}

/// Collection endpoints answer with a bare array, a paginated
/// `{"results": [...]}` envelope, or a `{"data": [...]}` wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Collection<T> {
    Bare(Vec<T>),
    Paginated { results: Vec<T> },
    Wrapped { data: Vec<T> },
}

impl<T> Collection<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Collection::Bare(items) => items,
            Collection::Paginated { results } => results,
            Collection::Wrapped { data } => data,
        }
    }
}

/// Thin JSON client for the portal REST backend.
pub struct RestClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl RestClient {
    pub fn new(config: &AppConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        if config.api_base_url.is_empty() {
            return Err(ApiError::Config("api_base_url is empty".to_string()));
        }

        let client = Client::builder().timeout(config.http_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    async fn get_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.session.token().await {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Config(format!("invalid auth token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers().await?);

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error ({}) from {}: {}", status, path, text);

            return Err(match status.as_u16() {
                401 | 403 => {
                    self.session
                        .expire(&format!("backend answered {} for {}", status.as_u16(), path))
                        .await;
                    ApiError::Auth(text)
                }
                404 => ApiError::NotFound(path.to_string()),
                code => ApiError::Status { status: code, message: text },
            });
        }

        Ok(text)
    }

    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let text = self.send(method, path, body).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }

    /// Sends a request whose response body is irrelevant (DELETE, action POSTs, PATCH).
    pub async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(method, path, body).await.map(|_| ())
    }

    pub async fn get<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn get_collection<T>(&self, path: &str) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let collection: Collection<T> = self.get(path).await?;
        Ok(collection.into_vec())
    }

    pub async fn patch<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.execute(Method::PATCH, path, Some(body)).await
    }

    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute::<()>(Method::POST, path, None).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute::<()>(Method::DELETE, path, None).await
    }
}
