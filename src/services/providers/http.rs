use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// How a provider expects its API key.
#[derive(Clone)]
pub enum Auth {
    /// `Authorization: Bearer <key>`
    Bearer(String),
    /// `Authorization: Token <key>`
    Token(String),
    /// A dedicated header such as `X-API-Key: <key>`
    Header(&'static str, String),
}

/// JSON-over-HTTP plumbing shared by the provider adapters.
pub struct ProviderHttp {
    client: Client,
    base_url: String,
    auth: Option<Auth>,
}

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ProviderHttp {
    pub fn new(base_url: &str, auth: Option<Auth>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.auth.is_some()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(Auth::Bearer(key)) => request.bearer_auth(key),
            Some(Auth::Token(key)) => request.header("Authorization", format!("Token {}", key)),
            Some(Auth::Header(name, key)) => request.header(*name, key),
            None => request,
        }
    }

    pub async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, CallError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "POST to generation provider");

        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await?;

        Self::read(response).await
    }

    pub async fn get_json<Resp>(&self, path: &str, query: &[(&str, &str)]) -> Result<Resp, CallError>
    where
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "GET from generation provider");

        let response = self
            .authorize(self.client.get(&url))
            .query(query)
            .send()
            .await?;

        Self::read(response).await
    }

    async fn read<Resp: DeserializeOwned>(response: Response) -> Result<Resp, CallError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "Generation provider error");
            return Err(CallError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, body = %body, "Failed to parse provider response");
            CallError::Parse(e.to_string())
        })
    }
}
