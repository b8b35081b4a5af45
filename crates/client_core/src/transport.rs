use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use shared::protocol::{FormInput, PredictionResponse};
use tracing::debug;
use url::Url;

use crate::error::TransportError;

pub const DEFAULT_ENDPOINT_PATH: &str = "/predict";

#[async_trait]
pub trait PredictionTransport: Send + Sync {
    async fn predict(&self, form: &FormInput) -> Result<PredictionResponse, TransportError>;
}

/// POSTs the form as JSON to the prediction endpoint.
///
/// No timeout is applied unless one is configured, so a hung server keeps the
/// caller waiting.
pub struct HttpTransport {
    http: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Result<Self, TransportError> {
        Self::with_options(server_url, DEFAULT_ENDPOINT_PATH, None)
    }

    /// `endpoint_path` is resolved against `server_url` with URL join rules,
    /// so an absolute path replaces any path on the server URL.
    pub fn with_options(
        server_url: &str,
        endpoint_path: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let base = Url::parse(server_url.trim())
            .map_err(|_| TransportError::InvalidUrl(server_url.to_string()))?;
        let endpoint = base
            .join(endpoint_path)
            .map_err(|_| TransportError::InvalidUrl(format!("{server_url}{endpoint_path}")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|source| TransportError::Request {
            url: endpoint.to_string(),
            source,
        })?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionTransport for HttpTransport {
    async fn predict(&self, form: &FormInput) -> Result<PredictionResponse, TransportError> {
        let url = self.endpoint.to_string();
        debug!(%url, fields = form.len(), "posting prediction form");

        let res = self
            .http
            .post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(form)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        let status = res.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        res.json::<PredictionResponse>()
            .await
            .map_err(|source| TransportError::Decode { url, source })
    }
}
