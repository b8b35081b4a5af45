use shared::error::ProtocolError;
use thiserror::Error;

/// Anything that kept a usable prediction payload from arriving.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to reach prediction endpoint {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("prediction endpoint {url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("prediction endpoint {url} returned an unreadable body: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed prediction response: {0}")]
    Malformed(#[from] ProtocolError),
    #[error("invalid prediction endpoint url `{0}`")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart target `{0}` is unavailable")]
    MissingTarget(String),
    #[error("chart rendering failed: {0}")]
    Render(String),
}

/// Terminal result of one submission attempt. By the time a caller sees one
/// of these the view has already been told (alert) and restored.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    Busy,
    #[error("prediction rejected: {0}")]
    Validation(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Chart(#[from] ChartError),
}

impl SubmitError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
