/// Fatal errors: the only failures that reject a whole resolution call.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("document could not be parsed: {0}")]
    DocumentParse(String),
}

/// A reference found in the page (or in a manifest) that cannot be turned
/// into an absolute URL. The candidate carrying it is dropped.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("invalid reference {reference:?}: {source}")]
    InvalidReference {
        reference: String,
        #[source]
        source: url::ParseError,
    },

    #[error("empty reference")]
    Empty,
}

/// Auxiliary fetch failures (manifest, oEmbed). Always absorbed by the
/// orchestrator and reflected as an absent sub-result.
#[derive(thiserror::Error, Debug, Clone)]
pub enum FetchError {
    #[error("http client error: {0}")]
    Client(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("payload exceeds {0} bytes")]
    TooLarge(usize),

    #[error("malformed payload: {0}")]
    Payload(String),

    #[error("fetch worker aborted")]
    Aborted,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Status(status.as_u16());
        }
        Self::Transport(crate::metadata::fetchers::http::get_error(&err))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(format!("json: {err}"))
    }
}

impl From<roxmltree::Error> for FetchError {
    fn from(err: roxmltree::Error) -> Self {
        Self::Payload(format!("xml: {err}"))
    }
}
