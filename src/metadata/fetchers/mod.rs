pub mod http;
pub mod manifest;
pub mod oembed;

use crate::errors::FetchError;
use crate::metadata::types::{AuxiliaryKind, AuxiliaryReport, AuxiliaryStatus};
use std::time::Instant;
use url::Url;

pub(crate) const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedResource {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used for auxiliary resources (manifest, oEmbed).
///
/// Implementations must return every failure as a [`FetchError`]; the
/// orchestrator calls them from worker threads, hence `Send + Sync`.
pub trait ResourceFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<FetchedResource, FetchError>;

    /// Get the name of this fetcher for logging/debugging
    fn name(&self) -> &'static str;
}

/// Body of a 2xx response, anything else is a failure
pub fn fetch_body(fetcher: &dyn ResourceFetcher, url: &Url) -> Result<Vec<u8>, FetchError> {
    let resource = fetcher.fetch(url)?;
    if !resource.is_success() {
        return Err(FetchError::Status(resource.status));
    }
    Ok(resource.body)
}

/// Payload bytes without a leading UTF-8 byte order mark
pub(crate) fn strip_bom(body: &[u8]) -> &[u8] {
    body.strip_prefix(UTF8_BOM).unwrap_or(body)
}

/// A resource referenced by the page that is fetched and parsed on its own
/// worker thread.
pub trait Auxiliary: Sync {
    type Output: Send;

    fn kind(&self) -> AuxiliaryKind;

    fn url(&self) -> &Url;

    fn parse(&self, body: &[u8]) -> Result<Self::Output, FetchError>;
}

impl AuxiliaryKind {
    pub fn name(self) -> &'static str {
        match self {
            AuxiliaryKind::Manifest => "manifest",
            AuxiliaryKind::Oembed => "oembed",
        }
    }
}

impl AuxiliaryReport {
    pub fn skipped(kind: AuxiliaryKind, url: Option<&Url>, reason: &str) -> Self {
        Self {
            kind,
            url: url.map(Url::to_string),
            outcome: AuxiliaryStatus::Skip(reason.to_string()),
            duration_ms: 0,
        }
    }

    pub fn failed(kind: AuxiliaryKind, url: &Url, err: &FetchError, duration_ms: u64) -> Self {
        Self {
            kind,
            url: Some(url.to_string()),
            outcome: AuxiliaryStatus::Error(err.to_string()),
            duration_ms,
        }
    }
}

/// Fetch and parse one auxiliary resource. Never fails: errors are logged,
/// reported and turned into `None`.
pub fn run_auxiliary<A: Auxiliary>(
    aux: &A,
    fetcher: &dyn ResourceFetcher,
) -> (Option<A::Output>, AuxiliaryReport) {
    let started = Instant::now();
    let kind = aux.kind().name();
    let url = aux.url();

    let result = fetch_body(fetcher, url).and_then(|body| aux.parse(&body));
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(output) => {
            log::info!(
                "aux={kind} fetcher={} outcome=success url={url} ms={duration_ms}",
                fetcher.name()
            );
            let report = AuxiliaryReport {
                kind: aux.kind(),
                url: Some(url.to_string()),
                outcome: AuxiliaryStatus::Success,
                duration_ms,
            };
            (Some(output), report)
        }
        Err(err) => {
            log::warn!(
                "aux={kind} fetcher={} outcome=error url={url} err={err}",
                fetcher.name()
            );
            (None, AuxiliaryReport::failed(aux.kind(), url, &err, duration_ms))
        }
    }
}
