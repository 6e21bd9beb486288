use crate::config::ParserConfig;
use crate::errors::FetchError;
use crate::metadata::fetchers::{FetchedResource, ResourceFetcher};
use reqwest::header::CONTENT_TYPE;
use std::{error::Error, io::Read, time::Duration};
use url::Url;

/// Blocking reqwest client. One attempt per resource: auxiliary fetches are
/// best-effort, so there is no retry loop.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &ParserConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .danger_accept_invalid_hostnames(config.accept_invalid_certs)
            .timeout(config.timeout())
            .pool_idle_timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| FetchError::Client(get_error(&err)))?;

        Ok(Self {
            client,
            max_bytes: config.max_resource_bytes,
        })
    }
}

/// Innermost useful message of a reqwest error chain
pub(crate) fn get_error(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => e.to_string(),
            None => e.to_string(),
        },
        None => error.to_string(),
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedResource, FetchError> {
        let host = url.host_str().unwrap_or_default();
        let path = url.path();
        let iden = format!("{host}{path}");

        log::debug!("{iden}: requesting");

        let resp = self.client.get(url.as_str()).send().map_err(|err| {
            log::debug!("{iden}: {err}: {:?}", get_error(&err));
            FetchError::from(err)
        })?;

        let status = resp.status();
        if !status.is_success() {
            log::debug!("{iden}: {:?}", status.to_string());
        }

        if resp
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(FetchError::TooLarge(self.max_bytes));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // read one byte past the limit to tell "exactly at" from "over"
        let mut body = Vec::new();
        resp.take((self.max_bytes as u64).saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|err| FetchError::Transport(format!("{iden}: {err}")))?;
        if body.len() > self.max_bytes {
            return Err(FetchError::TooLarge(self.max_bytes));
        }

        Ok(FetchedResource {
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
