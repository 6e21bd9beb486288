use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const USER_AGENT_DEFAULT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_RESOURCE_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// User agent sent with auxiliary (manifest, oEmbed) requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout for auxiliary fetches, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Opt-in cap on document size; larger documents are rejected outright.
    /// Unset means any size is accepted.
    #[serde(default)]
    pub max_document_bytes: Option<usize>,

    /// Auxiliary payloads larger than this are treated as failed fetches
    #[serde(default = "default_max_resource_bytes")]
    pub max_resource_bytes: usize,

    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default = "enabled")]
    pub fetch_manifest: bool,

    #[serde(default = "enabled")]
    pub fetch_oembed: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_document_bytes: None,
            max_resource_bytes: DEFAULT_MAX_RESOURCE_BYTES,
            accept_invalid_certs: false,
            fetch_manifest: true,
            fetch_oembed: true,
        }
    }
}

fn default_user_agent() -> String {
    USER_AGENT_DEFAULT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_resource_bytes() -> usize {
    DEFAULT_MAX_RESOURCE_BYTES
}

fn enabled() -> bool {
    true
}

impl ParserConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            bail!("user_agent must not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }
        if self.max_document_bytes == Some(0) {
            bail!("max_document_bytes must be greater than 0");
        }
        if self.max_resource_bytes == 0 {
            bail!("max_resource_bytes must be greater than 0");
        }
        Ok(())
    }

    pub fn from_yaml(config_str: &str) -> Result<Self> {
        let config: Self = serde_yml::from_str(config_str).context("config is malformed")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&config_str).with_context(|| format!("invalid config {}", path.display()))
    }
}
