use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open Graph properties keyed by their suffix (`og:title` -> `title`)
pub type OpenGraphData = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconOrigin {
    Link,
    Manifest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconCandidate {
    /// Always absolute
    pub url: String,
    /// Largest declared edge in pixels, 0 when unknown
    pub size: u32,
    pub origin: IconOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedRecord {
    /// The payload's `html` field. `None` when the provider omitted it.
    pub html: Option<String>,
    pub raw: serde_json::Value,
}

/// The final, reconciled view of a page. Every field is always serialized;
/// absent data shows up as `null`, `[]` or `{}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub icon: Option<String>,
    pub icons: Vec<IconCandidate>,
    pub og_data: OpenGraphData,
    pub manifest: Option<serde_json::Value>,
    pub short_name: Option<String>,
    pub theme_color: Option<String>,
    pub embed: Option<EmbedRecord>,
    /// Canonical page URL
    pub url: Option<String>,
    /// Preview image
    pub image: Option<String>,
    pub start_url: Option<String>,
}

impl ResolvedMetadata {
    /// Returns true if any useful field is present
    pub fn has_any_data(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || !self.keywords.is_empty()
            || self.icon.is_some()
            || !self.og_data.is_empty()
            || self.manifest.is_some()
            || self.embed.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuxiliaryKind {
    Manifest,
    Oembed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum AuxiliaryStatus {
    Success,
    Skip(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryReport {
    pub kind: AuxiliaryKind,
    pub url: Option<String>,
    pub outcome: AuxiliaryStatus,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecision {
    pub field: String,
    pub winner: String,
    pub value_preview: Option<String>,
}

/// How a resolution went: which auxiliary resources were fetched, which
/// source won each contested field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub auxiliary: Vec<AuxiliaryReport>,
    pub field_decisions: Vec<FieldDecision>,
    pub duration_ms: u64,
}

impl ResolutionReport {
    pub fn auxiliary(&self, kind: AuxiliaryKind) -> Option<&AuxiliaryReport> {
        self.auxiliary.iter().find(|report| report.kind == kind)
    }

    pub fn winner(&self, field: &str) -> Option<&str> {
        self.field_decisions
            .iter()
            .find(|decision| decision.field == field)
            .map(|decision| decision.winner.as_str())
    }
}
