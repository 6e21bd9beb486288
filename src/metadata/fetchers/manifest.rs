use crate::errors::FetchError;
use crate::metadata::fetchers::{strip_bom, Auxiliary};
use crate::metadata::icons::parse_sizes;
use crate::metadata::normalize::{resolve_url, strip_tracking_params};
use crate::metadata::precedence::{Candidates, Field, Source};
use crate::metadata::types::{AuxiliaryKind, IconCandidate, IconOrigin};
use serde_json::Value;
use url::Url;

/// A `<link rel=manifest>` to fetch.
pub struct ManifestRequest {
    pub url: Url,
    /// The document URL; `start_url` must share its origin
    pub page_url: Url,
}

/// The parts of a web app manifest that feed the final record. Fields of the
/// wrong JSON type are treated as absent rather than failing the manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct WebManifest {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub theme_color: Option<String>,
    /// Resolved against the manifest's own URL
    pub icons: Vec<IconCandidate>,
    pub start_url: Option<Url>,
    pub raw: Value,
}

impl Auxiliary for ManifestRequest {
    type Output = WebManifest;

    fn kind(&self) -> AuxiliaryKind {
        AuxiliaryKind::Manifest
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn parse(&self, body: &[u8]) -> Result<WebManifest, FetchError> {
        parse_manifest(body, &self.url, &self.page_url)
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn parse_manifest(
    body: &[u8],
    manifest_url: &Url,
    page_url: &Url,
) -> Result<WebManifest, FetchError> {
    let raw: Value = serde_json::from_slice(strip_bom(body))?;
    if !raw.is_object() {
        return Err(FetchError::Payload("manifest is not a JSON object".into()));
    }

    Ok(WebManifest {
        name: string_field(&raw, "name"),
        short_name: string_field(&raw, "short_name"),
        theme_color: string_field(&raw, "theme_color"),
        icons: manifest_icons(&raw, manifest_url),
        start_url: start_url(&raw, manifest_url, page_url),
        raw,
    })
}

fn manifest_icons(raw: &Value, manifest_url: &Url) -> Vec<IconCandidate> {
    let Some(entries) = raw.get("icons").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let src = entry.get("src").and_then(Value::as_str)?;
            match resolve_url(src, manifest_url) {
                Ok(url) => Some(IconCandidate {
                    url: url.to_string(),
                    size: parse_sizes(entry.get("sizes").and_then(Value::as_str)),
                    origin: IconOrigin::Manifest,
                }),
                Err(err) => {
                    log::debug!("manifest icon dropped: {err}");
                    None
                }
            }
        })
        .collect()
}

/// Same-origin start URL without tracking parameters; anything else is ignored.
fn start_url(raw: &Value, manifest_url: &Url, page_url: &Url) -> Option<Url> {
    let reference = raw.get("start_url").and_then(Value::as_str)?;
    let url = resolve_url(reference, manifest_url)
        .map_err(|err| log::debug!("start_url dropped: {err}"))
        .ok()?;

    if url.origin() != page_url.origin() {
        log::debug!("start_url {url} ignored: not same origin as {page_url}");
        return None;
    }

    Some(strip_tracking_params(&url))
}

impl WebManifest {
    pub fn candidates(&self) -> Candidates {
        let mut candidates = Candidates::default();
        for (field, value) in [
            (Field::Title, &self.name),
            (Field::ShortName, &self.short_name),
            (Field::ThemeColor, &self.theme_color),
        ] {
            if let Some(value) = value {
                candidates.push(field, Source::Manifest, value);
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IO_2015: &str = r##"{
        "name": "Google I/O 2015",
        "short_name": "I/O 2015",
        "start_url": "index.html?utm_source=homescreen",
        "display": "standalone",
        "theme_color": "#2196F3",
        "icons": [
            {"src": "images/touch/homescreen144.png", "sizes": "144x144", "type": "image/png"},
            {"src": "images/touch/homescreen192.png", "sizes": "192x192", "type": "image/png"},
            {"sizes": "48x48"},
            {"src": "http://[::1", "sizes": "512x512"}
        ]
    }"##;

    fn manifest_url() -> Url {
        Url::parse("http://localhost:4000/manifest/manifest.json").unwrap()
    }

    fn page_url() -> Url {
        Url::parse("http://localhost:4000/manifest/index.html?url=http://google.com").unwrap()
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(IO_2015.as_bytes(), &manifest_url(), &page_url()).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("Google I/O 2015"));
        assert_eq!(manifest.short_name.as_deref(), Some("I/O 2015"));
        assert_eq!(manifest.theme_color.as_deref(), Some("#2196F3"));
        assert_eq!(manifest.raw["display"], "standalone");
    }

    #[test]
    fn test_icons_resolve_against_manifest_url() {
        let manifest = parse_manifest(IO_2015.as_bytes(), &manifest_url(), &page_url()).unwrap();
        let icons: Vec<(&str, u32)> = manifest
            .icons
            .iter()
            .map(|icon| (icon.url.as_str(), icon.size))
            .collect();
        assert_eq!(
            icons,
            vec![
                ("http://localhost:4000/manifest/images/touch/homescreen144.png", 144),
                ("http://localhost:4000/manifest/images/touch/homescreen192.png", 192),
            ]
        );
        assert!(manifest.icons.iter().all(|icon| icon.origin == IconOrigin::Manifest));
    }

    #[test]
    fn test_start_url_stripped() {
        let manifest = parse_manifest(IO_2015.as_bytes(), &manifest_url(), &page_url()).unwrap();
        assert_eq!(
            manifest.start_url.map(String::from).as_deref(),
            Some("http://localhost:4000/manifest/index.html")
        );
    }

    #[test]
    fn test_cross_origin_start_url_ignored() {
        let body = br#"{"start_url": "https://elsewhere.example/app"}"#;
        let manifest = parse_manifest(body, &manifest_url(), &page_url()).unwrap();
        assert!(manifest.start_url.is_none());
    }

    #[test]
    fn test_wrong_types_are_absent() {
        let body = br#"{"name": 42, "short_name": "  ", "icons": "nope", "theme_color": null}"#;
        let manifest = parse_manifest(body, &manifest_url(), &page_url()).unwrap();
        assert!(manifest.name.is_none());
        assert!(manifest.short_name.is_none());
        assert!(manifest.theme_color.is_none());
        assert!(manifest.icons.is_empty());
        assert!(manifest.candidates().winner(Field::Title).is_none());
    }

    #[test]
    fn test_byte_order_mark_tolerated() {
        let mut body = crate::metadata::fetchers::UTF8_BOM.to_vec();
        body.extend_from_slice(br#"{"name": "bom"}"#);
        let manifest = parse_manifest(&body, &manifest_url(), &page_url()).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("bom"));
    }

    #[test]
    fn test_invalid_json_is_payload_error() {
        let err = parse_manifest(b"{not json", &manifest_url(), &page_url()).unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
        let err = parse_manifest(b"[1, 2]", &manifest_url(), &page_url()).unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
    }

    #[test]
    fn test_candidates() {
        let manifest = parse_manifest(IO_2015.as_bytes(), &manifest_url(), &page_url()).unwrap();
        let candidates = manifest.candidates();
        assert_eq!(candidates.value(Field::Title).as_deref(), Some("Google I/O 2015"));
        assert_eq!(candidates.value(Field::ShortName).as_deref(), Some("I/O 2015"));
        assert_eq!(candidates.value(Field::ThemeColor).as_deref(), Some("#2196F3"));
    }
}
