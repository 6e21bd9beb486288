use crate::errors::FetchError;
use crate::metadata::extract::{OembedFormat, OembedLink};
use crate::metadata::fetchers::{strip_bom, Auxiliary};
use crate::metadata::types::{AuxiliaryKind, EmbedRecord};
use serde_json::{Map, Value};
use url::Url;

/// Integer fields of an oEmbed response. XML carries everything as
/// text, so these are converted back to keep both formats equivalent.
const NUMERIC_FIELDS: [&str; 5] = [
    "width",
    "height",
    "thumbnail_width",
    "thumbnail_height",
    "cache_age",
];

impl Auxiliary for OembedLink {
    type Output = EmbedRecord;

    fn kind(&self) -> AuxiliaryKind {
        AuxiliaryKind::Oembed
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn parse(&self, body: &[u8]) -> Result<EmbedRecord, FetchError> {
        parse_oembed(body, self.format)
    }
}

pub fn parse_oembed(body: &[u8], format: OembedFormat) -> Result<EmbedRecord, FetchError> {
    let raw = match format {
        OembedFormat::Json => parse_json(body)?,
        OembedFormat::Xml => parse_xml(body)?,
    };

    let html = raw.get("html").and_then(Value::as_str).map(str::to_string);
    if html.is_none() {
        log::debug!("oembed payload has no html field");
    }

    Ok(EmbedRecord { html, raw })
}

fn parse_json(body: &[u8]) -> Result<Value, FetchError> {
    let raw: Value = serde_json::from_slice(strip_bom(body))?;
    if !raw.is_object() {
        return Err(FetchError::Payload("oembed json is not an object".into()));
    }
    Ok(raw)
}

/// `<oembed><type>video</type><html>&lt;iframe ...</html></oembed>` becomes
/// `{"type": "video", "html": "<iframe ..."}`.
fn parse_xml(body: &[u8]) -> Result<Value, FetchError> {
    let text = std::str::from_utf8(strip_bom(body))
        .map_err(|err| FetchError::Payload(format!("oembed xml is not utf-8: {err}")))?;
    let doc = roxmltree::Document::parse(text)?;

    let root = doc.root_element();
    if root.tag_name().name() != "oembed" {
        log::debug!("unexpected oembed xml root <{}>", root.tag_name().name());
    }

    let mut fields = Map::new();
    for child in root.children().filter(|node| node.is_element()) {
        let key = child.tag_name().name().to_string();
        let text: String = child
            .descendants()
            .filter(|node| node.is_text())
            .filter_map(|node| node.text())
            .collect();
        let text = text.trim();

        let value = match text.parse::<u64>() {
            Ok(number) if NUMERIC_FIELDS.contains(&key.as_str()) => Value::from(number),
            _ => Value::String(text.to_string()),
        };
        fields.insert(key, value);
    }

    Ok(Value::Object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::fetchers::UTF8_BOM;

    const JSON: &str = r#"{
        "version": "1.0",
        "type": "video",
        "provider_name": "YouTube",
        "title": "Test Video",
        "width": 480,
        "height": 270,
        "html": "<iframe width=\"480\" height=\"270\" src=\"https://www.youtube.com/embed/abc\"></iframe>"
    }"#;

    const XML: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<oembed>
    <version>1.0</version>
    <type>video</type>
    <provider_name>YouTube</provider_name>
    <title>Test Video</title>
    <width>480</width>
    <height>270</height>
    <html>&lt;iframe width="480" height="270" src="https://www.youtube.com/embed/abc"&gt;&lt;/iframe&gt;</html>
</oembed>"#;

    #[test]
    fn test_json_payload() {
        let embed = parse_oembed(JSON.as_bytes(), OembedFormat::Json).unwrap();
        assert!(embed.html.as_deref().unwrap().starts_with("<iframe"));
        assert_eq!(embed.raw["provider_name"], "YouTube");
    }

    #[test]
    fn test_xml_payload_equivalent_to_json() {
        let json = parse_oembed(JSON.as_bytes(), OembedFormat::Json).unwrap();
        let xml = parse_oembed(XML.as_bytes(), OembedFormat::Xml).unwrap();
        assert_eq!(json.html, xml.html);
        assert_eq!(json.raw, xml.raw);
    }

    #[test]
    fn test_xml_cdata_html() {
        let body = r#"<oembed><type>rich</type><html><![CDATA[<div>hi</div>]]></html></oembed>"#;
        let embed = parse_oembed(body.as_bytes(), OembedFormat::Xml).unwrap();
        assert_eq!(embed.html.as_deref(), Some("<div>hi</div>"));
    }

    #[test]
    fn test_non_numeric_field_stays_text() {
        let body = r#"<oembed><title>1984</title><width>wide</width></oembed>"#;
        let embed = parse_oembed(body.as_bytes(), OembedFormat::Xml).unwrap();
        assert_eq!(embed.raw["title"], "1984");
        assert_eq!(embed.raw["width"], "wide");
    }

    #[test]
    fn test_missing_html_still_returns_record() {
        let embed = parse_oembed(br#"{"type": "link", "title": "t"}"#, OembedFormat::Json).unwrap();
        assert!(embed.html.is_none());
        assert_eq!(embed.raw["type"], "link");
    }

    #[test]
    fn test_byte_order_mark_tolerated_in_both_formats() {
        let with_bom = |payload: &str| [UTF8_BOM, payload.as_bytes()].concat();

        let json = parse_oembed(&with_bom(JSON), OembedFormat::Json).unwrap();
        let xml = parse_oembed(&with_bom(XML), OembedFormat::Xml).unwrap();
        assert!(json.html.is_some());
        assert_eq!(json, xml);
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            parse_oembed(b"<html>not json", OembedFormat::Json),
            Err(FetchError::Payload(_))
        ));
        assert!(matches!(
            parse_oembed(b"\"just a string\"", OembedFormat::Json),
            Err(FetchError::Payload(_))
        ));
        assert!(matches!(
            parse_oembed(b"<oembed><html>unclosed", OembedFormat::Xml),
            Err(FetchError::Payload(_))
        ));
        assert!(matches!(
            parse_oembed(&[0x3c, 0xff, 0xfe], OembedFormat::Xml),
            Err(FetchError::Payload(_))
        ));
    }
}
