//! Network-free extractors over a parsed [`Document`].
//!
//! Each extractor is a pure function of the document and the base URL; the
//! orchestrator runs them all before any auxiliary fetch is issued.

use crate::metadata::document::{
    attr, attr_is, has_rel, in_foreign_content, non_blank_attr, text, Document,
};
use crate::metadata::icons::parse_sizes;
use crate::metadata::normalize::resolve_url;
use crate::metadata::precedence::{Candidates, Field, Source};
use crate::metadata::types::{IconCandidate, IconOrigin, OpenGraphData};
use scraper::ElementRef;
use url::Url;

const ICON_RELS: [&str; 3] = ["icon", "apple-touch-icon", "apple-touch-icon-precomposed"];
const OEMBED_JSON_TYPE: &str = "application/json+oembed";
const OEMBED_XML_TYPE: &str = "text/xml+oembed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OembedFormat {
    Json,
    Xml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OembedLink {
    pub url: Url,
    pub format: OembedFormat,
}

/// Everything the page itself says, before manifest and oEmbed are consulted.
#[derive(Debug, Clone)]
pub struct PageExtract {
    pub base_url: Url,
    pub candidates: Candidates,
    pub keywords: Vec<String>,
    pub icons: Vec<IconCandidate>,
    pub og_data: OpenGraphData,
    pub manifest_url: Option<Url>,
    pub oembed: Option<OembedLink>,
}

pub fn extract_page(document: &Document, page_url: &Url) -> PageExtract {
    let base_url = base_url(document, page_url);
    let og_data = open_graph(document);

    let mut candidates = Candidates::default();
    text_candidates(document, &og_data, &mut candidates);
    theme_color_candidates(document, &mut candidates);
    canonical_candidates(document, &og_data, &base_url, &mut candidates);
    image_candidates(document, &og_data, &base_url, &mut candidates);

    PageExtract {
        keywords: keywords(document),
        icons: link_icons(document, &base_url),
        manifest_url: manifest_link(document, &base_url),
        oembed: oembed_link(document, &base_url),
        base_url,
        candidates,
        og_data,
    }
}

/// `<base href>` overrides the page URL for every relative reference in the page.
pub fn base_url(document: &Document, page_url: &Url) -> Url {
    let Some(href) = document
        .first("base", |el| non_blank_attr(el, "href").is_some())
        .and_then(|el| non_blank_attr(&el, "href"))
    else {
        return page_url.clone();
    };

    match resolve_url(href, page_url) {
        Ok(url) if !url.cannot_be_a_base() => url,
        Ok(url) => {
            log::debug!("ignoring <base href={url}>: cannot be a base");
            page_url.clone()
        }
        Err(err) => {
            log::debug!("ignoring <base>: {err}");
            page_url.clone()
        }
    }
}

fn meta_named<'a>(document: &'a Document, name: &str) -> Option<ElementRef<'a>> {
    document.first("meta", |el| attr_is(el, "name", name))
}

fn meta_content<'a>(el: &ElementRef<'a>) -> &'a str {
    attr(el, "content").unwrap_or_default()
}

fn text_candidates(document: &Document, og_data: &OpenGraphData, candidates: &mut Candidates) {
    if let Some(title) = document.first("title", |el| !in_foreign_content(el)) {
        candidates.push(Field::Title, Source::TitleElement, &text(&title));
    }
    if let Some(og_title) = og_data.get("title") {
        candidates.push(Field::Title, Source::OpenGraph, og_title);
    }

    if let Some(description) = meta_named(document, "description") {
        candidates.push(Field::Description, Source::Meta, meta_content(&description));
    }
    if let Some(og_description) = og_data.get("description") {
        candidates.push(Field::Description, Source::OpenGraph, og_description);
    }
}

/// Comma separated, trimmed, empty entries dropped, source order kept.
pub fn keywords(document: &Document) -> Vec<String> {
    meta_named(document, "keywords")
        .map(|el| {
            meta_content(&el)
                .split(',')
                .map(str::trim)
                .filter(|keyword| !keyword.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `meta[property^="og:"]`, later duplicates overwrite earlier ones.
pub fn open_graph(document: &Document) -> OpenGraphData {
    let mut og_data = OpenGraphData::new();

    let elements = document.elements("meta", |el| {
        attr(el, "property").is_some_and(|property| property.starts_with("og:"))
    });
    for el in elements {
        let Some(key) = attr(&el, "property").and_then(|p| p.strip_prefix("og:")) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        og_data.insert(key.to_string(), meta_content(&el).to_string());
    }

    og_data
}

fn theme_color_candidates(document: &Document, candidates: &mut Candidates) {
    if let Some(theme_color) = meta_named(document, "theme-color") {
        candidates.push(Field::ThemeColor, Source::Meta, meta_content(&theme_color));
    }
}

fn push_resolved(
    candidates: &mut Candidates,
    field: Field,
    source: Source,
    reference: &str,
    base_url: &Url,
) {
    match resolve_url(reference, base_url) {
        Ok(url) => candidates.push(field, source, url.as_str()),
        Err(err) => log::debug!("field={} source={} dropped: {err}", field.name(), source.name()),
    }
}

fn canonical_candidates(
    document: &Document,
    og_data: &OpenGraphData,
    base_url: &Url,
    candidates: &mut Candidates,
) {
    if let Some(href) = document
        .first("link", |el| has_rel(el, "canonical") && non_blank_attr(el, "href").is_some())
        .and_then(|el| non_blank_attr(&el, "href"))
    {
        push_resolved(candidates, Field::CanonicalUrl, Source::Link, href, base_url);
    }
    if let Some(og_url) = og_data.get("url") {
        push_resolved(candidates, Field::CanonicalUrl, Source::OpenGraph, og_url, base_url);
    }
}

fn image_candidates(
    document: &Document,
    og_data: &OpenGraphData,
    base_url: &Url,
    candidates: &mut Candidates,
) {
    for key in ["image", "image:url"] {
        if let Some(image) = og_data.get(key) {
            push_resolved(candidates, Field::Image, Source::OpenGraph, image, base_url);
        }
    }

    let twitter_image = document.first("meta", |el| {
        attr_is(el, "name", "twitter:image") || attr_is(el, "property", "twitter:image")
    });
    if let Some(el) = twitter_image {
        push_resolved(candidates, Field::Image, Source::Meta, meta_content(&el), base_url);
    }
}

fn is_icon_link(el: &ElementRef<'_>) -> bool {
    ICON_RELS.iter().any(|rel| has_rel(el, rel))
}

/// `<link rel~=icon>`, `apple-touch-icon` and `apple-touch-icon-precomposed`,
/// resolved against the page base. Unresolvable and `data:` hrefs are dropped.
pub fn link_icons(document: &Document, base_url: &Url) -> Vec<IconCandidate> {
    document
        .elements("link", is_icon_link)
        .iter()
        .filter_map(|el| {
            let href = non_blank_attr(el, "href")?;
            if href.starts_with("data:") {
                log::debug!("inline data icons are not supported");
                return None;
            }
            match resolve_url(href, base_url) {
                Ok(url) => Some(IconCandidate {
                    url: url.to_string(),
                    size: parse_sizes(attr(el, "sizes")),
                    origin: IconOrigin::Link,
                }),
                Err(err) => {
                    log::debug!("icon dropped: {err}");
                    None
                }
            }
        })
        .collect()
}

pub fn manifest_link(document: &Document, base_url: &Url) -> Option<Url> {
    let href = document
        .first("link", |el| has_rel(el, "manifest") && non_blank_attr(el, "href").is_some())
        .and_then(|el| non_blank_attr(&el, "href"))?;

    resolve_url(href, base_url)
        .map_err(|err| log::debug!("manifest link dropped: {err}"))
        .ok()
}

/// JSON wins over XML when a page advertises both.
pub fn oembed_link(document: &Document, base_url: &Url) -> Option<OembedLink> {
    [
        (OEMBED_JSON_TYPE, OembedFormat::Json),
        (OEMBED_XML_TYPE, OembedFormat::Xml),
    ]
    .into_iter()
    .find_map(|(mime, format)| {
        let href = document
            .first("link", |el| attr_is(el, "type", mime) && non_blank_attr(el, "href").is_some())
            .and_then(|el| non_blank_attr(&el, "href"))?;

        match resolve_url(href, base_url) {
            Ok(url) => Some(OembedLink { url, format }),
            Err(err) => {
                log::debug!("oembed link dropped: {err}");
                None
            }
        }
    })
}
