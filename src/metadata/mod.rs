pub mod document;
pub mod extract;
pub mod fetchers;
pub mod icons;
pub mod normalize;
pub mod precedence;
pub mod types;

pub use fetchers::http::HttpFetcher;
pub use fetchers::{FetchedResource, ResourceFetcher};
pub use types::{
    AuxiliaryKind, AuxiliaryReport, AuxiliaryStatus, EmbedRecord, FieldDecision, IconCandidate,
    IconOrigin, OpenGraphData, ResolutionReport, ResolvedMetadata,
};

use crate::config::ParserConfig;
use crate::errors::{FetchError, ParseError};
use document::Document;
use extract::PageExtract;
use fetchers::manifest::{ManifestRequest, WebManifest};
use fetchers::{run_auxiliary, Auxiliary};
use precedence::{Candidates, Field};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Instant;
use url::Url;

const PREVIEW_CHARS: usize = 80;

/// Resolves page metadata using a fixed auxiliary fetcher and configuration.
pub struct MetadataParser {
    fetcher: Box<dyn ResourceFetcher>,
    config: ParserConfig,
}

impl MetadataParser {
    /// Parser backed by [`HttpFetcher`]
    pub fn new(config: ParserConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(fetcher, config))
    }

    pub fn with_fetcher(fetcher: impl ResourceFetcher + 'static, config: ParserConfig) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            config,
        }
    }

    pub fn parse(&self, html: &str, url: &str) -> Result<ResolvedMetadata, ParseError> {
        self.parse_with_report(html, url).map(|(metadata, _)| metadata)
    }

    pub fn parse_with_report(
        &self,
        html: &str,
        url: &str,
    ) -> Result<(ResolvedMetadata, ResolutionReport), ParseError> {
        resolve(html, url, self.fetcher.as_ref(), &self.config)
    }
}

/// Main entry point: resolve the metadata of `html`, fetched from `url`.
///
/// Only an unusable `url` fails the call, documents of any size are
/// accepted; a broken manifest or oEmbed endpoint just leaves its fields
/// empty. Use [`MetadataParser`] to cap the document size.
pub fn parse(
    html: &str,
    url: &str,
    fetcher: &dyn ResourceFetcher,
) -> Result<ResolvedMetadata, ParseError> {
    resolve(html, url, fetcher, &ParserConfig::default()).map(|(metadata, _)| metadata)
}

fn page_url(url: &str) -> Result<Url, ParseError> {
    let parsed = Url::parse(url.trim()).map_err(|err| ParseError::InvalidBaseUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })?;

    if parsed.cannot_be_a_base() {
        return Err(ParseError::InvalidBaseUrl {
            url: url.to_string(),
            reason: "url cannot be a base".into(),
        });
    }

    Ok(parsed)
}

fn resolve(
    html: &str,
    url: &str,
    fetcher: &dyn ResourceFetcher,
    config: &ParserConfig,
) -> Result<(ResolvedMetadata, ResolutionReport), ParseError> {
    let started = Instant::now();

    if let Some(limit) = config.max_document_bytes.filter(|limit| html.len() > *limit) {
        return Err(ParseError::DocumentParse(format!(
            "document is {} bytes, limit is {limit}",
            html.len()
        )));
    }
    let page_url = page_url(url)?;

    // the parsed tree is not Send, so it lives only for the extraction phase
    let page = {
        let document = Document::parse(html);
        extract::extract_page(&document, &page_url)
    };

    let manifest_request = page.manifest_url.clone().map(|url| ManifestRequest {
        url,
        page_url: page_url.clone(),
    });

    let ((manifest, manifest_report), (embed, embed_report)) = thread::scope(|s| {
        let manifest = spawn_auxiliary(
            s,
            planned(manifest_request.as_ref(), config.fetch_manifest, AuxiliaryKind::Manifest),
            fetcher,
        );
        let embed = spawn_auxiliary(
            s,
            planned(page.oembed.as_ref(), config.fetch_oembed, AuxiliaryKind::Oembed),
            fetcher,
        );
        (manifest.join(), embed.join())
    });

    let mut report = ResolutionReport {
        auxiliary: vec![manifest_report, embed_report],
        ..Default::default()
    };
    let metadata = assemble(page, manifest, embed, &mut report);

    if !metadata.has_any_data() {
        log::info!("{page_url}: no metadata found");
    }
    report.duration_ms = started.elapsed().as_millis() as u64;
    log::debug!("{page_url}: resolved in {}ms", report.duration_ms);

    Ok((metadata, report))
}

/// Merge page candidates with the manifest and pick every field's winner.
fn assemble(
    page: PageExtract,
    manifest: Option<WebManifest>,
    embed: Option<EmbedRecord>,
    report: &mut ResolutionReport,
) -> ResolvedMetadata {
    let mut icon_candidates = page.icons;
    let candidates = match manifest {
        Some(ref manifest) => {
            icon_candidates.extend(manifest.icons.iter().cloned());
            page.candidates.merged(&manifest.candidates())
        }
        None => page.candidates,
    };
    let selection = icons::select(icon_candidates);

    record_decisions(&candidates, report);

    let (raw_manifest, start_url) = match manifest {
        Some(manifest) => (Some(manifest.raw), manifest.start_url.map(String::from)),
        None => (None, None),
    };

    ResolvedMetadata {
        title: candidates.value(Field::Title),
        description: candidates.value(Field::Description),
        keywords: page.keywords,
        icon: selection.icon,
        icons: selection.icons,
        og_data: page.og_data,
        manifest: raw_manifest,
        short_name: candidates.value(Field::ShortName),
        theme_color: candidates.value(Field::ThemeColor),
        embed,
        url: candidates.value(Field::CanonicalUrl),
        image: candidates.value(Field::Image),
        start_url,
    }
}

fn record_decisions(candidates: &Candidates, report: &mut ResolutionReport) {
    for field in [
        Field::Title,
        Field::Description,
        Field::ShortName,
        Field::ThemeColor,
        Field::CanonicalUrl,
        Field::Image,
    ] {
        let Some(winner) = candidates.winner(field) else {
            continue;
        };
        log::debug!("field={} winner={}", field.name(), winner.source.name());
        report.field_decisions.push(FieldDecision {
            field: field.name().into(),
            winner: winner.source.name().into(),
            value_preview: Some(winner.value.chars().take(PREVIEW_CHARS).collect()),
        });
    }
}

fn planned<A: Auxiliary>(
    aux: Option<&A>,
    enabled: bool,
    kind: AuxiliaryKind,
) -> Result<&A, AuxiliaryReport> {
    match aux {
        None => Err(AuxiliaryReport::skipped(kind, None, "not linked")),
        Some(aux) if !enabled => Err(AuxiliaryReport::skipped(kind, Some(aux.url()), "disabled")),
        Some(aux) => Ok(aux),
    }
}

enum Pending<'scope, 'env, A: Auxiliary> {
    Skipped(AuxiliaryReport),
    Running(&'env A, ScopedJoinHandle<'scope, (Option<A::Output>, AuxiliaryReport)>),
}

fn spawn_auxiliary<'scope, 'env, A>(
    scope: &'scope Scope<'scope, 'env>,
    planned: Result<&'env A, AuxiliaryReport>,
    fetcher: &'env dyn ResourceFetcher,
) -> Pending<'scope, 'env, A>
where
    A: Auxiliary,
    A::Output: 'scope,
{
    match planned {
        Err(report) => {
            log::debug!("aux={} outcome=skip", report.kind.name());
            Pending::Skipped(report)
        }
        Ok(aux) => Pending::Running(aux, scope.spawn(move || run_auxiliary(aux, fetcher))),
    }
}

impl<'scope, 'env, A: Auxiliary> Pending<'scope, 'env, A> {
    /// A panicking worker only loses its own sub-result.
    fn join(self) -> (Option<A::Output>, AuxiliaryReport) {
        match self {
            Pending::Skipped(report) => (None, report),
            Pending::Running(aux, handle) => handle.join().unwrap_or_else(|_| {
                log::warn!("aux={} outcome=error err=worker panicked", aux.kind().name());
                let report = AuxiliaryReport::failed(aux.kind(), aux.url(), &FetchError::Aborted, 0);
                (None, report)
            }),
        }
    }
}
