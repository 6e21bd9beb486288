use anyhow::{bail, Context};
use clap::Parser;
use magnet_parser::metadata::fetchers::fetch_body;
use magnet_parser::{HttpFetcher, MetadataParser, ParserConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Page url, also the base for every relative reference
    pub url: String,

    /// Yaml config file
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Read the document from a file instead of fetching the url
    #[clap(long)]
    pub html: Option<PathBuf>,

    /// Print the resolution report next to the metadata
    #[clap(long, default_value = "false")]
    pub report: bool,
}

fn init_logging() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))
}

fn load_document(args: &Args, config: &ParserConfig) -> anyhow::Result<String> {
    if let Some(path) = &args.html {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read document {}", path.display()));
    }

    let url = Url::parse(&args.url).with_context(|| format!("invalid url {}", args.url))?;
    let page_config = ParserConfig {
        max_resource_bytes: config.max_document_bytes.unwrap_or(usize::MAX),
        ..config.clone()
    };
    let fetcher = HttpFetcher::new(&page_config)?;
    let body = fetch_body(&fetcher, &url).with_context(|| format!("failed to fetch {url}"))?;

    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging()?;

    let config = match &args.config {
        Some(path) => ParserConfig::load(path)?,
        None => ParserConfig::default(),
    };

    let html = load_document(&args, &config)?;
    if html.trim().is_empty() {
        bail!("{}: empty document", args.url);
    }

    let parser = MetadataParser::new(config)?;
    let (metadata, report) = parser.parse_with_report(&html, &args.url)?;

    for aux in &report.auxiliary {
        tracing::debug!(kind = aux.kind.name(), outcome = ?aux.outcome, "auxiliary");
    }
    tracing::info!(url = %args.url, ms = report.duration_ms, "resolved");

    let output = if args.report {
        serde_json::to_string_pretty(&serde_json::json!({
            "metadata": metadata,
            "report": report,
        }))?
    } else {
        serde_json::to_string_pretty(&metadata)?
    };
    println!("{output}");

    Ok(())
}
