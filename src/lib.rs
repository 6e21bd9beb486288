//! Page metadata resolution: title, description, keywords, icons, Open Graph,
//! web app manifest, oEmbed and theme color from an HTML document and its URL.

pub mod config;
pub mod errors;
pub mod metadata;
#[cfg(test)]
mod tests;

pub use config::ParserConfig;
pub use errors::{FetchError, ParseError, ResolveError};
pub use metadata::{
    parse, EmbedRecord, HttpFetcher, IconCandidate, IconOrigin, MetadataParser, ResolutionReport,
    ResolvedMetadata, ResourceFetcher,
};
