use crate::metadata::types::IconCandidate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Compile the `WxH` size token regex once
static SIZE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)[xX](\d+)$").expect("Failed to compile icon size regex"));

/// Largest edge declared by a `sizes` attribute (`"180x180"`, `"16x16 32x32"`).
/// `any`, garbage and missing values all count as 0.
pub fn parse_sizes(sizes: Option<&str>) -> u32 {
    let Some(sizes) = sizes else {
        return 0;
    };

    sizes
        .split_ascii_whitespace()
        .filter_map(|token| {
            let caps = SIZE_REGEX.captures(token)?;
            let width: u32 = caps[1].parse().ok()?;
            let height: u32 = caps[2].parse().ok()?;
            Some(width.max(height))
        })
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconSelection {
    pub icon: Option<String>,
    pub icons: Vec<IconCandidate>,
}

/// Dedupe by URL and rank by declared size, biggest first.
///
/// A URL seen twice keeps its first position and the larger of the two
/// sizes. The sort is stable, so equal sizes stay in first-seen order: link
/// icons from the page come before manifest icons.
pub fn select(candidates: impl IntoIterator<Item = IconCandidate>) -> IconSelection {
    let mut icons: Vec<IconCandidate> = Vec::new();

    for candidate in candidates {
        match icons.iter_mut().find(|icon| icon.url == candidate.url) {
            Some(existing) => existing.size = existing.size.max(candidate.size),
            None => icons.push(candidate),
        }
    }

    icons.sort_by(|a, b| b.size.cmp(&a.size));

    let icon = icons.first().map(|icon| icon.url.clone());
    if let Some(ref best) = icon {
        log::debug!("icons={} best={best}", icons.len());
    }

    IconSelection { icon, icons }
}
