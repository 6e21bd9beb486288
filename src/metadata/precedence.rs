//! Per-field precedence between overlapping metadata conventions.
//!
//! Extractors only ever push candidates; the winner is picked from a fixed
//! table of sources, so the order in which candidates arrive (document order,
//! fetch completion order) never changes the result.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    ShortName,
    ThemeColor,
    CanonicalUrl,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Web app manifest
    Manifest,
    /// `<title>` element
    TitleElement,
    /// `<meta name=...>`
    Meta,
    /// `<link rel=...>`
    Link,
    /// `<meta property="og:...">`
    OpenGraph,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::ShortName => "short_name",
            Field::ThemeColor => "theme_color",
            Field::CanonicalUrl => "url",
            Field::Image => "image",
        }
    }

    /// Sources allowed to contribute to this field, strongest first.
    fn precedence(self) -> &'static [Source] {
        match self {
            Field::Title => &[Source::Manifest, Source::TitleElement, Source::OpenGraph],
            Field::Description => &[Source::Meta, Source::OpenGraph],
            Field::ShortName => &[Source::Manifest],
            Field::ThemeColor => &[Source::Manifest, Source::Meta],
            Field::CanonicalUrl => &[Source::Link, Source::OpenGraph],
            Field::Image => &[Source::OpenGraph, Source::Meta],
        }
    }
}

impl Source {
    pub fn name(self) -> &'static str {
        match self {
            Source::Manifest => "manifest",
            Source::TitleElement => "title element",
            Source::Meta => "meta",
            Source::Link => "link",
            Source::OpenGraph => "open graph",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub field: Field,
    pub value: String,
    pub source: Source,
}

#[derive(Debug, Clone, Default)]
pub struct Candidates(Vec<Candidate>);

impl Candidates {
    /// Blank values are not candidates.
    pub fn push(&mut self, field: Field, source: Source, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.0.push(Candidate {
            field,
            value: value.to_string(),
            source,
        });
    }

    /// Within one source the earliest pushed candidate wins.
    pub fn winner(&self, field: Field) -> Option<&Candidate> {
        field.precedence().iter().find_map(|source| {
            self.0
                .iter()
                .find(|c| c.field == field && c.source == *source)
        })
    }

    pub fn value(&self, field: Field) -> Option<String> {
        self.winner(field).map(|c| c.value.clone())
    }

    /// New set holding both; neither input is modified.
    pub fn merged(&self, other: &Candidates) -> Candidates {
        let mut all = self.0.clone();
        all.extend(other.0.iter().cloned());
        Candidates(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_name_beats_title_regardless_of_order() {
        let mut page = Candidates::default();
        page.push(Field::Title, Source::OpenGraph, "og");
        page.push(Field::Title, Source::TitleElement, "title");
        let mut manifest = Candidates::default();
        manifest.push(Field::Title, Source::Manifest, "Google I/O 2015");

        assert_eq!(page.merged(&manifest).value(Field::Title).as_deref(), Some("Google I/O 2015"));
        assert_eq!(manifest.merged(&page).value(Field::Title).as_deref(), Some("Google I/O 2015"));
        assert_eq!(page.value(Field::Title).as_deref(), Some("title"));
    }

    #[test]
    fn test_og_title_is_last_resort() {
        let mut c = Candidates::default();
        c.push(Field::Title, Source::OpenGraph, "og");
        assert_eq!(c.winner(Field::Title).unwrap().source, Source::OpenGraph);
    }

    #[test]
    fn test_description_prefers_meta() {
        let mut c = Candidates::default();
        c.push(Field::Description, Source::OpenGraph, "og description");
        c.push(Field::Description, Source::Meta, "meta description");
        assert_eq!(c.value(Field::Description).as_deref(), Some("meta description"));
    }

    #[test]
    fn test_blank_values_ignored() {
        let mut c = Candidates::default();
        c.push(Field::ThemeColor, Source::Manifest, "   ");
        c.push(Field::ThemeColor, Source::Meta, "#db5945");
        assert_eq!(c.value(Field::ThemeColor).as_deref(), Some("#db5945"));
    }

    #[test]
    fn test_first_candidate_within_source_wins() {
        let mut c = Candidates::default();
        c.push(Field::Image, Source::OpenGraph, "a.png");
        c.push(Field::Image, Source::OpenGraph, "b.png");
        assert_eq!(c.value(Field::Image).as_deref(), Some("a.png"));
    }

    #[test]
    fn test_source_outside_table_never_wins() {
        let mut c = Candidates::default();
        c.push(Field::ShortName, Source::Meta, "nope");
        assert!(c.winner(Field::ShortName).is_none());
    }

    #[test]
    fn test_values_are_trimmed() {
        let mut c = Candidates::default();
        c.push(Field::Title, Source::TitleElement, "  spaced  ");
        assert_eq!(c.value(Field::Title).as_deref(), Some("spaced"));
    }
}
