use scraper::{ElementRef, Html};

/// A parsed page. html5ever recovers from any malformed markup, so parsing
/// itself never fails.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Self {
            html: Html::parse_document(text),
        }
    }

    /// All `tag` elements accepted by `predicate`, in document order.
    pub fn elements<'a, P>(&'a self, tag: &str, predicate: P) -> Vec<ElementRef<'a>>
    where
        P: Fn(&ElementRef<'a>) -> bool,
    {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name().eq_ignore_ascii_case(tag) && predicate(el))
            .collect()
    }

    pub fn first<'a, P>(&'a self, tag: &str, predicate: P) -> Option<ElementRef<'a>>
    where
        P: Fn(&ElementRef<'a>) -> bool,
    {
        self.elements(tag, predicate).into_iter().next()
    }
}

pub fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// Attribute value compared ASCII case-insensitively, surrounding whitespace ignored.
pub fn attr_is(el: &ElementRef<'_>, name: &str, expected: &str) -> bool {
    attr(el, name).is_some_and(|value| value.trim().eq_ignore_ascii_case(expected))
}

/// `rel` is a space separated token list (`rel="shortcut icon"`).
pub fn has_rel(el: &ElementRef<'_>, token: &str) -> bool {
    attr(el, "rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|t| t.eq_ignore_ascii_case(token))
    })
}

/// Non-blank attribute value, trimmed.
pub fn non_blank_attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    attr(el, name).map(str::trim).filter(|value| !value.is_empty())
}

/// Inside inline `<svg>` or `<math>`, where `<title>` and friends are
/// foreign elements rather than page metadata.
pub fn in_foreign_content(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| matches!(ancestor.value().name(), "svg" | "math"))
}

pub fn text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
