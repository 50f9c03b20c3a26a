use regex::Regex;
use std::sync::LazyLock;

// Two or more line breaks in a row, i.e. at least one blank line
static PAGE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){2,}").expect("page boundary pattern is valid"));

/// Split extracted report text into per-sample segments.
///
/// The instrument prints one sample per page and `pdf-extract` leaves a blank
/// line between pages, so blank lines are used as the boundary. Empty
/// segments are dropped, nothing else is filtered.
pub fn split_pages(text: &str) -> Vec<&str> {
    PAGE_BOUNDARY
        .split(text)
        .filter(|segment| !segment.is_empty())
        .collect()
}
