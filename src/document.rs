use std::sync::LazyLock;

use regex::Regex;

use crate::model::DocumentSections;

// A dash-only line of three or more hyphens with a blank line above it and a
// blank line (or the end of the text) below it. The padding is absorbed into
// the match. A rule on the very first line (front matter) or directly under a
// text line (setext heading) never matches.
static SECTION_DELIMITER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\A|\n)(?:[^\S\n]*\n)+[^\S\n]*-{3,}[^\S\n]*(?:\z|\n[^\S\n]*(?:\z|\n(?:[^\S\n]*\n)*))",
    )
    .expect("delimiter regex is valid")
});

/// Splits `text` at its first horizontal-rule line into the table region and
/// the free-form trailing region.
#[must_use]
pub fn split_document(text: &str) -> DocumentSections<'_> {
    match SECTION_DELIMITER_RE.find(text) {
        Some(found) => DocumentSections {
            before: &text[..found.start()],
            after: Some(&text[found.end()..]),
        },
        None => DocumentSections {
            before: text,
            after: None,
        },
    }
}
