//! Cell-level parsing for pipe tables: row splitting, delimiter rows and
//! inline-markup flattening.

use std::sync::LazyLock;

use pulldown_cmark::{Event, Options, Parser};
use regex::Regex;

fn is_escaped(chars: &[char], index: usize) -> bool {
    let backslashes = chars[..index]
        .iter()
        .rev()
        .take_while(|&&ch| ch == '\\')
        .count();
    backslashes % 2 == 1
}

pub(crate) fn has_unescaped_pipe(line: &str) -> bool {
    let chars = line.chars().collect::<Vec<_>>();
    chars
        .iter()
        .enumerate()
        .any(|(index, &ch)| ch == '|' && !is_escaped(&chars, index))
}

/// Splits a table line on unescaped pipes. Outer pipes are optional, cells are
/// returned untrimmed and still carry their inline markup.
///
/// A line whose interior is completely empty (`|` or `||`) has no cells.
pub(crate) fn split_row_cells(line: &str) -> Vec<String> {
    let chars = line.trim().chars().collect::<Vec<_>>();
    let mut start = 0;
    let mut end = chars.len();
    if chars.first() == Some(&'|') {
        start = 1;
    }
    if end > start && chars[end - 1] == '|' && !is_escaped(&chars, end - 1) {
        end -= 1;
    }
    if start >= end {
        return Vec::new();
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    for index in start..end {
        let ch = chars[index];
        if ch == '|' && !is_escaped(&chars, index) {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    cells.push(current);
    cells
}

fn is_delimiter_cell(cell: &str) -> bool {
    let cell = cell.trim();
    let cell = cell.strip_prefix(':').unwrap_or(cell);
    let cell = cell.strip_suffix(':').unwrap_or(cell);
    !cell.is_empty() && cell.chars().all(|ch| ch == '-')
}

/// Returns the column count when `line` is a header/body delimiter row such as
/// `| --- | :-: |`.
pub(crate) fn delimiter_width(line: &str) -> Option<usize> {
    if !has_unescaped_pipe(line) {
        return None;
    }
    let cells = split_row_cells(line);
    if cells.is_empty() || !cells.iter().all(|cell| is_delimiter_cell(cell)) {
        return None;
    }
    Some(cells.len())
}

/// Fence opener or closer: up to three spaces of indent, then three or more
/// backticks or tildes.
pub(crate) fn fence_marker(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let ch = trimmed.chars().next().filter(|ch| matches!(ch, '`' | '~'))?;
    let run = trimmed.chars().take_while(|&c| c == ch).count();
    (run >= 3).then_some((ch, run))
}

// Line starts that CommonMark would read as a block (heading, quote, list
// item, thematic break, fence, link reference definition) instead of inline
// text. A cell is always inline, so the marker gets escaped.
static BLOCK_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#{1,6}(?:[ \t]|$)|>|[-+*](?:[ \t]|$)|(?:[-*_][ \t]*){3,}$|`{3,}[^`]*$|~{3,}|\[[^\]]*\]:)")
        .expect("block marker regex is valid")
});

static ORDERED_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,9}[.)](?:[ \t]|$)").expect("ordered marker regex is valid"));

static LINE_BREAK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<br\s*/?>$").expect("line break regex is valid"));

/// Prepares one cell for inline parsing. `\|` is unescaped first, as GFM does
/// for table cells, so it also resolves inside code spans.
fn inline_source(cell: &str) -> String {
    let text = cell.trim().replace("\\|", "|");
    if BLOCK_MARKER_RE.is_match(&text) {
        return format!("\\{text}");
    }
    if let Some(found) = ORDERED_MARKER_RE.find(&text) {
        let digits = found.as_str().trim_end().len() - 1;
        return format!("{}\\{}", &text[..digits], &text[digits..]);
    }
    text
}

/// Flattens inline Markdown in a single cell to its plain text and trims it.
///
/// Text and code span content is kept, emphasis and link syntax is dropped,
/// entities are decoded and inline HTML is removed (`<br>` becomes a space).
#[must_use]
pub fn flatten_inline(text: &str) -> String {
    let source = inline_source(text);
    let mut out = String::with_capacity(source.len());
    for event in Parser::new_ext(&source, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::InlineHtml(tag) | Event::Html(tag) if LINE_BREAK_TAG_RE.is_match(tag.trim()) => {
                out.push(' ');
            }
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{delimiter_width, fence_marker, flatten_inline, has_unescaped_pipe, split_row_cells};

    #[test]
    fn splits_piped_row_with_outer_pipes() {
        assert_eq!(split_row_cells("| a | b |"), vec![" a ", " b "]);
    }

    #[test]
    fn splits_row_without_outer_pipes() {
        assert_eq!(split_row_cells("a | b"), vec!["a ", " b"]);
    }

    #[test]
    fn escaped_pipe_is_not_a_separator() {
        let cells = split_row_cells(r"| a \| b | c |");
        assert_eq!(cells, vec![r" a \| b ", " c "]);
        assert_eq!(flatten_inline(&cells[0]), "a | b");
    }

    #[test]
    fn bare_pipe_line_has_no_cells() {
        assert!(split_row_cells("|").is_empty());
        assert!(split_row_cells("||").is_empty());
        assert_eq!(split_row_cells("|  |"), vec!["  "]);
    }

    #[test]
    fn detects_delimiter_rows() {
        assert_eq!(delimiter_width("| --- | :---: | --: |"), Some(3));
        assert_eq!(delimiter_width("---|---"), Some(2));
        assert_eq!(delimiter_width("| --- | abc |"), None);
        assert_eq!(delimiter_width("---"), None);
    }

    #[test]
    fn pipe_detection_respects_escapes() {
        assert!(has_unescaped_pipe("a | b"));
        assert!(!has_unescaped_pipe(r"a \| b"));
        assert!(has_unescaped_pipe(r"a \\| b"));
    }

    #[test]
    fn recognizes_fence_markers() {
        assert_eq!(fence_marker("```rust"), Some(('`', 3)));
        assert_eq!(fence_marker("  ~~~~"), Some(('~', 4)));
        assert_eq!(fence_marker("    ```"), None);
        assert_eq!(fence_marker("``"), None);
    }

    #[test]
    fn flattens_emphasis_and_code() {
        assert_eq!(flatten_inline(" **bold** and *it* "), "bold and it");
        assert_eq!(flatten_inline("`let x = 1;`"), "let x = 1;");
        assert_eq!(flatten_inline("~~gone~~ kept"), "gone kept");
        assert_eq!(flatten_inline("__strong__"), "strong");
    }

    #[test]
    fn flattens_links_and_images() {
        assert_eq!(flatten_inline("[**docs**](https://example.com)"), "docs");
        assert_eq!(flatten_inline("![logo](img.png) text"), "logo text");
        assert_eq!(flatten_inline("<https://example.com>"), "https://example.com");
    }

    #[test]
    fn leaves_unpaired_and_intraword_markers() {
        assert_eq!(flatten_inline("snake_case_name"), "snake_case_name");
        assert_eq!(flatten_inline("2 * 3 * 4"), "2 * 3 * 4");
        assert_eq!(flatten_inline("[not a link]"), "[not a link]");
        assert_eq!(flatten_inline("a < b"), "a < b");
    }

    #[test]
    fn decodes_entities_and_drops_inline_html() {
        assert_eq!(flatten_inline("a &amp; b"), "a & b");
        assert_eq!(flatten_inline("x&lt;y"), "x<y");
        assert_eq!(flatten_inline("one<br>two"), "one two");
        assert_eq!(flatten_inline("<b>bold</b> text"), "bold text");
    }

    #[test]
    fn block_markers_stay_literal() {
        assert_eq!(flatten_inline("# 1"), "# 1");
        assert_eq!(flatten_inline("- item"), "- item");
        assert_eq!(flatten_inline("> quoted"), "> quoted");
        assert_eq!(flatten_inline("1. first"), "1. first");
        assert_eq!(flatten_inline("2)"), "2)");
        assert_eq!(flatten_inline("***"), "***");
        assert_eq!(flatten_inline("[a]: b"), "[a]: b");
    }

    #[test]
    fn escaped_pipe_resolves_inside_code() {
        assert_eq!(flatten_inline(r"`a \| b`"), "a | b");
    }

    #[test]
    fn keeps_internal_whitespace() {
        assert_eq!(flatten_inline("  two  spaces  "), "two  spaces");
    }
}
