use std::fs;
use std::path::Path;

use crate::error::MergeError;
use crate::model::Table;

fn render_line(cells: &[String]) -> String {
    format!("| {} |\n", cells.join(" | "))
}

/// Renders `table` as a pipe table. Cell text is written as-is, so content
/// holding a literal `|` or newline will not read back the same.
#[must_use]
pub fn render_table(table: &Table) -> String {
    let mut out = render_line(&table.headers);
    out.push('|');
    out.push_str(&" --- |".repeat(table.headers.len()));
    out.push('\n');
    for row in &table.rows {
        out.push_str(&render_line(row));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrailingSection<'a> {
    pub source: &'a str,
    pub text: &'a str,
}

/// Assembles the output file: the table (when there is one), a `---` rule,
/// then every trailing section separated by blank lines.
pub(crate) fn render_document(
    table: Option<&Table>,
    trailing: &[TrailingSection<'_>],
    annotate_sources: bool,
) -> String {
    let mut out = String::new();
    if let Some(table) = table {
        out.push_str(&render_table(table));
        out.push('\n');
    }
    out.push_str("---\n\n");

    for section in trailing {
        if annotate_sources {
            out.push_str(&format!("<!-- source: {} -->\n", section.source));
        }
        out.push_str(section.text.trim_end());
        out.push_str("\n\n");
    }
    out
}

pub(crate) fn write_markdown(path: &Path, content: &str) -> Result<(), MergeError> {
    fs::write(path, content).map_err(|source| MergeError::Write {
        path: path.to_path_buf(),
        source,
    })
}
