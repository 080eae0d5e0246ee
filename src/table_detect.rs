use std::iter::Peekable;
use std::str::Lines;

use crate::model::{Row, Table};
use crate::table_parse::{
    delimiter_width, fence_marker, flatten_inline, has_unescaped_pipe, split_row_cells,
};

/// Recognizes GFM pipe tables inside arbitrary Markdown.
///
/// The extractor holds no state between calls; construct one and pass it to
/// whatever needs to read tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableExtractor;

impl TableExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Lazily yields every table in `text`, in document order.
    #[must_use]
    pub fn extract<'a>(&self, text: &'a str) -> Tables<'a> {
        Tables {
            lines: text.lines().peekable(),
            fence: None,
        }
    }

    #[must_use]
    pub fn first_table(&self, text: &str) -> Option<Table> {
        self.extract(text).next()
    }
}

/// Convenience wrapper over a default [`TableExtractor`].
#[must_use]
pub fn extract_tables(text: &str) -> Tables<'_> {
    TableExtractor::new().extract(text)
}

#[derive(Debug, Clone, Copy)]
struct Fence {
    ch: char,
    len: usize,
}

#[derive(Debug)]
pub struct Tables<'a> {
    lines: Peekable<Lines<'a>>,
    fence: Option<Fence>,
}

impl Tables<'_> {
    /// Returns true when `line` opens, closes or sits inside a fenced block.
    fn in_code_fence(&mut self, line: &str) -> bool {
        if let Some(open) = self.fence {
            if let Some((ch, len)) = fence_marker(line) {
                let rest = line.trim_start().trim_start_matches(ch);
                if ch == open.ch && len >= open.len && rest.trim().is_empty() {
                    self.fence = None;
                }
            }
            return true;
        }

        if let Some((ch, len)) = fence_marker(line) {
            self.fence = Some(Fence { ch, len });
            return true;
        }
        false
    }

    fn take_body_rows(&mut self) -> Vec<Row> {
        let mut rows = Vec::new();
        while let Some(&line) = self.lines.peek() {
            if line.trim().is_empty() || !has_unescaped_pipe(line) || fence_marker(line).is_some()
            {
                break;
            }
            self.lines.next();

            let cells = split_row_cells(line)
                .iter()
                .map(|cell| flatten_inline(cell))
                .collect::<Vec<_>>();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
        rows
    }
}

impl Iterator for Tables<'_> {
    type Item = Table;

    fn next(&mut self) -> Option<Table> {
        while let Some(line) = self.lines.next() {
            if self.in_code_fence(line) || !has_unescaped_pipe(line) {
                continue;
            }

            let header_cells = split_row_cells(line);
            let Some(&next_line) = self.lines.peek() else {
                return None;
            };
            if delimiter_width(next_line) != Some(header_cells.len()) {
                continue;
            }
            self.lines.next();

            let headers = header_cells
                .iter()
                .map(|cell| flatten_inline(cell))
                .collect::<Vec<_>>();
            let rows = self.take_body_rows();

            // a table without header text has no merge key
            if headers.iter().all(String::is_empty) {
                continue;
            }
            return Some(Table::new(headers, rows));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{TableExtractor, extract_tables};
    use crate::model::Table;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn extracts_table_embedded_in_prose() {
        let text = "# Results\n\nSome intro.\n\n| ID | Name |\n| --- | --- |\n| 1 | Alice |\n| 2 | Bob |\n\nClosing words.\n";
        let tables = extract_tables(text).collect::<Vec<_>>();
        assert_eq!(
            tables,
            vec![Table::new(
                strings(&["ID", "Name"]),
                vec![strings(&["1", "Alice"]), strings(&["2", "Bob"])],
            )]
        );
    }

    #[test]
    fn header_only_table_has_no_rows() {
        let table = TableExtractor::new()
            .first_table("| A | B |\n|---|---|\n")
            .expect("table should be found");
        assert_eq!(table.headers, strings(&["A", "B"]));
        assert!(table.rows.is_empty());
    }

    #[test]
    fn yields_tables_in_document_order() {
        let text = "| A |\n| - |\n| 1 |\n\ntext\n\n| B | C |\n|:--|--:|\n| 2 | 3 |\n";
        let headers = extract_tables(text)
            .map(|table| table.headers)
            .collect::<Vec<_>>();
        assert_eq!(headers, vec![strings(&["A"]), strings(&["B", "C"])]);
    }

    #[test]
    fn mismatched_delimiter_width_is_not_a_table() {
        let text = "| A | B |\n| --- |\n| 1 | 2 |\n";
        assert_eq!(extract_tables(text).count(), 0);
    }

    #[test]
    fn headerless_table_is_discarded() {
        let text = "|   |   |\n|---|---|\n| 1 | 2 |\n";
        assert_eq!(extract_tables(text).count(), 0);
    }

    #[test]
    fn ragged_rows_are_kept_and_empty_rows_dropped() {
        let text = "| A | B |\n|---|---|\n| 1 |\n|\n| 2 | 3 | 4 |\n";
        let table = TableExtractor::new()
            .first_table(text)
            .expect("table should be found");
        assert_eq!(table.rows, vec![strings(&["1"]), strings(&["2", "3", "4"])]);
    }

    #[test]
    fn non_row_line_terminates_table() {
        let text = "| A |\n|---|\n| 1 |\nplain text\n| 2 |\n";
        let table = TableExtractor::new()
            .first_table(text)
            .expect("table should be found");
        assert_eq!(table.rows, vec![strings(&["1"])]);
    }

    #[test]
    fn ignores_tables_inside_code_fences() {
        let text = "```\n| A | B |\n|---|---|\n| 1 | 2 |\n```\n\n| C |\n|---|\n| 3 |\n";
        let tables = extract_tables(text).collect::<Vec<_>>();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, strings(&["C"]));
    }

    #[test]
    fn cells_are_flattened_and_trimmed() {
        let text = "| **ID** | `code` |\n|---|---|\n|  [x](http://a)  | a \\| b |\n";
        let table = TableExtractor::new()
            .first_table(text)
            .expect("table should be found");
        assert_eq!(table.headers, strings(&["ID", "code"]));
        assert_eq!(table.rows, vec![strings(&["x", "a | b"])]);
    }
}
