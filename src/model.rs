use std::path::PathBuf;

use serde::Serialize;

/// One table row. The first cell is the row identifier.
pub type Row = Vec<String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Tables are compatible for accumulation only when their headers match
    /// element-wise.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.headers == other.headers
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    #[must_use]
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }
}

#[must_use]
pub fn identifier(row: &[String]) -> Option<&str> {
    row.first().map(String::as_str)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSections<'a> {
    pub before: &'a str,
    pub after: Option<&'a str>,
}

impl<'a> DocumentSections<'a> {
    /// Trailing content worth carrying into the output, if any.
    #[must_use]
    pub fn trailing(&self) -> Option<&'a str> {
        self.after.filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub name: String,
    pub sort_key: Option<u64>,
}

/// An in-memory Markdown source, named for logging and provenance markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub text: String,
}

impl Document {
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}
