mod discovery;
mod document;
mod error;
mod markdown_out;
mod merge;
mod model;
mod options;
mod table_detect;
mod table_parse;
mod warning;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::discovery::discover;
use crate::markdown_out::{TrailingSection, render_document, write_markdown};

pub use discovery::{Discovery, OrderPolicy, RESULT_MARKER, sort_key};
pub use document::split_document;
pub use error::MergeError;
pub use markdown_out::render_table;
pub use merge::{Accumulated, accumulate, merge_by_identifier};
pub use model::{Document, DocumentSections, Row, SourceFile, Table, identifier};
pub use options::{AuxiliaryMatchRule, DEFAULT_OUTPUT_FILE, MergeOptions};
pub use table_detect::{TableExtractor, Tables, extract_tables};
pub use table_parse::flatten_inline;
pub use warning::{MergeWarning, WarningCode};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub row_count: usize,
    pub column_count: usize,
    pub table_count: usize,
    /// Documents whose tables made it into the output, in merge order.
    pub sources: Vec<String>,
    /// Files left out by naming convention or because they could not be read.
    pub skipped: Vec<String>,
    pub warnings: Vec<MergeWarning>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_document(path: &Path) -> Result<Document, MergeError> {
    let text = fs::read_to_string(path).map_err(|source| MergeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Document::new(file_name(path), text))
}

/// Reads every discovered file. A file that cannot be read is logged, listed
/// as skipped and left out; the rest are still returned.
fn load_documents(discovery: Discovery, report: &mut MergeReport) -> Vec<Document> {
    report.skipped.extend(discovery.skipped);

    let mut documents = Vec::with_capacity(discovery.files.len());
    for file in discovery.files {
        match read_document(&file.path) {
            Ok(document) => documents.push(document),
            Err(error) => {
                warn!(file = %file.name, "error processing file: {error}");
                report.warnings.push(
                    MergeWarning::new(WarningCode::FileSkipped, error.to_string())
                        .with_source(file.name.as_str()),
                );
                report.skipped.push(file.name);
            }
        }
    }
    documents
}

fn join_with(
    extractor: &TableExtractor,
    base: &Document,
    auxiliaries: &[Document],
    options: &MergeOptions,
    report: &mut MergeReport,
) -> Result<String, MergeError> {
    let base_sections = split_document(&base.text);
    let base_table = extractor
        .first_table(base_sections.before)
        .ok_or_else(|| MergeError::NoTableFound(base.name.clone()))?;

    let mut trailing = Vec::new();
    if let Some(text) = base_sections.trailing() {
        trailing.push(TrailingSection {
            source: &base.name,
            text,
        });
    }
    report.sources.push(base.name.clone());

    if auxiliaries.is_empty() {
        info!("no auxiliary files found to merge");
        report.warnings.push(MergeWarning::new(
            WarningCode::NoAuxiliaryFiles,
            "no auxiliary files found to merge; base table written unchanged",
        ));
    }

    let mut tables = Vec::with_capacity(auxiliaries.len());
    for document in auxiliaries {
        let sections = split_document(&document.text);
        if let Some(table) = extractor.first_table(sections.before) {
            info!(file = %document.name, rows = table.rows.len(), "loaded table");
            tables.push(table);
            report.sources.push(document.name.clone());
        } else {
            report.warnings.push(
                MergeWarning::new(WarningCode::NoTableInFile, "no table found; rows not merged")
                    .with_source(document.name.as_str()),
            );
        }
        if let Some(text) = sections.trailing() {
            trailing.push(TrailingSection {
                source: &document.name,
                text,
            });
        }
    }

    let merged = merge_by_identifier(&base_table, &tables);
    report.row_count = merged.rows.len();
    report.column_count = merged.column_count();
    report.table_count = tables.len() + 1;

    Ok(render_document(
        Some(&merged),
        &trailing,
        options.include_source_annotations,
    ))
}

fn accumulate_with(
    extractor: &TableExtractor,
    documents: &[Document],
    options: &MergeOptions,
    report: &mut MergeReport,
) -> String {
    let mut tables = Vec::new();
    let mut origins: Vec<&str> = Vec::new();
    let mut trailing = Vec::new();

    for document in documents {
        let sections = split_document(&document.text);
        let before = tables.len();
        for table in extractor.extract(sections.before) {
            tables.push(table);
            origins.push(&document.name);
        }
        if tables.len() == before {
            report.warnings.push(
                MergeWarning::new(WarningCode::NoTableInFile, "no table found")
                    .with_source(document.name.as_str()),
            );
        } else {
            info!(file = %document.name, tables = tables.len() - before, "loaded tables");
        }
        if let Some(text) = sections.trailing() {
            trailing.push(TrailingSection {
                source: &document.name,
                text,
            });
        }
    }

    let Accumulated { table, warnings } = accumulate(&tables);
    let mut rejected = BTreeSet::new();
    for warning in warnings {
        let origin = warning.table_index.and_then(|index| origins.get(index).copied());
        if let Some(index) = warning.table_index {
            rejected.insert(index);
        }
        warn!(file = origin.unwrap_or("?"), "{}", warning.message);
        report.warnings.push(match origin {
            Some(origin) => warning.with_source(origin),
            None => warning,
        });
    }

    for (index, origin) in origins.iter().enumerate() {
        let contributed = !rejected.contains(&index) && tables[index].has_headers();
        if contributed && !report.sources.iter().any(|source| source == origin) {
            report.sources.push((*origin).to_string());
        }
    }

    report.row_count = table.rows.len();
    report.column_count = table.column_count();
    report.table_count = tables.len() - rejected.len();

    if table.has_headers() {
        render_document(Some(&table), &trailing, options.include_source_annotations)
    } else {
        report.warnings.push(MergeWarning::new(
            WarningCode::NoTablesDetected,
            "no tables were found to accumulate",
        ));
        render_document(None, &trailing, options.include_source_annotations)
    }
}

/// Left-joins the first table of every auxiliary document into the first
/// table of `base`, returning the rendered output document.
pub fn join_documents(
    base: &Document,
    auxiliaries: &[Document],
    options: &MergeOptions,
) -> Result<(String, MergeReport), MergeError> {
    let mut report = MergeReport::default();
    let content = join_with(
        &TableExtractor::new(),
        base,
        auxiliaries,
        options,
        &mut report,
    )?;
    Ok((content, report))
}

/// Accumulates every schema-compatible table across `documents`.
#[must_use]
pub fn accumulate_documents(
    documents: &[Document],
    options: &MergeOptions,
) -> (String, MergeReport) {
    let mut report = MergeReport::default();
    let content = accumulate_with(&TableExtractor::new(), documents, options, &mut report);
    (content, report)
}

/// Join mode: merges auxiliary files found next to `input` into its table and
/// writes the result to `output`.
pub fn join_files(
    input: &Path,
    output: &Path,
    options: &MergeOptions,
) -> Result<MergeReport, MergeError> {
    let input_path = options.resolve(input);
    if !input_path.is_file() {
        return Err(MergeError::InputNotFound(input_path));
    }
    let output_path = options.resolve(output);
    let base = read_document(&input_path)?;

    let input_name = file_name(&input_path);
    let output_name = file_name(&output_path);
    let discovery = discover(
        &options.directory,
        &[input_name.as_str(), output_name.as_str()],
        options.auxiliary_match_rule,
        OrderPolicy::UnkeyedFirst,
    )?;

    let mut report = MergeReport::default();
    let auxiliaries = load_documents(discovery, &mut report);
    let content = join_with(
        &TableExtractor::new(),
        &base,
        &auxiliaries,
        options,
        &mut report,
    )?;

    write_markdown(&output_path, &content)?;
    info!(
        output = %output_path.display(),
        rows = report.row_count,
        columns = report.column_count,
        "wrote merged table"
    );
    Ok(report)
}

/// Accumulate mode: gathers every numbered `*.md` file in the directory and
/// concatenates their compatible tables into `output`.
pub fn accumulate_files(output: &Path, options: &MergeOptions) -> Result<MergeReport, MergeError> {
    let output_path = options.resolve(output);
    let output_name = file_name(&output_path);
    let discovery = discover(
        &options.directory,
        &[output_name.as_str()],
        AuxiliaryMatchRule::NumericSuffixOnly,
        OrderPolicy::ExcludeUnkeyed,
    )?;

    let mut report = MergeReport::default();
    let documents = load_documents(discovery, &mut report);
    let content = accumulate_with(&TableExtractor::new(), &documents, options, &mut report);

    write_markdown(&output_path, &content)?;
    info!(
        output = %output_path.display(),
        rows = report.row_count,
        tables = report.table_count,
        "wrote accumulated table"
    );
    Ok(report)
}
