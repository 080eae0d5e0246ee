use std::collections::HashMap;

use crate::model::{Row, Table, identifier};
use crate::warning::{MergeWarning, WarningCode};

/// Left-joins `auxiliaries` into `base` on the first column.
///
/// Auxiliary rows are indexed in order, so a later table wins when two tables
/// share an identifier. Columns come from the first auxiliary table that has
/// headers; the other auxiliary schemas are assumed to line up with it.
#[must_use]
pub fn merge_by_identifier(base: &Table, auxiliaries: &[Table]) -> Table {
    let mut index: HashMap<&str, &Row> = HashMap::new();
    for table in auxiliaries {
        for row in &table.rows {
            if let Some(id) = identifier(row) {
                index.insert(id, row);
            }
        }
    }

    let template = auxiliaries
        .iter()
        .find(|table| table.has_headers())
        .map_or(&[][..], |table| table.headers.as_slice());
    let extra_columns = template.len().saturating_sub(1);

    let mut headers = base.headers.clone();
    headers.extend(template.iter().skip(1).cloned());

    // Short base rows are padded to the base header width first so appended
    // cells land under the auxiliary headers. A row with no cells has no
    // identifier and only gets placeholders.
    let base_width = base.headers.len();
    let rows = base
        .rows
        .iter()
        .map(|row| {
            let mut merged = row.clone();
            if merged.len() < base_width {
                merged.resize(base_width, String::new());
            }
            let width = merged.len() + extra_columns;
            if let Some(matched) = identifier(row).and_then(|id| index.get(id)) {
                merged.extend(matched.iter().skip(1).cloned());
            }
            if merged.len() < width {
                merged.resize(width, String::new());
            }
            merged
        })
        .collect();

    Table::new(headers, rows)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulated {
    pub table: Table,
    pub warnings: Vec<MergeWarning>,
}

/// Concatenates the rows of schema-identical tables.
///
/// The first table with headers fixes the schema. A later table with different
/// headers contributes nothing and is reported by its position in `tables`.
#[must_use]
pub fn accumulate(tables: &[Table]) -> Accumulated {
    let mut warnings = Vec::new();
    let mut schema: Option<&[String]> = None;
    let mut rows = Vec::new();

    for (position, table) in tables.iter().enumerate() {
        if !table.has_headers() {
            continue;
        }
        match schema {
            None => schema = Some(table.headers.as_slice()),
            Some(headers) if headers != table.headers.as_slice() => {
                warnings.push(
                    MergeWarning::new(
                        WarningCode::SchemaMismatch,
                        format!(
                            "table headers [{}] do not match [{}]; rows skipped",
                            table.headers.join(", "),
                            headers.join(", ")
                        ),
                    )
                    .with_table_index(position),
                );
                continue;
            }
            Some(_) => {}
        }
        rows.extend(table.rows.iter().cloned());
    }

    Accumulated {
        table: Table::new(schema.map(<[String]>::to_vec).unwrap_or_default(), rows),
        warnings,
    }
}
