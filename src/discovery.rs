use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::MergeError;
use crate::model::SourceFile;
use crate::options::AuxiliaryMatchRule;

pub const RESULT_MARKER: &str = "test_result";

static NUMERIC_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([0-9]+)_([0-9]+)\.md$").expect("suffix regex is valid"));

/// What to do with accepted files whose name carries no `_<N>_<M>.md` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPolicy {
    /// Drop them (accumulate mode).
    ExcludeUnkeyed,
    /// Keep them with key 0, ahead of every numbered file (join mode).
    UnkeyedFirst,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub files: Vec<SourceFile>,
    pub skipped: Vec<String>,
}

/// Start number `N` of a `…_<N>_<M>.md` file name. A name that matches but
/// whose `N` does not fit in a `u64` gets key 0.
#[must_use]
pub fn sort_key(file_name: &str) -> Option<u64> {
    NUMERIC_SUFFIX_RE
        .captures(file_name)
        .map(|captures| captures[1].parse().unwrap_or(0))
}

fn matches_rule(file: &SourceFile, rule: AuxiliaryMatchRule) -> bool {
    let marked = file.name.contains(RESULT_MARKER);
    let numbered = file.sort_key.is_some();
    match rule {
        AuxiliaryMatchRule::SubstringMarker => marked,
        AuxiliaryMatchRule::NumericSuffixOnly => numbered,
        AuxiliaryMatchRule::Either => marked || numbered,
    }
}

/// Lists the `*.md` regular files directly inside `directory`, sorted by name.
pub fn list_markdown_files(
    directory: &Path,
    exclude: &[&str],
) -> Result<Vec<SourceFile>, MergeError> {
    let list_error = |source| MergeError::ListDirectory {
        path: directory.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        if !entry.file_type().map_err(list_error)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".md") || exclude.contains(&name.as_str()) {
            continue;
        }
        files.push(SourceFile {
            path: entry.path(),
            sort_key: sort_key(&name),
            name,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Selects candidate sources from `files` and orders them by ascending sort
/// key. Ties keep name order.
#[must_use]
pub fn select_sources(
    files: Vec<SourceFile>,
    rule: AuxiliaryMatchRule,
    policy: OrderPolicy,
) -> Discovery {
    let mut discovery = Discovery::default();
    for file in files {
        let accepted = matches_rule(&file, rule)
            && (policy == OrderPolicy::UnkeyedFirst || file.sort_key.is_some());
        if accepted {
            debug!(file = %file.name, sort_key = ?file.sort_key, "selected source file");
            discovery.files.push(file);
        } else {
            discovery.skipped.push(file.name);
        }
    }

    discovery
        .files
        .sort_by_key(|file| file.sort_key.unwrap_or(0));

    if !discovery.skipped.is_empty() {
        info!(
            skipped = %discovery.skipped.join(", "),
            "skipping files that do not follow the naming convention"
        );
    }
    discovery
}

pub fn discover(
    directory: &Path,
    exclude: &[&str],
    rule: AuxiliaryMatchRule,
    policy: OrderPolicy,
) -> Result<Discovery, MergeError> {
    let files = list_markdown_files(directory, exclude)?;
    Ok(select_sources(files, rule, policy))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::{OrderPolicy, select_sources, sort_key};
    use crate::model::SourceFile;
    use crate::options::AuxiliaryMatchRule;

    fn file(name: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(name),
            name: name.to_string(),
            sort_key: sort_key(name),
        }
    }

    fn names(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|file| file.name.as_str()).collect()
    }

    #[test]
    fn extracts_start_number() {
        assert_eq!(sort_key("report_10_20.md"), Some(10));
        assert_eq!(sort_key("a_b_3_4.md"), Some(3));
        assert_eq!(sort_key("report_10.md"), None);
        assert_eq!(sort_key("report_1_2.txt"), None);
    }

    #[test]
    fn only_ascii_digits_form_a_key() {
        assert_eq!(sort_key("report_\u{0663}_\u{0664}.md"), None);
        assert_eq!(sort_key("report_99999999999999999999999_1.md"), Some(0));
    }

    #[test]
    fn overflowing_key_sorts_first_in_join_mode() {
        let files = vec![file("run_2_3.md"), file("run_99999999999999999999999_1.md")];
        let discovery =
            select_sources(files, AuxiliaryMatchRule::NumericSuffixOnly, OrderPolicy::UnkeyedFirst);
        assert_eq!(
            names(&discovery.files),
            vec!["run_99999999999999999999999_1.md", "run_2_3.md"]
        );
        assert!(discovery.skipped.is_empty());
    }

    #[test]
    fn join_mode_keeps_marked_files_first() {
        let files = vec![
            file("run_21_40.md"),
            file("run_1_20.md"),
            file("test_result.md"),
            file("notes.md"),
        ];
        let discovery =
            select_sources(files, AuxiliaryMatchRule::Either, OrderPolicy::UnkeyedFirst);
        assert_eq!(
            names(&discovery.files),
            vec!["test_result.md", "run_1_20.md", "run_21_40.md"]
        );
        assert_eq!(discovery.skipped, vec!["notes.md"]);
    }

    #[test]
    fn accumulate_mode_excludes_unnumbered_files() {
        let files = vec![file("test_result.md"), file("part_5_9.md"), file("part_2_4.md")];
        let discovery =
            select_sources(files, AuxiliaryMatchRule::Either, OrderPolicy::ExcludeUnkeyed);
        assert_eq!(names(&discovery.files), vec!["part_2_4.md", "part_5_9.md"]);
        assert_eq!(discovery.skipped, vec!["test_result.md"]);
    }

    #[test]
    fn substring_rule_ignores_numbering() {
        let files = vec![file("test_result_3_4.md"), file("other_1_2.md")];
        let discovery = select_sources(
            files,
            AuxiliaryMatchRule::SubstringMarker,
            OrderPolicy::UnkeyedFirst,
        );
        assert_eq!(names(&discovery.files), vec!["test_result_3_4.md"]);
    }
}
