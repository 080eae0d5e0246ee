use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_OUTPUT_FILE: &str = "output.md";

/// Which directory entries count as auxiliary sources in join mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxiliaryMatchRule {
    /// File name contains `test_result`.
    SubstringMarker,
    /// File name ends in `_<digits>_<digits>.md`.
    NumericSuffixOnly,
    Either,
}

impl FromStr for AuxiliaryMatchRule {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        match spec.trim().to_ascii_lowercase().as_str() {
            "substring" | "marker" => Ok(Self::SubstringMarker),
            "numeric" | "suffix" => Ok(Self::NumericSuffixOnly),
            "either" | "any" => Ok(Self::Either),
            other => Err(format!(
                "unknown match rule '{other}', expected substring, numeric or either"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Directory scanned for sources; relative input/output paths resolve here.
    pub directory: PathBuf,
    pub include_source_annotations: bool,
    pub auxiliary_match_rule: AuxiliaryMatchRule,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            include_source_annotations: false,
            auxiliary_match_rule: AuxiliaryMatchRule::Either,
        }
    }
}

impl MergeOptions {
    #[must_use]
    pub fn resolve(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.directory.join(path)
        }
    }
}
