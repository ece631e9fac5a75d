//! Filtering pipeline configuration

use std::path::PathBuf;

use serde::Deserialize;

/// What is written to `<stem>_rejected.jsonl` for a rejected record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectedFormat {
    /// Original raw record, verbatim
    #[default]
    Raw,
    /// The dumper's JSON line (includes the reason when `dump_reason` is set)
    Dumped,
}

/// Character class measured by the character-ratio filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    /// Not alphanumeric, whitespace or ordinary punctuation
    #[default]
    Symbol,
    /// ASCII letters
    Latin,
    /// Numeric characters
    Digit,
}

/// Stage that can only be switched on or off
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    pub enabled: bool,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BbsConfig {
    pub enabled: bool,
    /// Reject when the BBS pattern matches more than this many times
    pub max_allowed_num: usize,
}

impl Default for BbsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_allowed_num: 14,
        }
    }
}

/// Keyword-ratio filter settings.
///
/// `threshold = None` selects the filter's own default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub enabled: bool,
    /// One keyword per line; the compiled-in list is used when unset
    #[serde(deserialize_with = "deserialize_env_path")]
    pub dict_path: Option<PathBuf>,
    pub threshold: Option<f64>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dict_path: None,
            threshold: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LengthConfig {
    pub enabled: bool,
    pub min_doc_len: usize,
    pub max_doc_len: usize,
}

impl Default for LengthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_doc_len: 10,
            max_doc_len: 100_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CharRatioConfig {
    pub enabled: bool,
    pub class: CharClass,
    pub max_ratio: f64,
}

impl Default for CharRatioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            class: CharClass::Symbol,
            max_ratio: 0.3,
        }
    }
}

/// Line segmentation: split → remove one-word → remove date → merge
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SegmentsConfig {
    pub enabled: bool,
    pub remove_one_word: bool,
    pub remove_date: bool,
    /// Joins surviving segments
    pub delimiter: String,
}

impl Default for SegmentsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            remove_one_word: true,
            remove_date: true,
            delimiter: "\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub enabled: bool,
    /// ISO 639-1 or 639-3 code of the language to keep
    pub lang: String,
    /// Leading characters scanned for target-script glyphs
    pub lookup_size: usize,
    /// Minimum identifier confidence
    pub min_score: f64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lang: "ja".to_string(),
            lookup_size: 50,
            min_score: 0.9,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DumperConfig {
    /// Add `is_rejected` and `reason` to every dumped line
    pub dump_reason: bool,
    /// Carry the loader's other JSON fields into the output
    pub keep_fields: bool,
}

/// Per-stage configuration. Stage order is fixed; stages may only be disabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    /// JSON key holding the document text
    pub text_key: String,
    pub normalizer: ToggleConfig,
    pub bbs: BbsConfig,
    pub ads: KeywordConfig,
    pub discrimination: KeywordConfig,
    pub violence: KeywordConfig,
    pub length: LengthConfig,
    pub adult: KeywordConfig,
    pub char_ratio: CharRatioConfig,
    pub segments: SegmentsConfig,
    pub language: LanguageConfig,
    pub pii: ToggleConfig,
    pub dumper: DumperConfig,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            text_key: "text".to_string(),
            normalizer: ToggleConfig::default(),
            bbs: BbsConfig::default(),
            ads: KeywordConfig::default(),
            discrimination: KeywordConfig::default(),
            violence: KeywordConfig::default(),
            length: LengthConfig::default(),
            adult: KeywordConfig::default(),
            char_ratio: CharRatioConfig::default(),
            segments: SegmentsConfig::default(),
            language: LanguageConfig::default(),
            pii: ToggleConfig::default(),
            dumper: DumperConfig::default(),
        }
    }
}

/// Runtime configuration for a filtering run
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned (non-recursively) for input files
    pub input_dir: PathBuf,
    /// Per-file outputs, checkpoints and run-level results
    pub output_dir: PathBuf,
    /// Files processed in parallel (1 = sequential)
    pub workers: usize,
    /// Gzip the run-level results and stats files
    pub compress_merged: bool,
    pub rejected_format: RejectedFormat,
    pub stages: StagesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            workers: 1,
            compress_merged: false,
            rejected_format: RejectedFormat::Raw,
            stages: StagesConfig::default(),
        }
    }
}

/// Deserialize an optional path that may be an environment variable reference like ${VAR}
fn deserialize_env_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)).map(PathBuf::from))
}

/// Expand ${VAR} to environment variable value
pub(crate) fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.workers, 1);
        assert!(!config.compress_merged);
        assert_eq!(config.rejected_format, RejectedFormat::Raw);
        assert_eq!(config.stages.text_key, "text");
        assert_eq!(config.stages.length.min_doc_len, 10);
        assert_eq!(config.stages.length.max_doc_len, 100_000);
        assert_eq!(config.stages.language.lang, "ja");
        assert_eq!(config.stages.language.lookup_size, 50);
        assert_eq!(config.stages.language.min_score, 0.9);
        assert!(config.stages.adult.threshold.is_none());
        assert_eq!(config.stages.segments.delimiter, "\n");
    }

    #[test]
    fn partial_stage_section_keeps_other_defaults() {
        let json = r#"{
            "text_key": "body",
            "length": {"min_doc_len": 5},
            "adult": {"threshold": 0.05},
            "language": {"enabled": false},
            "char_ratio": {"class": "latin"}
        }"#;
        let stages: StagesConfig = serde_json::from_str(json).unwrap();
        assert_eq!(stages.text_key, "body");
        assert_eq!(stages.length.min_doc_len, 5);
        assert_eq!(stages.length.max_doc_len, 100_000);
        assert_eq!(stages.adult.threshold, Some(0.05));
        assert!(stages.adult.enabled);
        assert!(!stages.language.enabled);
        assert_eq!(stages.language.lang, "ja");
        assert_eq!(stages.char_ratio.class, CharClass::Latin);
        assert!(stages.pii.enabled);
    }

    #[test]
    fn rejected_format_from_str() {
        let f: RejectedFormat = serde_json::from_str("\"dumped\"").unwrap();
        assert_eq!(f, RejectedFormat::Dumped);
    }

    #[test]
    fn dict_path_env_expansion() {
        std::env::set_var("DOCSIFT_TEST_DICT", "/srv/dict/ads.txt");
        let kw: KeywordConfig =
            serde_json::from_str(r#"{"dict_path": "${DOCSIFT_TEST_DICT}"}"#).unwrap();
        assert_eq!(kw.dict_path, Some(PathBuf::from("/srv/dict/ads.txt")));
        std::env::remove_var("DOCSIFT_TEST_DICT");
    }

    #[test]
    fn expand_env_var_literal_and_missing() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_DOCSIFT_1}"), None);
    }
}
