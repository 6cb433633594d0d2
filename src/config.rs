//! TOML configuration.
//!
//! Every component receives its settings explicitly from a [`Config`]; there
//! is no process-wide backend URL. All sections are optional and fall back
//! to the defaults below.
//!
//! ```toml
//! [backend]
//! url = "http://localhost:9200"
//! index = "weblate"
//! doc_type = "translations"
//! timeout_secs = 20
//!
//! [import]
//! batch_size = 1000
//! langmap = { en_US = "en" }
//!
//! [retrieval]
//! min_similarity = 0.0
//! service_name = "Elasticsearch"
//!
//! [languages]
//! extra = ["tlh"]
//! ```

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Largest number of documents the backend accepts in one bulk request.
pub const MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub languages: LanguagesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_index")]
    pub index: String,
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            index: default_index(),
            doc_type: default_doc_type(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}
fn default_index() -> String {
    "weblate".to_string()
}
fn default_doc_type() -> String {
    "translations".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Language overrides applied during TMX import (`raw -> replacement`).
    #[serde(default)]
    pub langmap: HashMap<String, String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            langmap: HashMap::new(),
        }
    }
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Matches scoring below this similarity are dropped from lookups.
    #[serde(default)]
    pub min_similarity: f64,
    /// Prefix of every match label, e.g. `"Elasticsearch (translations)"`.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.0,
            service_name: default_service_name(),
        }
    }
}

fn default_service_name() -> String {
    "Elasticsearch".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LanguagesConfig {
    /// Base language codes accepted in addition to the built-in registry.
    #[serde(default)]
    pub extra: Vec<String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate backend
    if config.backend.url.trim().is_empty() {
        bail!("backend.url must not be empty");
    }
    Url::parse(&config.backend.url)
        .with_context(|| format!("backend.url is not a valid URL: '{}'", config.backend.url))?;
    if config.backend.index.trim().is_empty() {
        bail!("backend.index must not be empty");
    }
    if config.backend.doc_type.trim().is_empty() {
        bail!("backend.doc_type must not be empty");
    }
    if config.backend.timeout_secs == 0 {
        bail!("backend.timeout_secs must be > 0");
    }

    // Validate import
    if !(1..=MAX_BATCH_SIZE).contains(&config.import.batch_size) {
        bail!("import.batch_size must be in [1, {}]", MAX_BATCH_SIZE);
    }

    // Validate retrieval
    if !(0.0..=100.0).contains(&config.retrieval.min_similarity) {
        bail!("retrieval.min_similarity must be in [0.0, 100.0]");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.backend.url, "http://localhost:9200");
        assert_eq!(config.backend.index, "weblate");
        assert_eq!(config.backend.doc_type, "translations");
        assert_eq!(config.backend.timeout_secs, 20);
        assert_eq!(config.import.batch_size, 1000);
        assert!(config.import.langmap.is_empty());
        assert_eq!(config.retrieval.service_name, "Elasticsearch");
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
[backend]
url = "http://es.internal:9200/"
index = "memory"
timeout_secs = 5

[import]
batch_size = 250
langmap = { en_US = "en", pt-br = "pt_BR" }

[retrieval]
min_similarity = 30.0

[languages]
extra = ["tlh"]
"#,
        )
        .unwrap();
        assert_eq!(config.backend.index, "memory");
        assert_eq!(config.backend.doc_type, "translations");
        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.import.batch_size, 250);
        assert_eq!(config.import.langmap.get("pt-br").unwrap(), "pt_BR");
        assert_eq!(config.retrieval.min_similarity, 30.0);
        assert_eq!(config.languages.extra, vec!["tlh".to_string()]);
    }

    #[test]
    fn test_batch_size_above_bulk_limit_rejected() {
        let err = parse_config("[import]\nbatch_size = 1001\n").unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(parse_config("[backend]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(parse_config("[backend]\nurl = \"localhost\"\n").is_err());
        assert!(parse_config("[backend]\nurl = \"\"\n").is_err());
    }

    #[test]
    fn test_min_similarity_range() {
        assert!(parse_config("[retrieval]\nmin_similarity = 101.0\n").is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let config = parse_config(include_str!("../config/tm.example.toml")).unwrap();
        assert_eq!(config.import.langmap.get("en_US").unwrap(), "en");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/tm.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
