//! Configuration loading from TOML files.
//!
//! Every field has a default, so an absent or partial file is fine.
//! Command-line flags are applied on top by the binary.

use crate::error::{PubsyncError, Result};
use crate::openalex::{AuthorQuery, WorkFilters, MAX_PER_PAGE, OPENALEX_API_BASE};
use crate::scholar::DEFAULT_SCHOLAR_URL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// File name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "pubsync.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub author: AuthorConfig,
    pub openalex: OpenAlexConfig,
    pub filters: WorkFilters,
    pub output: OutputConfig,
    pub scholar: ScholarConfig,
}

/// Whose publications to sync: set exactly one of the two.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorConfig {
    pub orcid: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAlexConfig {
    pub base_url: String,
    /// Contact address for the polite pool
    pub mailto: Option<String>,
    pub per_page: usize,
}

impl Default for OpenAlexConfig {
    fn default() -> Self {
        Self {
            base_url: OPENALEX_API_BASE.to_string(),
            mailto: None,
            per_page: MAX_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub articles_dir: PathBuf,
    pub catalog_csv: PathBuf,
    pub snapshot_json: PathBuf,
    pub emit_pause_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            articles_dir: PathBuf::from("articles"),
            catalog_csv: PathBuf::from("data/publications.csv"),
            snapshot_json: PathBuf::from("data/publications.json"),
            emit_pause_ms: 100,
        }
    }
}

impl OutputConfig {
    pub fn emit_pause(&self) -> Duration {
        Duration::from_millis(self.emit_pause_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScholarConfig {
    pub base_url: String,
    pub user_id: Option<String>,
    pub stats_yaml: PathBuf,
}

impl Default for ScholarConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SCHOLAR_URL.to_string(),
            user_id: None,
            stats_yaml: PathBuf::from("data/scholar_stats.yml"),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Search order:
    /// 1. `explicit`, when given (must exist)
    /// 2. `./pubsync.toml`
    /// 3. `<config dir>/pubsync/config.toml`
    ///
    /// Falls back to defaults when no file is found.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pubsync").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PubsyncError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            PubsyncError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.openalex.per_page == 0 {
            return Err(PubsyncError::Config("openalex.per_page must be at least 1".to_string()));
        }
        if self.openalex.base_url.trim().is_empty() {
            return Err(PubsyncError::Config("openalex.base_url is empty".to_string()));
        }
        Ok(())
    }

    /// Author query from the `[author]` table.
    pub fn author_query(&self) -> Result<AuthorQuery> {
        AuthorQuery::from_parts(self.author.orcid.as_deref(), self.author.name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.openalex.base_url, OPENALEX_API_BASE);
        assert_eq!(config.openalex.per_page, 200);
        assert_eq!(config.output.articles_dir, PathBuf::from("articles"));
        assert_eq!(config.scholar.stats_yaml, PathBuf::from("data/scholar_stats.yml"));
        assert!(config.validate().is_ok());
        assert!(matches!(config.author_query(), Err(PubsyncError::InvalidQuery(_))));
    }

    #[test]
    fn test_parse_config_toml() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("pubsync.toml");
        std::fs::write(
            &path,
            r#"
[author]
orcid = "0000-0002-1825-0097"

[openalex]
mailto = "site@example.org"
per_page = 50

[filters]
min_year = 2015
exclude_types = ["paratext", "erratum"]

[output]
articles_dir = "content/articles"
emit_pause_ms = 0
"#,
        )?;

        let config = Config::load(Some(path.as_path()))?;
        assert_eq!(config.openalex.mailto.as_deref(), Some("site@example.org"));
        assert_eq!(config.openalex.per_page, 50);
        assert_eq!(config.openalex.base_url, OPENALEX_API_BASE);
        assert_eq!(config.filters.min_year, Some(2015));
        assert_eq!(config.filters.exclude_types, ["paratext", "erratum"]);
        assert!(!config.filters.open_access_only);
        assert_eq!(config.output.articles_dir, PathBuf::from("content/articles"));
        assert_eq!(config.output.emit_pause(), Duration::ZERO);
        assert_eq!(
            config.author_query()?,
            AuthorQuery::Orcid("0000-0002-1825-0097".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/pubsync.toml"))).expect_err("missing");
        assert!(matches!(err, PubsyncError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.openalex.per_page = 0;
        assert!(matches!(config.validate(), Err(PubsyncError::Config(_))));
    }
}
