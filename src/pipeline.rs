//! Sync pipeline: fetch → deduplicate → normalize → emit.
//!
//! Fetch failures abort the run before anything is written. Emission
//! failures are per article and only show up in the report.

use crate::article::{normalize_all, Article};
use crate::catalog::{build_catalog, write_catalog_csv, write_snapshot};
use crate::config::Config;
use crate::dedup::deduplicate;
use crate::emit::{EmitReport, Emitter};
use crate::error::Result;
use crate::openalex::{OpenAlexClient, RawWork};
use chrono::Local;
use tracing::info;

/// Outcome of a page sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Works returned by the API
    pub fetched: usize,
    /// Works left after duplicate collapsing
    pub unique: usize,
    pub emit: EmitReport,
}

/// Outcome of a catalog export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub fetched: usize,
    pub rows: usize,
}

/// Fetch the configured author's works and collapse duplicates.
pub async fn fetch_canonical_works(config: &Config) -> Result<(usize, Vec<RawWork>)> {
    config.validate()?;
    let query = config.author_query()?;

    let client = OpenAlexClient::new(&config.openalex.base_url, config.openalex.mailto.clone())?;
    let works = client
        .fetch_works(&query, config.openalex.per_page, &config.filters)
        .await?;

    let fetched = works.len();
    let canonical = deduplicate(works);
    info!(fetched = fetched, unique = canonical.len(), "Collapsed duplicate works");
    Ok((fetched, canonical))
}

/// Normalize canonical works with today's date as the last date fallback.
pub fn to_articles(works: &[RawWork]) -> Vec<Article> {
    normalize_all(works, Local::now().date_naive())
}

/// Fetch, deduplicate and write one page per article.
pub async fn sync_articles(config: &Config) -> Result<SyncReport> {
    let (fetched, works) = fetch_canonical_works(config).await?;
    let articles = to_articles(&works);

    let emitter = Emitter::new(&config.output.articles_dir).with_pause(config.output.emit_pause());
    let emit = emitter.emit_all(&articles).await;

    Ok(SyncReport {
        fetched,
        unique: articles.len(),
        emit,
    })
}

/// Fetch, deduplicate and write the CSV catalog plus JSON snapshot.
pub async fn export_catalog(config: &Config) -> Result<ExportReport> {
    let (fetched, works) = fetch_canonical_works(config).await?;

    let rows = build_catalog(&works);
    write_catalog_csv(&config.output.catalog_csv, &rows)?;
    write_snapshot(&config.output.snapshot_json, &to_articles(&works))?;

    Ok(ExportReport {
        fetched,
        rows: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_articles_keeps_slugs_unique() {
        let works: Vec<RawWork> = serde_json::from_value(json!([
            {"id": "https://openalex.org/W1", "title": "Repeat Victimization", "publication_year": 2019},
            {"id": "https://openalex.org/W2", "title": "Repeat victimization", "publication_year": 2021},
            {"id": "https://openalex.org/W3", "title": "!!!", "publication_year": 2022}
        ]))
        .expect("valid works");

        let articles = to_articles(&works);
        let slugs: Vec<&str> = articles.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, ["repeat-victimization", "W2", "W3"]);
        assert_eq!(articles[0].date, "2019-01-01");
    }
}
