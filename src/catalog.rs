//! Tabular catalog and JSON cache snapshot.
//!
//! The catalog is a flat CSV of canonical works for spreadsheet use and CV
//! tooling; the snapshot is the normalized article list the site's listing
//! pages read.

use crate::article::{strip_doi_prefix, Article};
use crate::error::Result;
use crate::openalex::RawWork;
use serde::Serialize;
use std::cmp::Reverse;
use std::fs;
use std::path::Path;
use tracing::info;

const PUBMED_PREFIX: &str = "https://pubmed.ncbi.nlm.nih.gov/";

/// CSV column order for the catalog
pub const CATALOG_COLUMNS: &[&str] = &[
    "title", "authors", "author_count", "year", "publication_date", "journal", "publisher",
    "type", "is_oa", "doi", "doi_url", "pdf_url", "openalex_id", "pmid", "cited_by_count",
];

/// One catalog line
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogRow {
    pub title: String,
    pub authors: String,
    pub author_count: usize,
    pub year: Option<i32>,
    pub publication_date: String,
    pub journal: String,
    pub publisher: String,
    #[serde(rename = "type")]
    pub work_type: String,
    pub is_oa: bool,
    pub doi: String,
    pub doi_url: String,
    pub pdf_url: String,
    pub openalex_id: String,
    pub pmid: String,
    pub cited_by_count: u64,
}

impl From<&RawWork> for CatalogRow {
    fn from(work: &RawWork) -> Self {
        let doi_url = work.doi().unwrap_or_default();
        let pmid = work
            .ids
            .as_ref()
            .and_then(|ids| ids.pmid.as_deref())
            .map(|p| p.strip_prefix(PUBMED_PREFIX).unwrap_or(p))
            .unwrap_or_default();

        Self {
            title: work.title_or_untitled().to_string(),
            authors: work.author_names().join(", "),
            author_count: work.authorships.len(),
            year: work.publication_year,
            publication_date: work.publication_date.clone().unwrap_or_default(),
            journal: work.venue().to_string(),
            publisher: work.publisher().to_string(),
            work_type: work.work_type().to_string(),
            is_oa: work.is_oa(),
            doi: strip_doi_prefix(doi_url).to_string(),
            doi_url: doi_url.to_string(),
            pdf_url: work.oa_url().to_string(),
            openalex_id: work.id.clone(),
            pmid: pmid.trim_end_matches('/').to_string(),
            cited_by_count: work.citations(),
        }
    }
}

/// Catalog rows, newest first: descending by year, then by publication date.
pub fn build_catalog(works: &[RawWork]) -> Vec<CatalogRow> {
    let mut rows: Vec<CatalogRow> = works.iter().map(CatalogRow::from).collect();
    rows.sort_by_key(|r| Reverse((r.year, r.publication_date.clone())));
    rows
}

/// Write rows to `path` as CSV with a header line.
pub fn write_catalog_csv(path: &Path, rows: &[CatalogRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(CATALOG_COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    info!(path = ?path, rows = rows.len(), "Saved catalog CSV");
    Ok(())
}

/// Write the article list as pretty JSON.
pub fn write_snapshot(path: &Path, articles: &[Article]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(articles)?;
    fs::write(path, content)?;

    info!(path = ?path, articles = articles.len(), "Saved snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn work(value: serde_json::Value) -> RawWork {
        serde_json::from_value(value).expect("valid work")
    }

    #[test]
    fn test_row_from_work() {
        let row = CatalogRow::from(&work(json!({
            "id": "https://openalex.org/W5",
            "title": "Hot Spots",
            "type": "article",
            "doi": "https://doi.org/10.5/hs",
            "publication_year": 2020,
            "publication_date": "2020-02-02",
            "authorships": [{"author": {"display_name": "A"}}, {"author": {"display_name": "B"}}],
            "primary_location": {"source": {"display_name": "J Crim", "host_organization_name": "Springer"}},
            "ids": {"pmid": "https://pubmed.ncbi.nlm.nih.gov/12345"}
        })));

        assert_eq!(row.authors, "A, B");
        assert_eq!(row.author_count, 2);
        assert_eq!(row.journal, "J Crim");
        assert_eq!(row.publisher, "Springer");
        assert_eq!(row.doi, "10.5/hs");
        assert_eq!(row.doi_url, "https://doi.org/10.5/hs");
        assert_eq!(row.pmid, "12345");
        assert_eq!(row.cited_by_count, 0);
    }

    #[test]
    fn test_catalog_sorted_newest_first() {
        let works = vec![
            work(json!({"id": "W1", "publication_year": 2019, "publication_date": "2019-06-01"})),
            work(json!({"id": "W2", "publication_year": 2021, "publication_date": "2021-01-10"})),
            work(json!({"id": "W3", "publication_year": 2021, "publication_date": "2021-09-30"})),
            work(json!({"id": "W4"})),
        ];
        let ids: Vec<String> = build_catalog(&works).into_iter().map(|r| r.openalex_id).collect();
        assert_eq!(ids, ["W3", "W2", "W1", "W4"]);
    }

    #[test]
    fn test_write_catalog_csv_header() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("data/publications.csv");
        let rows = build_catalog(&[work(json!({"id": "W1", "title": "One, Two"}))]);

        write_catalog_csv(&path, &rows)?;

        let content = fs::read_to_string(&path)?;
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(CATALOG_COLUMNS.join(",").as_str()));
        assert!(lines.next().is_some_and(|l| l.starts_with("\"One, Two\",")));
        Ok(())
    }

    #[test]
    fn test_write_snapshot() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("publications.json");
        let articles = vec![Article {
            slug: "a".to_string(),
            cited_by_count: 3,
            ..Default::default()
        }];

        write_snapshot(&path, &articles)?;

        let loaded: Vec<Article> = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(loaded, articles);
        Ok(())
    }
}
