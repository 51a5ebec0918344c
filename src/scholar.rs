//! Google Scholar profile statistics.
//!
//! Scrapes the citation summary of a public Scholar profile (citations,
//! h-index, i10-index, name, affiliation, interests) and stores it as a
//! YAML data file the site templates can include.

use crate::error::{PubsyncError, Result};
use chrono::Local;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// User agent string for requests
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Placeholder for a metric the profile does not show
const NOT_AVAILABLE: &str = "N/A";

/// Citation summary of one Scholar profile.
///
/// Field order is the key order of the saved YAML. The recent-window keys
/// keep their `*_since_2019` names, which site templates read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScholarStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations_all: Option<String>,
    #[serde(rename = "citations_since_2019", skip_serializing_if = "Option::is_none")]
    pub citations_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_index_all: Option<String>,
    #[serde(rename = "h_index_since_2019", skip_serializing_if = "Option::is_none")]
    pub h_index_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i10_index_all: Option<String>,
    #[serde(rename = "i10_index_since_2019", skip_serializing_if = "Option::is_none")]
    pub i10_index_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub interests: Vec<String>,
    pub profile_url: String,
    pub last_updated: String,
}

impl ScholarStats {
    /// Save as YAML, creating parent directories.
    pub fn save_yaml(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        info!(path = ?path, "Saved Google Scholar stats");
        Ok(())
    }
}

/// Build the profile URL for `user_id`.
pub fn profile_url(base_url: &str, user_id: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/citations", base_url.trim_end_matches('/')))
        .map_err(|e| PubsyncError::Config(format!("Invalid base URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("user", user_id)
        .append_pair("hl", "en");

    Ok(url)
}

/// Fetch and parse a Scholar profile.
///
/// # Errors
///
/// `Fetch` on a non-success status, `Network` on transport failure.
pub async fn fetch_profile_stats(base_url: &str, user_id: &str) -> Result<ScholarStats> {
    let url = profile_url(base_url, user_id)?;
    info!(user = user_id, "Fetching Google Scholar profile");

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| PubsyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

    let response = client
        .get(url.as_str())
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(PubsyncError::Fetch {
            status: status.as_u16(),
        });
    }

    let html = response.text().await?;
    let mut stats = parse_profile(&html)?;
    stats.profile_url = url.to_string();
    stats.last_updated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    Ok(stats)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PubsyncError::Parse(e.to_string()))
}

fn element_text(elem: ElementRef<'_>) -> String {
    elem.text().collect::<String>().trim().to_string()
}

/// Parse the citation table and profile header of a Scholar page.
///
/// A page without the citation table still yields the profile header,
/// with every metric left unset. `profile_url` and `last_updated` are left
/// empty for the caller.
pub fn parse_profile(html: &str) -> Result<ScholarStats> {
    let document = Html::parse_document(html);

    let table_selector = selector("table#gsc_rsb_st")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;
    let name_selector = selector("div#gsc_prf_in")?;
    let affiliation_selector = selector("div.gsc_prf_il")?;
    let interest_selector = selector("div#gsc_prf_int a.gsc_prf_inta")?;

    let mut stats = ScholarStats::default();

    match document.select(&table_selector).next() {
        // Row 0 is the header; rows 1..=3 are citations, h-index, i10-index.
        Some(table) => {
            let rows: Vec<ElementRef<'_>> = table.select(&row_selector).collect();
            for (idx, row) in rows.iter().enumerate().skip(1).take(3) {
                let cells: Vec<String> = row.select(&cell_selector).map(element_text).collect();
                if cells.len() < 2 {
                    continue;
                }
                let all = Some(cells[1].clone());
                let since = Some(
                    cells
                        .get(2)
                        .cloned()
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                );
                match idx {
                    1 => (stats.citations_all, stats.citations_since) = (all, since),
                    2 => (stats.h_index_all, stats.h_index_since) = (all, since),
                    _ => (stats.i10_index_all, stats.i10_index_since) = (all, since),
                }
            }
        }
        None => warn!("Citation table not found on Scholar profile"),
    }

    stats.name = document.select(&name_selector).next().map(element_text);
    stats.affiliation = document
        .select(&affiliation_selector)
        .next()
        .map(element_text);
    stats.interests = document
        .select(&interest_selector)
        .map(element_text)
        .collect();

    debug!(stats = ?stats, "Parsed Scholar profile");
    Ok(stats)
}
