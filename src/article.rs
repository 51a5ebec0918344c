//! Normalized article records.
//!
//! Maps a canonical OpenAlex work into the flat record the site consumes:
//! slug, display fields, identifiers and metrics.

use crate::openalex::RawWork;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::warn;

/// Maximum slug length in characters
pub const MAX_SLUG_LEN: usize = 80;

/// Number of authors listed before "et al."
const MAX_LISTED_AUTHORS: usize = 3;

const DOI_URL_PREFIX: &str = "https://doi.org/";

/// Slug for a work with neither a sluggable title nor an ID
const FALLBACK_SLUG: &str = "untitled";

/// Venue markers that identify a preprint server
const PREPRINT_VENUE_MARKERS: &[&str] = &["crimrxiv", "arxiv", "preprint"];

static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("separator pattern is valid"));

/// One publication as rendered on the site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub doi: String,
    pub url: String,
    pub open_access: bool,
    pub pdf_url: String,
    pub cited_by_count: u64,
    pub publication_venue: String,
    pub openalex_id: String,
    pub work_type: String,
    #[serde(default)]
    pub abstract_text: String,
}

impl Article {
    /// Map a work into an article. The slug is not yet checked for
    /// uniqueness; see [`normalize_all`].
    pub fn from_work(work: &RawWork, today: NaiveDate) -> Self {
        let title = work.title_or_untitled().to_string();
        let slug = match slugify(&title) {
            s if s.is_empty() => non_empty_or_fallback(work.id_segment()),
            s => s,
        };
        let raw_doi = work.doi().unwrap_or_default();

        Self {
            slug,
            author: format_authors(&work.author_names(), work.authorships.len()),
            date: resolve_date(work, today),
            doi: strip_doi_prefix(raw_doi).to_string(),
            url: raw_doi.to_string(),
            open_access: work.is_oa(),
            pdf_url: work.oa_url().to_string(),
            cited_by_count: work.citations(),
            publication_venue: work.venue().to_string(),
            openalex_id: work.id.clone(),
            work_type: work.work_type().to_string(),
            abstract_text: work
                .abstract_inverted_index
                .as_ref()
                .map(reconstruct_abstract)
                .unwrap_or_default(),
            title,
        }
    }

    /// Preprints get a warning callout on their page.
    pub fn is_preprint(&self) -> bool {
        if self.work_type == "posted-content" {
            return true;
        }
        let venue = self.publication_venue.to_lowercase();
        PREPRINT_VENUE_MARKERS.iter().any(|m| venue.contains(m))
    }
}

/// Map canonical works into articles, keeping slugs unique within the run.
///
/// A slug already taken falls back to the work's trailing OpenAlex ID
/// segment, then to a numeric suffix. Slugs are never empty.
pub fn normalize_all(works: &[RawWork], today: NaiveDate) -> Vec<Article> {
    let mut taken: HashSet<String> = HashSet::new();

    works
        .iter()
        .map(|work| {
            let mut article = Article::from_work(work, today);
            if taken.contains(&article.slug) {
                let fallback = non_empty_or_fallback(work.id_segment());
                warn!(slug = %article.slug, fallback = %fallback, "Slug collision");
                article.slug = fallback;
            }
            // IDs are unique per record, so this only triggers on empty IDs.
            let base = article.slug.clone();
            let mut n = 2;
            while taken.contains(&article.slug) {
                article.slug = format!("{}-{}", base, n);
                n += 1;
            }
            taken.insert(article.slug.clone());
            article
        })
        .collect()
}

fn non_empty_or_fallback(slug: &str) -> String {
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// URL-safe slug: lower-case, keep letters, digits and hyphens, collapse
/// whitespace/hyphen runs into one hyphen, cap at [`MAX_SLUG_LEN`].
pub fn slugify(title: &str) -> String {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    let collapsed = SEPARATOR_RUNS.replace_all(&cleaned, "-");
    let truncated: String = collapsed
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_LEN)
        .collect();
    truncated.trim_end_matches('-').to_string()
}

/// First three names joined with ", ", plus " et al." when `total`
/// exceeds three.
pub fn format_authors(names: &[&str], total: usize) -> String {
    let mut author = names
        .iter()
        .take(MAX_LISTED_AUTHORS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if total > MAX_LISTED_AUTHORS {
        author.push_str(" et al.");
    }
    author
}

pub fn strip_doi_prefix(doi: &str) -> &str {
    doi.strip_prefix(DOI_URL_PREFIX).unwrap_or(doi)
}

/// Publication date with fallbacks, in priority order: the full date,
/// January 1st of the publication year, then `today`.
pub fn resolve_date(work: &RawWork, today: NaiveDate) -> String {
    let fallbacks: [&dyn Fn() -> Option<String>; 3] = [
        &|| {
            work.publication_date
                .as_ref()
                .filter(|d| !d.trim().is_empty())
                .cloned()
        },
        &|| work.publication_year.map(|y| format!("{:04}-01-01", y)),
        &|| Some(today.format("%Y-%m-%d").to_string()),
    ];

    fallbacks.iter().find_map(|f| f()).unwrap_or_default()
}

/// Rebuild abstract text from an OpenAlex inverted index.
///
/// Words sharing a position keep their index iteration order.
pub fn reconstruct_abstract(inverted_index: &serde_json::Map<String, serde_json::Value>) -> String {
    let mut words: Vec<(u64, &str)> = Vec::new();

    for (word, positions) in inverted_index {
        if let Some(pos_array) = positions.as_array() {
            for pos in pos_array {
                if let Some(p) = pos.as_u64() {
                    words.push((p, word.as_str()));
                }
            }
        }
    }

    // sort_by_key is stable
    words.sort_by_key(|(pos, _)| *pos);
    words.iter().map(|(_, w)| *w).collect::<Vec<_>>().join(" ")
}
