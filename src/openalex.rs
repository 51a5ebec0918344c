//! OpenAlex works API client.
//!
//! Issues a single filtered `GET /works` for one author and returns the raw
//! work records of the first page. There is no pagination and no retry: a
//! transport failure or non-success status aborts the caller's run.
//!
//! API notes (per OpenAlex docs):
//! - `mailto` puts requests in the polite pool
//! - `per-page` is capped at 200

use crate::error::{PubsyncError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// OpenAlex API base URL
pub const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// Maximum results per page (OpenAlex limit)
pub const MAX_PER_PAGE: usize = 200;

/// Request timeout for the works query
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefixes accepted in front of a bare ORCID
const ORCID_PREFIXES: &[&str] = &["https://orcid.org/", "http://orcid.org/", "orcid.org/"];

/// One work record as returned by `/works`.
///
/// Only the fields the pipeline reads are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWork {
    #[serde(default)]
    pub id: String,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub work_type: Option<String>,
    pub doi: Option<String>,
    pub publication_date: Option<String>,
    pub publication_year: Option<i32>,
    pub cited_by_count: Option<u64>,
    #[serde(default)]
    pub authorships: Vec<Authorship>,
    pub open_access: Option<OpenAccess>,
    pub primary_location: Option<Location>,
    pub abstract_inverted_index: Option<serde_json::Map<String, serde_json::Value>>,
    pub ids: Option<WorkIds>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authorship {
    pub author: Option<Author>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenAccess {
    #[serde(default)]
    pub is_oa: bool,
    pub oa_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub source: Option<Source>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub display_name: Option<String>,
    pub host_organization_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkIds {
    pub pmid: Option<String>,
}

impl RawWork {
    /// Title used for grouping and display.
    pub fn title_or_untitled(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    pub fn work_type(&self) -> &str {
        self.work_type.as_deref().unwrap_or_default()
    }

    /// Raw DOI, treating an empty string as absent.
    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref().filter(|d| !d.is_empty())
    }

    pub fn citations(&self) -> u64 {
        self.cited_by_count.unwrap_or(0)
    }

    /// Display name of the primary location's source (journal, repository).
    pub fn venue(&self) -> &str {
        self.primary_location
            .as_ref()
            .and_then(|l| l.source.as_ref())
            .and_then(|s| s.display_name.as_deref())
            .unwrap_or_default()
    }

    pub fn publisher(&self) -> &str {
        self.primary_location
            .as_ref()
            .and_then(|l| l.source.as_ref())
            .and_then(|s| s.host_organization_name.as_deref())
            .unwrap_or_default()
    }

    /// Author display names in authorship order.
    pub fn author_names(&self) -> Vec<&str> {
        self.authorships
            .iter()
            .filter_map(|a| a.author.as_ref())
            .filter_map(|a| a.display_name.as_deref())
            .collect()
    }

    pub fn is_oa(&self) -> bool {
        self.open_access.as_ref().is_some_and(|oa| oa.is_oa)
    }

    pub fn oa_url(&self) -> &str {
        self.open_access
            .as_ref()
            .and_then(|oa| oa.oa_url.as_deref())
            .unwrap_or_default()
    }

    /// Final path segment of the OpenAlex ID (`https://openalex.org/W123` → `W123`).
    pub fn id_segment(&self) -> &str {
        self.id
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// Which author to query: exactly one of ORCID or free-text name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorQuery {
    Orcid(String),
    Name(String),
}

impl AuthorQuery {
    /// Build a query from optional ORCID and name.
    ///
    /// Blank strings count as absent. Supplying both or neither is an
    /// `InvalidQuery` error.
    pub fn from_parts(orcid: Option<&str>, name: Option<&str>) -> Result<Self> {
        let orcid = orcid.map(str::trim).filter(|s| !s.is_empty());
        let name = name.map(str::trim).filter(|s| !s.is_empty());

        match (orcid, name) {
            (Some(orcid), None) => {
                let bare = ORCID_PREFIXES
                    .iter()
                    .find_map(|p| orcid.strip_prefix(p))
                    .unwrap_or(orcid);
                Ok(Self::Orcid(bare.to_string()))
            }
            (None, Some(name)) => Ok(Self::Name(name.to_string())),
            (Some(_), Some(_)) => Err(PubsyncError::InvalidQuery(
                "provide either an ORCID or an author name, not both".to_string(),
            )),
            (None, None) => Err(PubsyncError::InvalidQuery(
                "an ORCID or an author name is required".to_string(),
            )),
        }
    }

    fn filter_clause(&self) -> String {
        match self {
            Self::Orcid(id) => format!("author.orcid:{}", id),
            Self::Name(name) => format!("author.search:{}", name),
        }
    }
}

/// Optional narrowing of the works query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkFilters {
    /// Keep works cited more than this many times
    pub min_citations: Option<u64>,
    /// Keep works published after this year
    pub min_year: Option<i32>,
    /// Keep only open-access works
    pub open_access_only: bool,
    /// Work types to exclude (e.g. `paratext`, `erratum`)
    pub exclude_types: Vec<String>,
}

impl WorkFilters {
    /// Filter clauses in API syntax, appended after the author clause.
    /// Thresholds are strict and passed through unchanged.
    fn clauses(&self) -> Vec<String> {
        let mut clauses = Vec::new();

        if let Some(min) = self.min_citations {
            clauses.push(format!("cited_by_count:>{}", min));
        }

        if let Some(year) = self.min_year {
            clauses.push(format!("publication_year:>{}", year));
        }

        if self.open_access_only {
            clauses.push("is_oa:true".to_string());
        }

        for work_type in self.exclude_types.iter().filter(|t| !t.trim().is_empty()) {
            clauses.push(format!("type:!{}", work_type.trim()));
        }

        clauses
    }
}

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<RawWork>,
}

/// Client for the OpenAlex works endpoint
pub struct OpenAlexClient {
    client: Client,
    base_url: String,
    mailto: Option<String>,
}

impl OpenAlexClient {
    /// Create a client against `base_url` (normally [`OPENALEX_API_BASE`]).
    ///
    /// `mailto` is sent with every request for polite-pool access.
    pub fn new(base_url: &str, mailto: Option<String>) -> Result<Self> {
        let mailto = mailto.filter(|m| !m.trim().is_empty());
        let user_agent = match &mailto {
            Some(email) => format!("pubsync/{} (mailto:{})", env!("CARGO_PKG_VERSION"), email),
            None => format!("pubsync/{}", env!("CARGO_PKG_VERSION")),
        };

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent)
            .build()
            .map_err(|e| PubsyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            mailto,
        })
    }

    /// Build the `/works` URL for one author query.
    pub fn works_url(
        &self,
        query: &AuthorQuery,
        per_page: usize,
        filters: &WorkFilters,
    ) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/works", self.base_url))
            .map_err(|e| PubsyncError::Config(format!("Invalid OpenAlex base URL: {}", e)))?;

        let mut clauses = vec![query.filter_clause()];
        clauses.extend(filters.clauses());

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("filter", &clauses.join(","));
            params.append_pair("per-page", &per_page.clamp(1, MAX_PER_PAGE).to_string());
            params.append_pair("sort", "publication_date:desc");
            if let Some(email) = &self.mailto {
                params.append_pair("mailto", email);
            }
        }

        Ok(url)
    }

    /// Fetch one page of works for `query`.
    ///
    /// # Errors
    ///
    /// `Fetch` on a non-success status, `Network` on transport failure,
    /// `Parse` when the body is not a works response.
    pub async fn fetch_works(
        &self,
        query: &AuthorQuery,
        per_page: usize,
        filters: &WorkFilters,
    ) -> Result<Vec<RawWork>> {
        let url = self.works_url(query, per_page, filters)?;

        info!(query = ?query, per_page = per_page, "Querying OpenAlex works");
        debug!(url = %url, "OpenAlex request");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(PubsyncError::Fetch {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let works = parse_works(&body)?;

        info!(count = works.len(), "Fetched OpenAlex works");
        Ok(works)
    }
}

/// Parse a `/works` response body.
pub fn parse_works(json_str: &str) -> Result<Vec<RawWork>> {
    let response: WorksResponse = serde_json::from_str(json_str)
        .map_err(|e| PubsyncError::Parse(format!("Failed to parse OpenAlex response: {}", e)))?;
    Ok(response.results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> OpenAlexClient {
        OpenAlexClient::new(base, Some("me@example.org".to_string())).expect("client")
    }

    #[test]
    fn test_author_query_requires_exactly_one() {
        assert!(matches!(
            AuthorQuery::from_parts(None, None),
            Err(PubsyncError::InvalidQuery(_))
        ));
        assert!(matches!(
            AuthorQuery::from_parts(Some("0000-0001-2345-6789"), Some("Jane Doe")),
            Err(PubsyncError::InvalidQuery(_))
        ));
        assert!(matches!(
            AuthorQuery::from_parts(Some("  "), None),
            Err(PubsyncError::InvalidQuery(_))
        ));
        assert_eq!(
            AuthorQuery::from_parts(None, Some("Jane Doe")).expect("name"),
            AuthorQuery::Name("Jane Doe".to_string())
        );
    }

    #[test]
    fn test_orcid_uri_prefix_is_stripped() {
        let query =
            AuthorQuery::from_parts(Some("https://orcid.org/0000-0001-2345-6789"), None).expect("orcid");
        assert_eq!(query, AuthorQuery::Orcid("0000-0001-2345-6789".to_string()));
    }

    #[test]
    fn test_works_url_filters() {
        let filters = WorkFilters {
            min_citations: Some(5),
            min_year: Some(2020),
            open_access_only: true,
            exclude_types: vec!["paratext".to_string(), "erratum".to_string()],
        };
        let query = AuthorQuery::Orcid("0000-0001-2345-6789".to_string());
        let url = client(OPENALEX_API_BASE)
            .works_url(&query, 50, &filters)
            .expect("url");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };

        assert_eq!(url.path(), "/works");
        assert_eq!(
            get("filter"),
            "author.orcid:0000-0001-2345-6789,cited_by_count:>5,publication_year:>2020,is_oa:true,type:!paratext,type:!erratum"
        );
        assert_eq!(get("per-page"), "50");
        assert_eq!(get("sort"), "publication_date:desc");
        assert_eq!(get("mailto"), "me@example.org");
    }

    #[test]
    fn test_filter_thresholds_are_passed_through() {
        let filters = WorkFilters {
            min_citations: Some(0),
            min_year: Some(i32::MIN),
            ..Default::default()
        };
        assert_eq!(
            filters.clauses(),
            vec![
                "cited_by_count:>0".to_string(),
                format!("publication_year:>{}", i32::MIN),
            ]
        );

        let filters = WorkFilters {
            min_citations: Some(10),
            min_year: Some(2020),
            ..Default::default()
        };
        assert_eq!(
            filters.clauses(),
            vec!["cited_by_count:>10", "publication_year:>2020"]
        );
    }

    #[test]
    fn test_works_url_clamps_page_size() {
        let query = AuthorQuery::Name("Jane Doe".to_string());
        let url = client(OPENALEX_API_BASE)
            .works_url(&query, 5000, &WorkFilters::default())
            .expect("url");
        assert!(url.as_str().contains("per-page=200"));
        assert!(url.as_str().contains("author.search%3AJane+Doe"));
    }

    #[test]
    fn test_parse_works_tolerates_nulls() {
        let body = r#"{"meta":{"count":1},"results":[{
            "id":"https://openalex.org/W1","title":null,"type":"article",
            "cited_by_count":null,"authorships":[{"author":{"display_name":"A"}}],
            "abstract_inverted_index":null,"primary_location":{"source":null}
        }]}"#;
        let works = parse_works(body).expect("parse");
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].citations(), 0);
        assert_eq!(works[0].title_or_untitled(), "Untitled");
        assert_eq!(works[0].venue(), "");
        assert_eq!(works[0].id_segment(), "W1");
    }

    #[tokio::test]
    async fn test_fetch_works_returns_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/works"))
            .and(query_param("filter", "author.search:Jane Doe"))
            .and(query_param("mailto", "me@example.org"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"results":[{"id":"https://openalex.org/W9","title":"A","type":"article"}]}"#,
            ))
            .mount(&server)
            .await;

        let query = AuthorQuery::Name("Jane Doe".to_string());
        let works = client(&server.uri())
            .fetch_works(&query, 25, &WorkFilters::default())
            .await
            .expect("fetch");
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].id, "https://openalex.org/W9");
    }

    #[tokio::test]
    async fn test_fetch_works_non_success_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/works"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let query = AuthorQuery::Name("Jane Doe".to_string());
        let err = client(&server.uri())
            .fetch_works(&query, 25, &WorkFilters::default())
            .await
            .expect_err("should fail");
        assert!(matches!(err, PubsyncError::Fetch { status: 503 }));
    }
}
