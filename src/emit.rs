//! Per-article page emission.
//!
//! Each article becomes `<root>/<slug>/index.<ext>`, overwritten on every
//! run. A failure on one article is logged and counted, never propagated.

use crate::article::Article;
use crate::error::{PubsyncError, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Turns an article into the text of its content file.
pub trait PageRenderer {
    fn render(&self, article: &Article) -> Result<String>;

    /// File extension of the rendered page, without the dot.
    fn extension(&self) -> &str;
}

/// Quarto document with YAML front matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuartoPage;

#[derive(Serialize)]
struct FrontMatter<'a> {
    title: &'a str,
    author: &'a str,
    date: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    doi: &'a str,
    #[serde(rename = "citation-url", skip_serializing_if = "str::is_empty")]
    citation_url: &'a str,
    format: FormatOptions,
}

#[derive(Serialize)]
struct FormatOptions {
    html: HtmlOptions,
}

#[derive(Serialize)]
struct HtmlOptions {
    toc: bool,
}

impl PageRenderer for QuartoPage {
    fn render(&self, article: &Article) -> Result<String> {
        let front = FrontMatter {
            title: &article.title,
            author: &article.author,
            date: &article.date,
            doi: &article.doi,
            citation_url: &article.url,
            format: FormatOptions {
                html: HtmlOptions { toc: true },
            },
        };

        let mut page = String::from("---\n");
        page.push_str(&serde_yaml::to_string(&front)?);
        page.push_str("---\n\n");

        if article.is_preprint() {
            page.push_str("::: {.callout-warning}\n");
            page.push_str("## Preprint\n");
            page.push_str("This is a preprint and has not been peer reviewed.\n");
            page.push_str(":::\n\n");
        }

        if !article.abstract_text.is_empty() {
            page.push_str("## Abstract\n\n");
            page.push_str(&article.abstract_text);
            page.push_str("\n\n");
        }

        page.push_str("## Publication Details\n\n");
        if !article.publication_venue.is_empty() {
            page.push_str(&format!("**Venue:** {}\n\n", article.publication_venue));
        }
        if article.cited_by_count > 0 {
            page.push_str(&format!("**Citations:** {}\n\n", article.cited_by_count));
        }
        if article.open_access {
            page.push_str("**Open Access:** Yes\n\n");
        }

        page.push_str("## Links\n\n");
        if !article.url.is_empty() {
            page.push_str(&format!("- [DOI]({})\n", article.url));
        }
        if !article.pdf_url.is_empty() {
            page.push_str(&format!("- [PDF]({})\n", article.pdf_url));
        }
        page.push_str(&format!("- [OpenAlex]({})\n", article.openalex_id));

        Ok(page)
    }

    fn extension(&self) -> &str {
        "qmd"
    }
}

/// Outcome of a batch emission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    pub created: usize,
    pub total: usize,
    /// (slug, error message) for every article that was skipped
    pub failures: Vec<(String, String)>,
}

/// Writes article pages under a root directory.
pub struct Emitter<R = QuartoPage> {
    root: PathBuf,
    renderer: R,
    pause: Duration,
}

impl Emitter<QuartoPage> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_renderer(root, QuartoPage)
    }
}

impl<R: PageRenderer> Emitter<R> {
    pub fn with_renderer(root: impl Into<PathBuf>, renderer: R) -> Self {
        Self {
            root: root.into(),
            renderer,
            pause: Duration::ZERO,
        }
    }

    /// Delay between consecutive writes, to go easy on file watchers.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Render and write one article, overwriting any previous page.
    ///
    /// An empty slug is rejected so the page never lands in the root itself.
    pub fn emit_article(&self, article: &Article) -> Result<PathBuf> {
        if article.slug.trim().is_empty() {
            return Err(PubsyncError::emit(&article.slug, "empty slug"));
        }

        let content = self
            .renderer
            .render(article)
            .map_err(|e| PubsyncError::emit(&article.slug, e))?;

        let dir = self.root.join(&article.slug);
        fs::create_dir_all(&dir).map_err(|e| PubsyncError::emit(&article.slug, e))?;

        let path = dir.join(format!("index.{}", self.renderer.extension()));
        fs::write(&path, content).map_err(|e| PubsyncError::emit(&article.slug, e))?;

        debug!(slug = %article.slug, path = ?path, "Wrote article page");
        Ok(path)
    }

    /// Emit every article in order, skipping the ones that fail.
    pub async fn emit_all(&self, articles: &[Article]) -> EmitReport {
        let mut report = EmitReport {
            total: articles.len(),
            ..Default::default()
        };

        for (idx, article) in articles.iter().enumerate() {
            match self.emit_article(article) {
                Ok(_) => report.created += 1,
                Err(e) => {
                    warn!(slug = %article.slug, title = %article.title, error = %e, "Skipping article");
                    report.failures.push((article.slug.clone(), e.to_string()));
                }
            }

            if !self.pause.is_zero() && idx + 1 < articles.len() {
                tokio::time::sleep(self.pause).await;
            }
        }

        info!(created = report.created, total = report.total, "Emitted article pages");
        report
    }
}
