//! # pubsync
//!
//! Pulls a researcher's publications from OpenAlex and materializes them as
//! content for a Quarto academic website.
//!
//! ## Modules
//!
//! - [`openalex`] - OpenAlex works API client
//! - [`dedup`] - Title grouping and canonical record selection
//! - [`article`] - Normalized article records (slug, date, abstract)
//! - [`emit`] - Per-article Quarto pages
//! - [`catalog`] - CSV catalog and JSON snapshot
//! - [`scholar`] - Google Scholar profile statistics
//! - [`pipeline`] - End-to-end sync and export
//! - [`config`] - TOML configuration
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pubsync::{config::Config, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let report = pipeline::sync_articles(&config).await?;
//!     println!("Created {}/{} articles", report.emit.created, report.emit.total);
//!     Ok(())
//! }
//! ```

pub mod article;
pub mod catalog;
pub mod config;
pub mod dedup;
pub mod emit;
pub mod error;
pub mod openalex;
pub mod pipeline;
pub mod scholar;

pub use error::{PubsyncError, Result};
