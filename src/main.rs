//! pubsync - OpenAlex publication sync for a Quarto academic website
//!
//! ## Usage
//!
//! ```bash
//! pubsync sync --orcid 0000-0002-1825-0097 --mailto me@example.org
//! pubsync export --name "Jane Doe"
//! pubsync stats --user _zgKKS0AAAAJ
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pubsync::{config::Config, pipeline, scholar};
use std::path::PathBuf;
use tracing::{error, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Sync a researcher's OpenAlex publications into website content
#[derive(Parser)]
#[command(name = "pubsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file (default: ./pubsync.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one Quarto page per publication
    Sync {
        #[command(flatten)]
        author: AuthorArgs,

        /// Articles directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the CSV catalog and JSON snapshot
    Export {
        #[command(flatten)]
        author: AuthorArgs,

        /// CSV catalog path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// JSON snapshot path
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Save Google Scholar profile statistics as YAML
    Stats {
        /// Google Scholar user ID
        #[arg(long)]
        user: Option<String>,

        /// Output YAML path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct AuthorArgs {
    /// Author ORCID (bare or https://orcid.org/ URI)
    #[arg(long)]
    orcid: Option<String>,

    /// Author name (free-text search)
    #[arg(long)]
    name: Option<String>,

    /// Contact email for the OpenAlex polite pool
    #[arg(long)]
    mailto: Option<String>,

    /// Number of works to request (max 200)
    #[arg(long)]
    per_page: Option<usize>,
}

impl AuthorArgs {
    /// Flags win over the config file; an author given on the command line
    /// replaces both configured author fields.
    fn apply(self, config: &mut Config) {
        if self.orcid.is_some() || self.name.is_some() {
            config.author.orcid = self.orcid;
            config.author.name = self.name;
        }
        if let Some(mailto) = self.mailto {
            config.openalex.mailto = Some(mailto);
        }
        if let Some(per_page) = self.per_page {
            config.openalex.per_page = per_page;
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Sync { author, output } => {
            author.apply(&mut config);
            if let Some(dir) = output {
                config.output.articles_dir = dir;
            }
            run_sync(&config).await
        }
        Commands::Export {
            author,
            csv,
            snapshot,
        } => {
            author.apply(&mut config);
            if let Some(path) = csv {
                config.output.catalog_csv = path;
            }
            if let Some(path) = snapshot {
                config.output.snapshot_json = path;
            }
            run_export(&config).await
        }
        Commands::Stats { user, output } => {
            if let Some(user) = user {
                config.scholar.user_id = Some(user);
            }
            if let Some(path) = output {
                config.scholar.stats_yaml = path;
            }
            run_stats(&config).await
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run_sync(config: &Config) -> Result<()> {
    println!("Fetching publications from OpenAlex...");

    let report = pipeline::sync_articles(config)
        .await
        .context("Publication sync failed")?;

    println!(
        "Found {} works, {} after removing duplicates.",
        report.fetched, report.unique
    );
    for (slug, reason) in &report.emit.failures {
        println!("  ✗ {}: {}", slug, reason);
    }
    println!(
        "\n✓ Created {}/{} articles in {}",
        report.emit.created,
        report.emit.total,
        config.output.articles_dir.display()
    );
    Ok(())
}

async fn run_export(config: &Config) -> Result<()> {
    println!("Fetching publications from OpenAlex...");

    let report = pipeline::export_catalog(config)
        .await
        .context("Catalog export failed")?;

    println!(
        "Found {} works, {} after removing duplicates.",
        report.fetched, report.rows
    );
    println!("Saved: {}", config.output.catalog_csv.display());
    println!("Saved: {}", config.output.snapshot_json.display());
    Ok(())
}

async fn run_stats(config: &Config) -> Result<()> {
    let user_id = config
        .scholar
        .user_id
        .as_deref()
        .context("No Google Scholar user ID (use --user or [scholar] user_id)")?;

    println!("Fetching Google Scholar statistics...");

    let stats = match scholar::fetch_profile_stats(&config.scholar.base_url, user_id).await {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "Scholar fetch failed");
            return Err(e).context("Failed to fetch Google Scholar profile");
        }
    };

    print_stats(&stats);
    stats
        .save_yaml(&config.scholar.stats_yaml)
        .context("Failed to save Scholar stats")?;
    println!("✓ Saved Google Scholar stats to {}", config.scholar.stats_yaml.display());
    Ok(())
}

fn print_stats(stats: &scholar::ScholarStats) {
    let na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());

    println!("\n{}", "=".repeat(60));
    println!("GOOGLE SCHOLAR STATISTICS");
    println!("{}", "=".repeat(60));

    if let Some(name) = &stats.name {
        println!("\nName: {}", name);
    }
    if let Some(affiliation) = &stats.affiliation {
        println!("Affiliation: {}", affiliation);
    }

    println!("\n{:<20} {:<15} {:<15}", "Metric", "All Time", "Since 2019");
    println!("{}", "-".repeat(60));
    println!("{:<20} {:<15} {:<15}", "Citations", na(&stats.citations_all), na(&stats.citations_since));
    println!("{:<20} {:<15} {:<15}", "h-index", na(&stats.h_index_all), na(&stats.h_index_since));
    println!("{:<20} {:<15} {:<15}", "i10-index", na(&stats.i10_index_all), na(&stats.i10_index_since));

    if !stats.interests.is_empty() {
        println!("\nResearch Interests: {}", stats.interests.join(", "));
    }
    println!("\nLast Updated: {}", stats.last_updated);
    println!("{}\n", "=".repeat(60));
}
