use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod output;
mod pipeline;

use config::{EtlConfig, DATABASE_ENV};
use output::OutputFormat;
use pipeline::{FeedSource, RunOutcome};
use warehouse_sqlite::{ConnectionTarget, Warehouse};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Table { Threats, Servers }

#[derive(Debug, Args)]
struct SourceArgs {
    /// Read the feed from a local CSV file instead of downloading it
    #[arg(long, value_name = "FILE", conflicts_with = "url")]
    input: Option<PathBuf>,
    /// Feed URL (default: URLhaus recent export)
    #[arg(long)]
    url: Option<String>,
    /// Metadata lines above the CSV header row
    #[arg(long)]
    skip_lines: Option<usize>,
    /// Seed for sampling the server inventory; random if omitted
    #[arg(long)]
    seed: Option<u64>,
    /// HTTP timeout in milliseconds; none if omitted
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl SourceArgs {
    fn apply(&self, mut cfg: EtlConfig) -> EtlConfig {
        if let Some(u) = &self.url { cfg.feed_url = u.clone(); }
        if let Some(n) = self.skip_lines { cfg.skip_lines = n; }
        if let Some(s) = self.seed { cfg.seed = Some(s); }
        if let Some(t) = self.timeout_ms { cfg.timeout_ms = Some(t); }
        cfg
    }

    fn source(&self, cfg: &EtlConfig) -> FeedSource {
        match &self.input {
            Some(p) => FeedSource::File(p.clone()),
            None => FeedSource::Remote(cfg.feed_url.clone()),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "threatfeed", version, about = "Load the URLhaus threat feed into a SQLite warehouse")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./threatfeed.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Fetch, transform and full-refresh active_threats and internal_servers
    Run {
        #[command(flatten)]
        source: SourceArgs,
        /// Warehouse connection string (overrides DATABASE_CONNECTION_STRING)
        #[arg(long)]
        database: Option<String>,
    },
    /// Fetch and transform, then print a table instead of loading it
    Preview {
        #[command(flatten)]
        source: SourceArgs,
        /// Which table to print
        #[arg(long, value_enum, default_value_t = Table::Threats)]
        table: Table,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Print at most N rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show recent loads from the warehouse run ledger
    History {
        /// Warehouse connection string (overrides DATABASE_CONNECTION_STRING)
        #[arg(long)]
        database: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn init_logging(to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("threatfeed=info,feed_fetch=info,warehouse_sqlite=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if to_stderr {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Progress goes to stdout for `run`; commands that print data keep stdout clean.
    init_logging(!matches!(cli.command, Commands::Run { .. }));

    let cfg = config::load_config(cli.config.as_deref())?
        .with_env_database(std::env::var(DATABASE_ENV).ok());

    match cli.command {
        Commands::Version => {
            println!("threatfeed {} (core {})", env!("CARGO_PKG_VERSION"), threatfeed_core::version());
        }
        Commands::Run { source, database } => {
            let mut cfg = source.apply(cfg);
            if database.is_some() { cfg.database_url = database; }
            match pipeline::run(&source.source(&cfg), &cfg)? {
                RunOutcome::NoData => tracing::warn!("No feed data, nothing transformed or loaded"),
                RunOutcome::LoadSkipped { threat_rows, server_rows } => {
                    tracing::warn!(threat_rows, server_rows, "Tables built but not loaded");
                }
                RunOutcome::Loaded(summary) => {
                    tracing::info!(
                        run_id = %summary.run_id,
                        threat_rows = summary.threat_rows,
                        server_rows = summary.server_rows,
                        "Load finished"
                    );
                }
            }
        }
        Commands::Preview { source, table, format, limit } => {
            let cfg = source.apply(cfg);
            let Some(text) = pipeline::extract(&source.source(&cfg), &cfg)? else {
                return Ok(());
            };
            let tables = pipeline::transform(&text, &cfg)?;
            let mut out = std::io::stdout().lock();
            match table {
                Table::Threats => {
                    let n = limit.unwrap_or(tables.threats.len()).min(tables.threats.len());
                    output::write_threats(&mut out, &tables.threats[..n], format)?;
                }
                Table::Servers => {
                    let n = limit.unwrap_or(tables.servers.len()).min(tables.servers.len());
                    output::write_servers(&mut out, &tables.servers[..n], format)?;
                }
            }
        }
        Commands::History { database, limit, format } => {
            let Some(conn_str) = database.or(cfg.database_url) else {
                return Err(anyhow::anyhow!("provide --database or set {DATABASE_ENV}"));
            };
            let wh = Warehouse::connect(&ConnectionTarget::parse(&conn_str)?)?;
            let runs = wh.recent_runs(limit)?;
            output::write_runs(&mut std::io::stdout().lock(), &runs, format)?;
        }
    }
    Ok(())
}
