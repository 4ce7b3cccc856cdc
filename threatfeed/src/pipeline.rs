//! Extract, transform and load, run strictly in that order.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use threat_transform::{generate_servers, parse_feed, transform_threats};
use threatfeed_core::{ServerRecord, ThreatRecord};
use warehouse_sqlite::{ConnectionTarget, LoadSummary, RunMeta, Warehouse};

use crate::config::{EtlConfig, DATABASE_ENV};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Remote(String),
    File(PathBuf),
}

impl FeedSource {
    pub fn label(&self) -> String {
        match self {
            FeedSource::Remote(url) => url.clone(),
            FeedSource::File(path) => format!("file://{}", path.display()),
        }
    }
}

/// The two in-memory tables handed from transform to load.
#[derive(Debug, Clone)]
pub struct Tables {
    pub threats: Vec<ThreatRecord>,
    pub servers: Vec<ServerRecord>,
}

#[derive(Debug)]
pub enum RunOutcome {
    /// The feed did not answer 200; nothing was transformed.
    NoData,
    /// Transform ran but no connection string was configured.
    LoadSkipped { threat_rows: usize, server_rows: usize },
    Loaded(LoadSummary),
}

pub fn extract(source: &FeedSource, cfg: &EtlConfig) -> Result<Option<String>> {
    match source {
        FeedSource::Remote(url) => {
            let opts = cfg.fetch_options();
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(feed_fetch::fetch_feed(url, &opts))
        }
        FeedSource::File(path) => {
            tracing::info!(path = %path.display(), "Reading threat data from file");
            Ok(Some(std::fs::read_to_string(path)?))
        }
    }
}

pub fn transform(text: &str, cfg: &EtlConfig) -> Result<Tables> {
    tracing::info!("Starting data transformation");
    let raw = parse_feed(text, cfg.skip_lines)?;
    let threats = transform_threats(&raw)?;
    tracing::info!(rows = threats.len(), "Transformation complete");

    tracing::info!("Generating internal server inventory");
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let servers = generate_servers(&threats, &mut rng)?;
    tracing::info!(rows = servers.len(), "Internal server inventory generated");
    Ok(Tables { threats, servers })
}

/// Full-refresh both tables. Without a connection string nothing is opened or written.
pub fn load(tables: &Tables, cfg: &EtlConfig, meta: &RunMeta) -> Result<RunOutcome> {
    tracing::info!("Connecting to warehouse");
    let Some(conn_str) = cfg.database_url.as_deref() else {
        tracing::error!(env = DATABASE_ENV, "No database connection string found, skipping load");
        return Ok(RunOutcome::LoadSkipped {
            threat_rows: tables.threats.len(),
            server_rows: tables.servers.len(),
        });
    };
    let target = ConnectionTarget::parse(conn_str)?;
    let mut wh = Warehouse::connect(&target)?;
    let summary = wh.full_refresh(&tables.threats, &tables.servers, meta)?;
    tracing::info!(run_id = %summary.run_id, "Both tables are now live");
    Ok(RunOutcome::Loaded(summary))
}

pub fn run(source: &FeedSource, cfg: &EtlConfig) -> Result<RunOutcome> {
    let meta = RunMeta::new(env!("CARGO_PKG_VERSION"), &source.label());
    let Some(text) = extract(source, cfg)? else {
        return Ok(RunOutcome::NoData);
    };
    let tables = transform(&text, cfg)?;
    let outcome = load(&tables, cfg, &meta)?;
    tracing::info!("ETL pipeline run complete");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::path::Path;
    use threatfeed_core::{SERVERS_TABLE, THREATS_TABLE};

    fn fixture() -> FeedSource {
        FeedSource::File(
            Path::new(env!("CARGO_MANIFEST_DIR")).join("../modules/threat-transform/testdata/urlhaus_recent.csv"),
        )
    }

    fn seeded() -> EtlConfig {
        EtlConfig { seed: Some(7), no_proxy: true, timeout_ms: Some(5_000), ..EtlConfig::default() }
    }

    fn serve_once(response: &'static str) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut sock, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = sock.read(&mut buf);
                let _ = sock.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/downloads/csv_recent/")
    }

    #[test]
    fn missing_connection_string_skips_load() {
        let outcome = run(&fixture(), &seeded()).unwrap();
        match outcome {
            RunOutcome::LoadSkipped { threat_rows, server_rows } => {
                assert_eq!(threat_rows, 8);
                assert_eq!(server_rows, 15);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn loads_into_sqlite_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("warehouse.db");
        let cfg = EtlConfig { database_url: Some(format!("sqlite://{}", db.display())), ..seeded() };
        let outcome = run(&fixture(), &cfg).unwrap();
        assert!(matches!(outcome, RunOutcome::Loaded(ref s) if s.threat_rows == 8 && s.server_rows == 15));

        let wh = Warehouse::connect(&ConnectionTarget::File(db)).unwrap();
        assert_eq!(wh.row_count(THREATS_TABLE).unwrap(), 8);
        assert_eq!(wh.row_count(SERVERS_TABLE).unwrap(), 15);
        let joined: i64 = wh
            .conn
            .query_row(
                "SELECT COUNT(DISTINCT s.server_id) FROM internal_servers s JOIN active_threats t ON t.domain_or_ip = s.ip_address",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(joined, 5);
    }

    #[test]
    fn not_found_stops_before_transform_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("warehouse.db");
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let cfg = EtlConfig { database_url: Some(format!("sqlite://{}", db.display())), ..seeded() };
        let outcome = run(&FeedSource::Remote(url), &cfg).unwrap();
        assert!(matches!(outcome, RunOutcome::NoData));
        assert!(!db.exists());
    }

    #[test]
    fn same_seed_same_tables() {
        let text = extract(&fixture(), &seeded()).unwrap().unwrap();
        let a = transform(&text, &seeded()).unwrap();
        let b = transform(&text, &seeded()).unwrap();
        assert_eq!(a.threats, b.threats);
        assert_eq!(a.servers, b.servers);
    }

    #[test]
    fn unsupported_warehouse_is_an_error() {
        let cfg = EtlConfig { database_url: Some("postgresql://u:p@db.test/intel".into()), ..seeded() };
        assert!(run(&fixture(), &cfg).is_err());
    }
}
