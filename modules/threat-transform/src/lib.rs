//! Feed parsing, threat enrichment and server inventory synthesis.

mod feed;
mod enrich;
mod servers;

pub use enrich::{extract_host, parse_timestamp, transform_threats, HostExtraction};
pub use feed::{parse_feed, RawFeed, DEFAULT_SKIP_LINES};
pub use servers::{generate_servers, synthetic_addresses, DEPARTMENTS, OS_VERSIONS, SAMPLED_SERVERS};

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Nothing but preamble (or nothing at all) came back.
    #[error("feed has no header row after skipping {skipped} lines")]
    EmptyFeed { skipped: usize },

    #[error("feed header is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Too few distinct hosts in the threat table to seed the server inventory.
    #[error("need {needed} distinct indicators to sample servers, found {found}")]
    InsufficientIndicators { needed: usize, found: usize },
}

#[cfg(test)]
pub(crate) const FIXTURE: &str = include_str!("../testdata/urlhaus_recent.csv");
