//! Core record types shared across the threat feed pipeline.

pub mod records;

pub use records::*;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Placeholder written into `tags` when the feed leaves it empty.
pub const NO_TAGS: &str = "no_tags";

/// Placeholder written into `domain_or_ip` when no host can be extracted.
pub const UNKNOWN_HOST: &str = "unknown";

/// Destination table for cleaned feed rows.
pub const THREATS_TABLE: &str = "active_threats";

/// Destination table for the synthetic server inventory.
pub const SERVERS_TABLE: &str = "internal_servers";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }

    #[test]
    fn destination_tables_differ() {
        assert_ne!(THREATS_TABLE, SERVERS_TABLE);
    }
}
