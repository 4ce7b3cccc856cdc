use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use threatfeed_core::{ServerRecord, ThreatRecord};

use crate::TransformError;

/// Servers seeded from real indicators so the two tables always join.
pub const SAMPLED_SERVERS: usize = 5;

pub const DEPARTMENTS: [&str; 5] = ["Finance", "HR", "Engineering", "Executive", "Sales"];

pub const OS_VERSIONS: [&str; 3] = ["Windows Server 2019", "Ubuntu 20.04", "Red Hat"];

const SERVER_ID_BASE: usize = 100;

/// The fixed private addresses 192.168.1.10 through 192.168.1.19.
pub fn synthetic_addresses() -> Vec<String> {
    (10..20).map(|i| format!("192.168.1.{i}")).collect()
}

/// Build the mock inventory: sampled indicators first, then the synthetic addresses.
pub fn generate_servers<R: Rng + ?Sized>(
    threats: &[ThreatRecord],
    rng: &mut R,
) -> Result<Vec<ServerRecord>, TransformError> {
    let candidates = distinct_indicators(threats);
    if candidates.len() < SAMPLED_SERVERS {
        return Err(TransformError::InsufficientIndicators {
            needed: SAMPLED_SERVERS,
            found: candidates.len(),
        });
    }

    let mut addresses: Vec<String> = candidates
        .choose_multiple(rng, SAMPLED_SERVERS)
        .map(|s| s.to_string())
        .collect();
    addresses.extend(synthetic_addresses());

    Ok(addresses
        .into_iter()
        .enumerate()
        .map(|(i, ip_address)| ServerRecord {
            server_id: format!("SRV-{}", SERVER_ID_BASE + i),
            ip_address,
            department: DEPARTMENTS[i % DEPARTMENTS.len()].to_string(),
            os_version: OS_VERSIONS[i % OS_VERSIONS.len()].to_string(),
        })
        .collect())
}

// First-seen order keeps sampling reproducible for a fixed seed. The
// "unknown" placeholder is a value of the column and stays in the pool.
fn distinct_indicators(threats: &[ThreatRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    threats
        .iter()
        .map(|t| t.domain_or_ip.as_str())
        .filter(|h| seen.insert(*h))
        .collect()
}
