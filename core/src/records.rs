use serde::Serialize;
use std::fmt;
use time::macros::format_description;
use time::PrimitiveDateTime;

/// Severity tier derived from the feed's threat category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Classify a threat category by keyword. Matching is case-insensitive and
    /// the first matching tier wins: botnet/malware_download, then phishing.
    pub fn classify(threat: &str) -> Self {
        let t = threat.to_lowercase();
        if t.contains("botnet") || t.contains("malware_download") {
            RiskLevel::High
        } else if t.contains("phishing") {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cleaned row of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatRecord {
    pub id: Option<String>,
    pub dateadded: Option<PrimitiveDateTime>,
    pub url: Option<String>,
    pub url_status: Option<String>,
    pub last_online: Option<PrimitiveDateTime>,
    pub threat: Option<String>,
    pub tags: String,
    pub urlhaus_link: Option<String>,
    pub reporter: Option<String>,
    pub domain_or_ip: String,
    pub risk_level: RiskLevel,
}

/// One row of the synthetic internal server inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerRecord {
    pub server_id: String,
    pub ip_address: String,
    pub department: String,
    pub os_version: String,
}

/// Render a timestamp the way the feed writes it (`YYYY-MM-DD HH:MM:SS`).
pub fn format_timestamp(ts: &PrimitiveDateTime) -> String {
    ts.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| String::new())
}
