use threatfeed_core::{RiskLevel, ThreatRecord, NO_TAGS, UNKNOWN_HOST};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use url::{Host, Url};

use crate::{RawFeed, TransformError};

/// Outcome of pulling a host out of a feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostExtraction {
    Parsed(String),
    Unparseable,
}

/// Host component of `raw`, without port or IPv6 brackets. Domains come back
/// lowercased and IDNA-encoded (punycode).
pub fn extract_host(raw: &str) -> HostExtraction {
    let Ok(url) = Url::parse(raw.trim()) else {
        return HostExtraction::Unparseable;
    };
    match url.host() {
        Some(Host::Domain(d)) if !d.is_empty() => HostExtraction::Parsed(d.to_string()),
        Some(Host::Ipv4(a)) => HostExtraction::Parsed(a.to_string()),
        Some(Host::Ipv6(a)) => HostExtraction::Parsed(a.to_string()),
        _ => HostExtraction::Unparseable,
    }
}

/// Best-effort timestamp coercion. Anything unrecognised becomes `None`.
pub fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day] [hour]:[minute]:[second]")) {
        return Some(ts);
    }
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        let utc = ts.to_offset(UtcOffset::UTC);
        return Some(PrimitiveDateTime::new(utc.date(), utc.time()));
    }
    if let Ok(ts) = PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]")) {
        return Some(ts);
    }
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight())
}

struct Columns {
    id: Option<usize>,
    dateadded: Option<usize>,
    url: usize,
    url_status: Option<usize>,
    last_online: Option<usize>,
    threat: usize,
    tags: Option<usize>,
    urlhaus_link: Option<usize>,
    reporter: Option<usize>,
}

impl Columns {
    fn resolve(raw: &RawFeed) -> Result<Self, TransformError> {
        Ok(Columns {
            id: raw.column(&["# id", "id"]),
            dateadded: raw.column(&["dateadded"]),
            url: raw.column(&["url"]).ok_or(TransformError::MissingColumn("url"))?,
            url_status: raw.column(&["url_status"]),
            last_online: raw.column(&["last_online"]),
            threat: raw.column(&["threat"]).ok_or(TransformError::MissingColumn("threat"))?,
            tags: raw.column(&["tags"]),
            urlhaus_link: raw.column(&["urlhaus_link"]),
            reporter: raw.column(&["reporter"]),
        })
    }

    fn record(&self, row: &[String]) -> ThreatRecord {
        let url = field(row, Some(self.url));
        let threat = field(row, Some(self.threat));
        let domain_or_ip = match url.as_deref().map(extract_host) {
            Some(HostExtraction::Parsed(host)) => host,
            Some(HostExtraction::Unparseable) | None => UNKNOWN_HOST.to_string(),
        };
        let risk_level = RiskLevel::classify(threat.as_deref().unwrap_or_default());
        ThreatRecord {
            id: field(row, self.id),
            dateadded: field(row, self.dateadded).as_deref().and_then(parse_timestamp),
            url,
            url_status: field(row, self.url_status),
            last_online: field(row, self.last_online).as_deref().and_then(parse_timestamp),
            threat,
            tags: field(row, self.tags).unwrap_or_else(|| NO_TAGS.to_string()),
            urlhaus_link: field(row, self.urlhaus_link),
            reporter: field(row, self.reporter),
            domain_or_ip,
            risk_level,
        }
    }
}

// Empty cells read as absent, matching how the feed leaves optional fields blank.
fn field(row: &[String], idx: Option<usize>) -> Option<String> {
    let v = row.get(idx?)?.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

/// Clean and enrich every feed row. The raw table is left untouched.
pub fn transform_threats(raw: &RawFeed) -> Result<Vec<ThreatRecord>, TransformError> {
    let cols = Columns::resolve(raw)?;
    Ok(raw.rows.iter().map(|row| cols.record(row)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_feed, DEFAULT_SKIP_LINES, FIXTURE};
    use time::macros::datetime;

    fn fixture_threats() -> Vec<ThreatRecord> {
        let raw = parse_feed(FIXTURE, DEFAULT_SKIP_LINES).unwrap();
        transform_threats(&raw).unwrap()
    }

    #[test]
    fn host_strips_port() {
        assert_eq!(extract_host("http://203.0.113.5:8080/x"), HostExtraction::Parsed("203.0.113.5".into()));
        assert_eq!(extract_host("https://dl.sharedrop.test:8443/doc.zip"), HostExtraction::Parsed("dl.sharedrop.test".into()));
        assert_eq!(extract_host("http://[2001:db8::1]:80/p"), HostExtraction::Parsed("2001:db8::1".into()));
    }

    #[test]
    fn host_is_lowercased_and_punycoded() {
        assert_eq!(extract_host("http://Evil.EXAMPLE.com/x"), HostExtraction::Parsed("evil.example.com".into()));
        assert_eq!(extract_host("http://bücher.test/x"), HostExtraction::Parsed("xn--bcher-kva.test".into()));
    }

    #[test]
    fn host_unparseable() {
        assert_eq!(extract_host("not a url"), HostExtraction::Unparseable);
        assert_eq!(extract_host(""), HostExtraction::Unparseable);
        assert_eq!(extract_host("mailto:someone@example.test"), HostExtraction::Unparseable);
    }

    #[test]
    fn timestamps_coerce() {
        assert_eq!(parse_timestamp("2024-05-01 09:58:12"), Some(datetime!(2024-05-01 09:58:12)));
        assert_eq!(parse_timestamp("2024-05-01T11:58:12+02:00"), Some(datetime!(2024-05-01 09:58:12)));
        assert_eq!(parse_timestamp("2024-05-01T09:58:12"), Some(datetime!(2024-05-01 09:58:12)));
        assert_eq!(parse_timestamp("2024-05-01"), Some(datetime!(2024-05-01 00:00:00)));
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp("2024-13-40 99:00:00"), None);
        assert_eq!(parse_timestamp("  "), None);
    }

    #[test]
    fn id_header_renamed() {
        let threats = fixture_threats();
        assert_eq!(threats[0].id.as_deref(), Some("2801001"));
    }

    #[test]
    fn sentinels_always_populated() {
        let threats = fixture_threats();
        assert_eq!(threats.len(), 8);
        for t in &threats {
            assert!(!t.tags.is_empty());
            assert!(!t.domain_or_ip.is_empty());
        }
        assert_eq!(threats[1].tags, NO_TAGS);
        assert_eq!(threats[3].domain_or_ip, UNKNOWN_HOST);
        assert_eq!(threats[0].domain_or_ip, "203.0.113.5");
    }

    #[test]
    fn risk_levels_follow_threat() {
        let threats = fixture_threats();
        let levels: Vec<RiskLevel> = threats.iter().map(|t| t.risk_level).collect();
        assert_eq!(levels[0], RiskLevel::High);
        assert_eq!(levels[1], RiskLevel::Medium);
        assert_eq!(levels[2], RiskLevel::High);
        assert_eq!(levels[3], RiskLevel::Low);
    }

    #[test]
    fn bad_and_empty_dates_are_null() {
        let threats = fixture_threats();
        assert_eq!(threats[3].dateadded, None);
        assert_eq!(threats[1].last_online, None);
        assert_eq!(threats[0].dateadded, Some(datetime!(2024-05-01 09:58:12)));
    }

    #[test]
    fn extra_columns_pass_through() {
        let threats = fixture_threats();
        assert_eq!(threats[0].url_status.as_deref(), Some("online"));
        assert_eq!(threats[0].reporter.as_deref(), Some("r3dbU7z"));
    }

    #[test]
    fn transform_is_repeatable() {
        let raw = parse_feed(FIXTURE, DEFAULT_SKIP_LINES).unwrap();
        let a = transform_threats(&raw).unwrap();
        let b = transform_threats(&raw).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_threat_column_rejected() {
        let raw = parse_feed("id,url\n1,http://a.test/\n", 0).unwrap();
        let err = transform_threats(&raw).unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn("threat")));
    }

    #[test]
    fn absent_optional_columns_read_as_null() {
        let raw = parse_feed("url,threat\nhttp://a.test/x,phishing\n", 0).unwrap();
        let t = &transform_threats(&raw).unwrap()[0];
        assert_eq!(t.id, None);
        assert_eq!(t.tags, NO_TAGS);
        assert_eq!(t.dateadded, None);
        assert_eq!(t.domain_or_ip, "a.test");
        assert_eq!(t.risk_level, RiskLevel::Medium);
    }
}
