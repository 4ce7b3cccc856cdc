use anyhow::Result;
use clap::ValueEnum;
use std::io::Write;
use threatfeed_core::{format_timestamp, ServerRecord, ThreatRecord};
use warehouse_sqlite::RunRecord;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat { Text, Json, Jsonl, Csv }

const THREAT_COLUMNS: [&str; 11] = [
    "id", "dateadded", "url", "url_status", "last_online", "threat", "tags", "urlhaus_link", "reporter", "domain_or_ip", "risk_level",
];

fn threat_json(t: &ThreatRecord) -> serde_json::Value {
    serde_json::json!({
        "id": t.id,
        "dateadded": t.dateadded.as_ref().map(format_timestamp),
        "url": t.url,
        "url_status": t.url_status,
        "last_online": t.last_online.as_ref().map(format_timestamp),
        "threat": t.threat,
        "tags": t.tags,
        "urlhaus_link": t.urlhaus_link,
        "reporter": t.reporter,
        "domain_or_ip": t.domain_or_ip,
        "risk_level": t.risk_level,
    })
}

fn threat_row(t: &ThreatRecord) -> [String; 11] {
    [
        t.id.clone().unwrap_or_default(),
        t.dateadded.as_ref().map(format_timestamp).unwrap_or_default(),
        t.url.clone().unwrap_or_default(),
        t.url_status.clone().unwrap_or_default(),
        t.last_online.as_ref().map(format_timestamp).unwrap_or_default(),
        t.threat.clone().unwrap_or_default(),
        t.tags.clone(),
        t.urlhaus_link.clone().unwrap_or_default(),
        t.reporter.clone().unwrap_or_default(),
        t.domain_or_ip.clone(),
        t.risk_level.to_string(),
    ]
}

pub fn write_threats<W: Write>(w: &mut W, threats: &[ThreatRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for t in threats {
                writeln!(
                    w,
                    "{:<8} {:<6} {:<32} {}",
                    t.id.as_deref().unwrap_or("-"),
                    t.risk_level,
                    t.domain_or_ip,
                    t.threat.as_deref().unwrap_or("-")
                )?;
            }
        }
        OutputFormat::Json => {
            let arr: Vec<serde_json::Value> = threats.iter().map(threat_json).collect();
            writeln!(w, "{}", serde_json::to_string_pretty(&arr)?)?;
        }
        OutputFormat::Jsonl => {
            for t in threats {
                writeln!(w, "{}", serde_json::to_string(&threat_json(t))?)?;
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(w);
            wtr.write_record(THREAT_COLUMNS)?;
            for t in threats {
                wtr.write_record(threat_row(t))?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

pub fn write_servers<W: Write>(w: &mut W, servers: &[ServerRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for s in servers {
                writeln!(w, "{:<8} {:<32} {:<12} {}", s.server_id, s.ip_address, s.department, s.os_version)?;
            }
        }
        OutputFormat::Json => writeln!(w, "{}", serde_json::to_string_pretty(servers)?)?,
        OutputFormat::Jsonl => {
            for s in servers {
                writeln!(w, "{}", serde_json::to_string(s)?)?;
            }
        }
        OutputFormat::Csv => {
            // Header comes from the struct's field names.
            let mut wtr = csv::Writer::from_writer(w);
            for s in servers {
                wtr.serialize(s)?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

pub fn write_runs<W: Write>(w: &mut W, runs: &[RunRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for r in runs {
                writeln!(
                    w,
                    "{} threats={} servers={} took={}ms feed={}",
                    r.run_id,
                    r.threat_count,
                    r.server_count,
                    r.finished_at - r.started_at,
                    r.feed_url
                )?;
            }
        }
        OutputFormat::Json => writeln!(w, "{}", serde_json::to_string_pretty(runs)?)?,
        OutputFormat::Jsonl => {
            for r in runs {
                writeln!(w, "{}", serde_json::to_string(r)?)?;
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(w);
            for r in runs {
                wtr.serialize(r)?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}
