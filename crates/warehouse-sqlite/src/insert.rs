use crate::models::now_ms;
use crate::schema::{INSERT_SERVER, INSERT_THREAT, REPLACE_SERVERS, REPLACE_THREATS};
use crate::{LoadSummary, RunMeta, Warehouse};
use anyhow::Result;
use rusqlite::params;
use threatfeed_core::{format_timestamp, ServerRecord, ThreatRecord, SERVERS_TABLE, THREATS_TABLE};

impl Warehouse {
    /// Replace both destination tables and record the run, all in one transaction.
    ///
    /// Any failure rolls back everything, so readers never see a fresh
    /// `active_threats` next to a stale `internal_servers`.
    pub fn full_refresh(&mut self, threats: &[ThreatRecord], servers: &[ServerRecord], meta: &RunMeta) -> Result<LoadSummary> {
        let tx = self.conn.transaction()?;

        tracing::info!(table = THREATS_TABLE, rows = threats.len(), "Loading table");
        tx.execute_batch(REPLACE_THREATS)?;
        {
            let mut stmt = tx.prepare(INSERT_THREAT)?;
            for t in threats {
                stmt.execute(params![
                    t.id,
                    t.dateadded.as_ref().map(format_timestamp),
                    t.url,
                    t.url_status,
                    t.last_online.as_ref().map(format_timestamp),
                    t.threat,
                    t.tags,
                    t.urlhaus_link,
                    t.reporter,
                    t.domain_or_ip,
                    t.risk_level.as_str(),
                ])?;
            }
        }

        tracing::info!(table = SERVERS_TABLE, rows = servers.len(), "Loading table");
        tx.execute_batch(REPLACE_SERVERS)?;
        {
            let mut stmt = tx.prepare(INSERT_SERVER)?;
            for s in servers {
                stmt.execute(params![s.server_id, s.ip_address, s.department, s.os_version])?;
            }
        }

        tx.execute(
            "INSERT INTO etl_runs(run_id,started_at,finished_at,tool_version,feed_url,threat_count,server_count) VALUES (?,?,?,?,?,?,?)",
            params![
                meta.run_id.to_string(),
                meta.started_at,
                now_ms(),
                meta.tool_version,
                meta.feed_url,
                threats.len() as i64,
                servers.len() as i64,
            ],
        )?;
        tx.commit()?;

        Ok(LoadSummary { run_id: meta.run_id, threat_rows: threats.len(), server_rows: servers.len() })
    }
}
