use crate::{RunRecord, Warehouse};
use anyhow::{bail, Result};

impl Warehouse {
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let cnt: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?",
            [name],
            |r| r.get(0),
        )?;
        Ok(cnt > 0)
    }

    /// Row count of an existing table. Unknown names are rejected before any SQL is built.
    pub fn row_count(&self, table: &str) -> Result<i64> {
        if !self.table_exists(table)? {
            bail!("no such table: {table}");
        }
        let n: i64 = self.conn.query_row(&format!("SELECT COUNT(1) FROM \"{table}\""), [], |r| r.get(0))?;
        Ok(n)
    }

    /// Most recent runs first.
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id,started_at,finished_at,tool_version,feed_url,threat_count,server_count FROM etl_runs ORDER BY started_at DESC, run_id DESC LIMIT ?",
        )?;
        let rows = stmt.query_map([limit as i64], |r| {
            Ok(RunRecord {
                run_id: r.get(0)?,
                started_at: r.get(1)?,
                finished_at: r.get(2)?,
                tool_version: r.get(3)?,
                feed_url: r.get(4)?,
                threat_count: r.get(5)?,
                server_count: r.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
