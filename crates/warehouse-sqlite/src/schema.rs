pub const MIG_0001_RUNS: &str = r#"
BEGIN;

CREATE TABLE etl_runs (
  run_id          TEXT PRIMARY KEY,
  started_at      INTEGER NOT NULL,
  finished_at     INTEGER NOT NULL,
  tool_version    TEXT NOT NULL,
  feed_url        TEXT NOT NULL,
  threat_count    INTEGER NOT NULL,
  server_count    INTEGER NOT NULL
);

CREATE INDEX idx_runs_started ON etl_runs(started_at);

COMMIT;
"#
;

// Destination tables are rebuilt from scratch on every load.
pub const REPLACE_THREATS: &str = r#"
DROP TABLE IF EXISTS active_threats;
CREATE TABLE active_threats (
  id              TEXT,
  dateadded       TEXT,
  url             TEXT,
  url_status      TEXT,
  last_online     TEXT,
  threat          TEXT,
  tags            TEXT NOT NULL,
  urlhaus_link    TEXT,
  reporter        TEXT,
  domain_or_ip    TEXT NOT NULL,
  risk_level      TEXT NOT NULL CHECK (risk_level IN ('High','Medium','Low'))
);
"#;

pub const REPLACE_SERVERS: &str = r#"
DROP TABLE IF EXISTS internal_servers;
CREATE TABLE internal_servers (
  server_id       TEXT NOT NULL,
  ip_address      TEXT NOT NULL,
  department      TEXT NOT NULL,
  os_version      TEXT NOT NULL
);
"#;

pub const INSERT_THREAT: &str = "INSERT INTO active_threats(id,dateadded,url,url_status,last_online,threat,tags,urlhaus_link,reporter,domain_or_ip,risk_level) VALUES (?,?,?,?,?,?,?,?,?,?,?)";

pub const INSERT_SERVER: &str = "INSERT INTO internal_servers(server_id,ip_address,department,os_version) VALUES (?,?,?,?)";
