use anyhow::{Context, Result};
use feed_fetch::{FetchOptions, URLHAUS_RECENT};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use threat_transform::DEFAULT_SKIP_LINES;

/// Environment variable holding the warehouse connection string.
pub const DATABASE_ENV: &str = "DATABASE_CONNECTION_STRING";

const DEFAULT_CONFIG_FILE: &str = "threatfeed.yaml";

/// Settings for one pipeline run. Built once in `main` and passed down explicitly.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EtlConfig {
    pub feed_url: String,
    pub skip_lines: usize,
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    /// Ignore proxy settings from the environment.
    pub no_proxy: bool,
    /// Fixed seed for server sampling; random when unset.
    pub seed: Option<u64>,
    pub database_url: Option<String>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            feed_url: URLHAUS_RECENT.to_string(),
            skip_lines: DEFAULT_SKIP_LINES,
            timeout_ms: None,
            user_agent: None,
            no_proxy: false,
            seed: None,
            database_url: None,
        }
    }
}

impl EtlConfig {
    /// Overlay the connection string from the environment. Blank values count as unset.
    pub fn with_env_database(mut self, value: Option<String>) -> Self {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            self.database_url = Some(v);
        }
        self
    }

    pub fn fetch_options(&self) -> FetchOptions {
        let mut opts = FetchOptions {
            timeout_ms: self.timeout_ms,
            use_env_proxy: !self.no_proxy,
            ..FetchOptions::default()
        };
        if let Some(ua) = &self.user_agent {
            opts.user_agent = ua.clone();
        }
        opts
    }
}

/// Load YAML config from `path`, or from `./threatfeed.yaml` when present.
/// An explicit path that cannot be read is an error; a missing default file is not.
pub fn load_config(path: Option<&Path>) -> Result<EtlConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG_FILE);
            if p.exists() { p.to_path_buf() } else { return Ok(EtlConfig::default()); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg: EtlConfig = serde_yaml::from_str(&s).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_point_at_urlhaus() {
        let cfg = EtlConfig::default();
        assert_eq!(cfg.feed_url, URLHAUS_RECENT);
        assert_eq!(cfg.skip_lines, 8);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn yaml_overrides_some_fields() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "seed: 42\ndatabase_url: sqlite:///tmp/tf.db\ntimeout_ms: 2500").unwrap();
        let cfg = load_config(Some(f.path())).unwrap();
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.database_url.as_deref(), Some("sqlite:///tmp/tf.db"));
        assert_eq!(cfg.fetch_options().timeout_ms, Some(2500));
        assert_eq!(cfg.feed_url, URLHAUS_RECENT);
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn env_database_wins_unless_blank() {
        let base = EtlConfig { database_url: Some("sqlite:a.db".into()), ..EtlConfig::default() };
        let cfg = base.clone().with_env_database(Some("sqlite:b.db".into()));
        assert_eq!(cfg.database_url.as_deref(), Some("sqlite:b.db"));
        let cfg = base.clone().with_env_database(Some("   ".into()));
        assert_eq!(cfg.database_url.as_deref(), Some("sqlite:a.db"));
        let cfg = EtlConfig::default().with_env_database(None);
        assert!(cfg.database_url.is_none());
    }
}
