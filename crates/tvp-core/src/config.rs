//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server, upstream, scheduler and provider settings. Every section defaults
//! sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// Refresh cadence used when a provider does not set its own.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60 * 60;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub scheduler: SchedulerConfig,
    /// Directory under which each provider writes its generated EPG files.
    pub data_dir: PathBuf,
    pub providers: Vec<ProviderConfig>,
    /// Provider whose guide is served at `/epg.xml` and `/epg-{region}.xml`.
    /// Falls back to the first configured provider.
    pub default_provider: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            scheduler: SchedulerConfig::default(),
            data_dir: PathBuf::from("./data"),
            providers: Vec::new(),
            default_provider: None,
        }
    }
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str).map_err(|e| Error::Config(format!("parse error: {e}")))
    }

    /// Load configuration from a file, failing if it cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Name of the provider behind the top-level guide routes.
    pub fn fallback_provider(&self) -> Option<&str> {
        self.default_provider
            .as_deref()
            .or_else(|| self.providers.first().map(|p| p.name.as_str()))
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.scheduler.tick_millis == 0 || self.scheduler.tick_millis >= 1000 {
            warnings.push(format!(
                "scheduler.tick_millis is {}; expected a sub-second tick",
                self.scheduler.tick_millis
            ));
        }

        if self.scheduler.max_consecutive_faults == 0 {
            warnings.push("scheduler.max_consecutive_faults is 0; treated as 1".into());
        }

        if self.providers.is_empty() {
            warnings.push("no providers configured; EPG refresh is disabled".into());
        }

        let mut seen = std::collections::HashSet::new();
        for (i, provider) in self.providers.iter().enumerate() {
            if provider.name.is_empty() {
                warnings.push(format!("providers[{i}].name is empty"));
            } else if !seen.insert(provider.name.as_str()) {
                warnings.push(format!(
                    "providers[{i}].name '{}' is a duplicate",
                    provider.name
                ));
            }
            if provider.epg_url.is_empty() {
                warnings.push(format!("providers[{i}].epg_url is empty"));
            }
            if provider.refresh_interval_secs == Some(0) {
                warnings.push(format!("providers[{i}].refresh_interval_secs is 0"));
            }
        }

        if let Some(name) = &self.default_provider {
            if !self.providers.iter().any(|p| &p.name == name) {
                warnings.push(format!(
                    "default_provider '{name}' is not a configured provider"
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7777,
        }
    }
}

/// Timeouts and identity used for upstream manifest and segment fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub connect_timeout_secs: u64,
    pub manifest_timeout_secs: u64,
    /// Bounds the whole segment transfer, body streaming included.
    pub segment_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            manifest_timeout_secs: 15,
            segment_timeout_secs: 60,
            user_agent: concat!("tvproxy/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn manifest_timeout(&self) -> Duration {
        Duration::from_secs(self.manifest_timeout_secs)
    }

    pub fn segment_timeout(&self) -> Duration {
        Duration::from_secs(self.segment_timeout_secs)
    }
}

/// Timing knobs for the provider schedulers and their supervisors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Steady-state loop tick.
    pub tick_millis: u64,
    /// Delay between failed initial refresh attempts.
    pub init_retry_secs: u64,
    /// How often a supervisor checks whether its scheduler unit is still alive.
    pub supervisor_poll_secs: u64,
    /// Consecutive loop faults after which a scheduler unit gives up.
    pub max_consecutive_faults: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_millis: 500,
            init_retry_secs: 10,
            supervisor_poll_secs: 15 * 60,
            max_consecutive_faults: 3,
        }
    }
}

/// One EPG content provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    /// Source of the provider's XMLTV guide.
    pub epg_url: String,
    /// Periodic refresh cadence; [`DEFAULT_REFRESH_INTERVAL_SECS`] when unset.
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn cadence(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 7777);
        assert_eq!(cfg.scheduler.tick_millis, 500);
        assert_eq!(cfg.scheduler.init_retry_secs, 10);
        assert_eq!(cfg.scheduler.supervisor_poll_secs, 900);
        assert_eq!(cfg.scheduler.max_consecutive_faults, 3);
        assert_eq!(cfg.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.server.port, 7777);
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn parse_providers() {
        let json = r#"{
            "server": {"port": 9090},
            "providers": [
                {"name": "plex", "epg_url": "http://epg.example/plex.xml", "refresh_interval_secs": 600},
                {"name": "pluto", "epg_url": "http://epg.example/pluto.xml"}
            ]
        }"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.providers.len(), 2);
        assert_eq!(cfg.providers[0].cadence(), Duration::from_secs(600));
        assert_eq!(
            cfg.providers[1].cadence(),
            Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS)
        );
    }

    #[test]
    fn invalid_json_is_config_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.server.port, 7777);
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/tvproxy.json")));
        assert_eq!(cfg.server.port, 7777);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"data_dir": "/var/lib/tvproxy"}"#).unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/tvproxy"));
    }

    #[test]
    fn no_providers_warns() {
        let warnings = Config::default().validate();
        assert!(warnings.iter().any(|w| w.contains("no providers")));
    }

    #[test]
    fn duplicate_provider_warns() {
        let mut cfg = Config::default();
        for _ in 0..2 {
            cfg.providers.push(ProviderConfig {
                name: "plex".into(),
                epg_url: "http://epg.example/plex.xml".into(),
                refresh_interval_secs: None,
            });
        }
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("duplicate")));
    }

    #[test]
    fn default_provider_falls_back_to_first() {
        let mut cfg = Config::from_json(
            r#"{"providers": [
                {"name": "plex", "epg_url": "http://a/plex.xml"},
                {"name": "pluto", "epg_url": "http://a/pluto.xml"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(cfg.fallback_provider(), Some("plex"));

        cfg.default_provider = Some("pluto".into());
        assert_eq!(cfg.fallback_provider(), Some("pluto"));
        assert!(!cfg.validate().iter().any(|w| w.contains("default_provider")));

        cfg.default_provider = Some("tubi".into());
        assert!(cfg.validate().iter().any(|w| w.contains("default_provider 'tubi'")));

        assert_eq!(Config::default().fallback_provider(), None);
    }

    #[test]
    fn slow_tick_warns() {
        let mut cfg = Config::default();
        cfg.scheduler.tick_millis = 5000;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("sub-second")));
    }
}
