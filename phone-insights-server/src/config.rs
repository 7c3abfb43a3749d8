use anyhow::{bail, Result};
use config::{Config as ConfigLoader, Environment, File};
use phone_insights_api::{
    observability::{LogConfig, LogFormat},
    performance::CacheConfig,
    resilience::{CircuitBreakerConfig, TimeoutConfig},
    GatewayConfig,
};
use phone_insights_client::UpstreamConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "PHONE_INSIGHTS";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    /// Falls back to pretty in debug builds and json in release
    pub log_format: Option<LogFormat>,
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
    pub breaker: BreakerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub default_ttl_secs: u64,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: usize,
    pub cool_down_secs: u64,
}

impl Config {
    /// Layered load: `config/default`, `config/local`, then `PHONE_INSIGHTS_*`
    /// environment variables (`PHONE_INSIGHTS_UPSTREAM__BASE_URL`).
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(root: &Path) -> Result<Self> {
        let config = ConfigLoader::builder()
            .add_source(File::from(root.join("config/default")).required(false))
            .add_source(File::from(root.join("config/local")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would leave a component unable to work.
    pub fn validate(&self) -> Result<()> {
        if self.breaker.failure_threshold == 0 {
            bail!("breaker.failure_threshold must be greater than 0");
        }
        if self.upstream.timeout_secs == 0 {
            bail!("upstream.timeout_secs must be greater than 0");
        }
        if self.upstream.health_timeout_secs == 0 {
            bail!("upstream.health_timeout_secs must be greater than 0");
        }
        Ok(())
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            format: self.log_format.unwrap_or_default(),
            level: self.log_level.clone(),
            filter: None,
        }
    }

    pub fn upstream_config(&self) -> UpstreamConfig {
        let config = UpstreamConfig::new(self.upstream.base_url.clone())
            .with_timeout(Duration::from_secs(self.upstream.timeout_secs))
            .with_health_timeout(Duration::from_secs(self.upstream.health_timeout_secs));

        match &self.upstream.api_key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        }
    }

    pub fn cache_config(&self) -> Result<CacheConfig> {
        Ok(CacheConfig::builder()
            .default_ttl(Duration::from_secs(self.cache.default_ttl_secs))
            .max_entries(self.cache.max_entries)
            .build()?)
    }

    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.breaker.failure_threshold,
            cool_down: Duration::from_secs(self.breaker.cool_down_secs),
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        let upstream = Duration::from_secs(self.upstream.timeout_secs);
        let health = Duration::from_secs(self.upstream.health_timeout_secs);

        GatewayConfig {
            default_ttl: Duration::from_secs(self.cache.default_ttl_secs),
            timeouts: TimeoutConfig::new(upstream).with_operation("health", health),
            ..GatewayConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            log_level: "info".to_string(),
            log_format: None,
            upstream: UpstreamSettings::default(),
            cache: CacheSettings::default(),
            breaker: BreakerSettings::default(),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            health_timeout_secs: 3,
            api_key: None,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl_secs: 300,
            max_entries: 10_000,
        }
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::fs;

    fn clear_env() {
        for key in [
            "PHONE_INSIGHTS_PORT",
            "PHONE_INSIGHTS_UPSTREAM__BASE_URL",
            "PHONE_INSIGHTS_BREAKER__FAILURE_THRESHOLD",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_sources() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();

        let config = Config::load_from(dir.path()).unwrap();

        assert_eq!(config.port, 3001);
        assert_eq!(config.upstream.base_url, "http://localhost:8000");
        assert_eq!(config.cache.default_ttl_secs, 300);
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.cool_down_secs, 30);
        assert_eq!(config.log_format, None);
    }

    #[test]
    #[serial]
    fn test_file_then_local_override() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config/default.toml"),
            "port = 8080\nlog_format = \"json\"\n\n[upstream]\nbase_url = \"http://ml:8000\"\n\n[cache]\nmax_entries = 50\n",
        )
        .unwrap();
        fs::write(dir.path().join("config/local.toml"), "port = 9090\n").unwrap();

        let config = Config::load_from(dir.path()).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.log_format, Some(LogFormat::Json));
        assert_eq!(config.upstream.base_url, "http://ml:8000");
        assert_eq!(config.upstream.timeout_secs, 10);
        assert_eq!(config.cache.max_entries, 50);
        assert_eq!(config.cache.default_ttl_secs, 300);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_files() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/default.toml"), "port = 8080\n").unwrap();

        std::env::set_var("PHONE_INSIGHTS_PORT", "7000");
        std::env::set_var("PHONE_INSIGHTS_UPSTREAM__BASE_URL", "http://python-api:8000");
        std::env::set_var("PHONE_INSIGHTS_BREAKER__FAILURE_THRESHOLD", "2");

        let config = Config::load_from(dir.path());
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.upstream.base_url, "http://python-api:8000");
        assert_eq!(config.breaker.failure_threshold, 2);
    }

    #[test]
    fn test_derived_component_configs() {
        let mut config = Config::default();
        config.upstream.api_key = Some("secret".to_string());
        config.upstream.timeout_secs = 4;
        config.upstream.health_timeout_secs = 1;
        config.cache.default_ttl_secs = 60;

        let gateway = config.gateway_config();
        assert_eq!(gateway.default_ttl, Duration::from_secs(60));
        assert_eq!(gateway.timeouts.get_timeout("predict"), Duration::from_secs(4));
        assert_eq!(gateway.timeouts.get_timeout("health"), Duration::from_secs(1));

        let upstream = config.upstream_config();
        assert_eq!(upstream.timeout, Duration::from_secs(4));
        assert_eq!(upstream.health_timeout, Duration::from_secs(1));

        let breaker = config.breaker_config();
        assert_eq!(breaker.failure_threshold, 5);
        assert_eq!(breaker.cool_down, Duration::from_secs(30));

        assert_eq!(config.cache_config().unwrap().default_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_zero_cache_size_is_rejected() {
        let mut config = Config::default();
        config.cache.max_entries = 0;
        assert!(config.cache_config().is_err());
    }

    #[test]
    #[serial]
    fn test_zero_failure_threshold_is_rejected() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config/default.toml"),
            "[breaker]\nfailure_threshold = 0\n",
        )
        .unwrap();

        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("failure_threshold"));
    }

    #[test]
    #[serial]
    fn test_zero_upstream_timeout_is_rejected() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/default.toml"), "[upstream]\ntimeout_secs = 0\n").unwrap();

        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_zero_health_timeout_is_rejected() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.upstream.health_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
