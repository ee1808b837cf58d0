use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub browser: BrowserSettings,
    pub search: SearchConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub navigation_timeout_ms: u64,
    pub ready_timeout_ms: u64,
    pub settle_ms: u64,
}

/// Search-index (SerpApi) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub engine: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Output sink configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub concurrency: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            navigation_timeout_ms: 60_000,
            ready_timeout_ms: 8_000,
            settle_ms: 5_000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search".to_string(),
            engine: "google".to_string(),
            api_key: None,
            timeout_secs: 30,
            user_agent: "pharma-quote/0.1 (price comparison research)".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { concurrency: 3 }
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("PHARMA").separator("__"))
            .build()?;

        let mut app_cfg: AppConfig = cfg.try_deserialize().context("Invalid configuration")?;

        if app_cfg.search.api_key.is_none() {
            app_cfg.search.api_key = std::env::var("SERPAPI_KEY").ok();
        }
        app_cfg.search.api_key = app_cfg.search.api_key.filter(|k| !k.trim().is_empty());

        Ok(app_cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert!(cfg.browser.headless);
        assert_eq!(cfg.browser.navigation_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.browser.ready_timeout(), Duration::from_secs(8));
        assert_eq!(cfg.browser.settle_delay(), Duration::from_secs(5));
        assert_eq!(cfg.search.endpoint, "https://serpapi.com/search");
        assert!(cfg.search.api_key.is_none());
        assert_eq!(cfg.pipeline.concurrency, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[browser]\nsettle_ms = 0\n\n[search]\napi_key = \"k\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.browser.settle_ms, 0);
        assert_eq!(cfg.browser.ready_timeout_ms, 8_000);
        assert_eq!(cfg.search.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.output.dir, PathBuf::from("data"));
    }
}
