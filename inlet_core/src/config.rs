use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Connection settings for the hosted integration platform.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Service configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct InletConfig {
    /// Local data directory (SQLite store lives here unless overridden).
    pub data_dir: PathBuf,
    /// Explicit store path override (`INLET_DB_PATH`).
    pub db_path: Option<PathBuf>,
    pub platform: PlatformConfig,
    /// Upper bound on pages fetched per import run.
    pub import_max_pages: usize,
    /// Records returned per list page.
    pub list_page_size: usize,
}

impl InletConfig {
    #[tracing::instrument(level = "debug")]
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("INLET_DATA_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".inlet_dev"));

        let db_path = std::env::var("INLET_DB_PATH").ok().map(PathBuf::from);

        let base_url = std::env::var("INLET_PLATFORM_BASE_URL")
            .unwrap_or_else(|_| "https://api.integration.app".to_string());
        let api_key = std::env::var("INLET_PLATFORM_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let timeout_ms = std::env::var("INLET_PLATFORM_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(20_000);

        let import_max_pages = std::env::var("INLET_IMPORT_MAX_PAGES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(50);
        let list_page_size = std::env::var("INLET_LIST_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(100);

        let cfg = Self {
            data_dir,
            db_path,
            platform: PlatformConfig {
                base_url,
                api_key,
                timeout: Duration::from_millis(timeout_ms),
            },
            import_max_pages,
            list_page_size,
        };

        cfg.validate()?;
        Ok(cfg)
    }

    #[tracing::instrument(level = "debug")]
    pub fn validate(&self) -> Result<()> {
        if self.platform.base_url.trim().is_empty() {
            return Err(Error::InvalidInput("platform.base_url is empty".to_string()));
        }
        if self.platform.timeout.is_zero() {
            return Err(Error::InvalidInput(
                "platform.timeout must be > 0".to_string(),
            ));
        }
        if self.import_max_pages == 0 {
            return Err(Error::InvalidInput(
                "import_max_pages must be > 0".to_string(),
            ));
        }
        if self.list_page_size == 0 {
            return Err(Error::InvalidInput("list_page_size must be > 0".to_string()));
        }
        Ok(())
    }

    /// Effective store path: the explicit override, else `{data_dir}/records.db`.
    pub fn store_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("records.db"))
    }
}
