use serde::Deserialize;
use std::{
    fs, io,
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

use crate::error::Error;

/// Value shipped in the sample configuration, rejected at load time.
pub const PLACEHOLDER_WEBHOOK_URL: &str = "YOUR_SLACK_WEBHOOK_URL";

/// Environment variable pointing at an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "SITEWATCH_CONFIG";

const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ALERT_THRESHOLD: NonZeroU32 = NonZeroU32::new(3).unwrap();
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_SOCKS_PROXY: &str = "socks5h://127.0.0.1:9050";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub slack_webhook_url: String,
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    pub url: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl SiteConfig {
    /// The comment as an annotation, empty when absent.
    #[must_use]
    pub fn annotation(&self) -> &str {
        self.comment.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub check_interval_secs: u64,
    pub timeout_secs: u64,
    /// Zero is rejected while deserializing.
    pub alert_threshold: NonZeroU32,
    pub report_interval_secs: u64,
    pub socks_proxy: String,
    pub accept_invalid_certs: CertPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
            socks_proxy: DEFAULT_SOCKS_PROXY.to_string(),
            accept_invalid_certs: CertPolicy::default(),
        }
    }
}

impl Settings {
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

/// Whether certificate validation is skipped, per transport path.
///
/// Both default to `true`: onion services and many monitored hosts present
/// self-signed certificates. Set `direct` to `false` to keep validation on
/// public endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CertPolicy {
    pub direct: bool,
    pub proxied: bool,
}

impl Default for CertPolicy {
    fn default() -> Self {
        Self {
            direct: true,
            proxied: true,
        }
    }
}

impl Config {
    /// Loads the configuration from the first location that exists:
    /// `$SITEWATCH_CONFIG`, `./config.json`, then the platform config dir.
    ///
    /// # Errors
    ///
    /// Returns an error if no file is found or the file fails validation.
    pub fn load() -> Result<Config, Error> {
        Self::load_from(Self::locate())
    }

    /// Loads and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns a distinct error for a missing file, invalid JSON, a missing
    /// key, a placeholder webhook URL, an empty site list, or an invalid
    /// setting.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::ConfigNotFound(path.to_path_buf()),
            _ => Error::Io(e),
        })?;

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    fn locate() -> PathBuf {
        if let Ok(path) = dotenvy::var(CONFIG_PATH_VAR) {
            return PathBuf::from(path);
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return local;
        }

        dirs::config_dir()
            .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
            .unwrap_or(local)
    }

    fn validate(&self) -> Result<(), Error> {
        let webhook = self.slack_webhook_url.trim();
        if webhook.is_empty() || webhook == PLACEHOLDER_WEBHOOK_URL {
            return Err(Error::PlaceholderWebhook);
        }
        Url::parse(webhook)?;

        if self.sites.is_empty() {
            return Err(Error::NoSites);
        }

        if self.settings.check_interval_secs == 0 {
            return Err(Error::Config(
                "check_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.settings.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".to_string()));
        }

        Ok(())
    }
}
