//! Configuration management for gcd.
//!
//! Loads configuration from ${GCD_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable overriding `server_url`.
pub const SERVER_URL_ENV: &str = "GCD_SERVER_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for gcd configuration and data files.
    //!
    //! GCD_HOME resolution order:
    //! 1. GCD_HOME environment variable (if set)
    //! 2. ~/.config/gcd (default)

    use std::path::PathBuf;

    /// Returns the gcd home directory.
    pub fn gcd_home() -> PathBuf {
        if let Ok(home) = std::env::var("GCD_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".gcd"),
            |h| h.join(".config").join("gcd"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        gcd_home().join("config.toml")
    }

    /// Returns the path to the persisted session cookie.
    pub fn session_path() -> PathBuf {
        gcd_home().join("session.json")
    }

    /// Returns the directory for interactive-mode log files.
    pub fn logs_dir() -> PathBuf {
        gcd_home().join("logs")
    }
}

/// Backend endpoints the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Session probe.
    Entry,
    OAuthUrl,
    OAuthLogout,
    CoursesList,
    CoursesDiscover,
    CoursesDownload,
    CoursesServe,
}

impl Endpoint {
    /// Short identifier used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Entry => "entry",
            Endpoint::OAuthUrl => "oauth_url",
            Endpoint::OAuthLogout => "oauth_logout",
            Endpoint::CoursesList => "courses_list",
            Endpoint::CoursesDiscover => "courses_discover",
            Endpoint::CoursesDownload => "courses_download",
            Endpoint::CoursesServe => "courses_serve",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Endpoint paths, relative to `server_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub entry: String,
    pub oauth_url: String,
    pub oauth_logout: String,
    pub courses_list: String,
    pub courses_discover: String,
    pub courses_download: String,
    pub courses_serve: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            entry: "/".to_string(),
            oauth_url: "/oauth/url".to_string(),
            oauth_logout: "/oauth/logout".to_string(),
            courses_list: "/courses/list".to_string(),
            courses_discover: "/courses/discover".to_string(),
            courses_download: "/courses/download".to_string(),
            courses_serve: "/courses/serve".to_string(),
        }
    }
}

impl EndpointsConfig {
    /// Returns the configured path for an endpoint.
    pub fn path(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Entry => &self.entry,
            Endpoint::OAuthUrl => &self.oauth_url,
            Endpoint::OAuthLogout => &self.oauth_logout,
            Endpoint::CoursesList => &self.courses_list,
            Endpoint::CoursesDiscover => &self.courses_discover,
            Endpoint::CoursesDownload => &self.courses_download,
            Endpoint::CoursesServe => &self.courses_serve,
        }
    }
}

/// Session cookie naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "gcd_session".to_string(),
            cookie_path: "/".to_string(),
        }
    }
}

/// Per-operation timeouts in seconds (0 disables).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub request_secs: u64,
    pub export_secs: u64,
    pub download_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            export_secs: 0,
            download_secs: 0,
        }
    }
}

fn secs_to_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl TimeoutsConfig {
    pub fn request(&self) -> Option<Duration> {
        secs_to_timeout(self.request_secs)
    }

    pub fn export(&self) -> Option<Duration> {
        secs_to_timeout(self.export_secs)
    }

    pub fn download(&self) -> Option<Duration> {
        secs_to_timeout(self.download_secs)
    }
}

/// Ordering between the sign-out request and expiring the local cookie.
///
/// Navigation back to the entry state happens after both, in every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SignOutOrder {
    /// Send sign-out, then expire the cookie whatever the outcome.
    #[default]
    RequestThenClear,
    /// Expire the cookie, then send sign-out.
    ClearThenRequest,
    /// Send sign-out; expire the cookie only if it succeeded.
    ClearOnSuccess,
}

impl SignOutOrder {
    pub fn display_name(self) -> &'static str {
        match self {
            SignOutOrder::RequestThenClear => "request-then-clear",
            SignOutOrder::ClearThenRequest => "clear-then-request",
            SignOutOrder::ClearOnSuccess => "clear-on-success",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignOutConfig {
    pub order: SignOutOrder,
}

impl Default for SignOutConfig {
    fn default() -> Self {
        Self {
            order: SignOutOrder::RequestThenClear,
        }
    }
}

/// How a prepared archive reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Stream the archive to a local file.
    #[default]
    File,
    /// Hand the retrieval URL to the system browser.
    Browser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Target directory (current directory when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Fallback file name when the server does not suggest one.
    pub file_name: String,
    pub mode: DownloadMode,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: "downloaded_courses.zip".to_string(),
            mode: DownloadMode::File,
        }
    }
}

impl DownloadConfig {
    pub fn directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend API server.
    pub server_url: String,

    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub sign_out: SignOutConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: Self::DEFAULT_SERVER_URL.to_string(),
            endpoints: EndpointsConfig::default(),
            session: SessionConfig::default(),
            timeouts: TimeoutsConfig::default(),
            sign_out: SignOutConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}

impl Config {
    const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

    /// Loads configuration from the default config path, then applies
    /// environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                self.server_url = trimmed.to_string();
            }
        }
    }

    /// Resolves the absolute URL of an endpoint.
    ///
    /// # Errors
    /// Returns an error if `server_url` plus the endpoint path is not a valid URL.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        let base = self.server_url.trim_end_matches('/');
        let path = self.endpoints.path(endpoint);
        let joined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Url::parse(&joined).with_context(|| format!("Invalid URL for {endpoint}: {joined}"))
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Uses the embedded template for structure/comments and merges
    /// generated values from `Config::default()` into it.
    ///
    /// # Errors
    /// Returns an error if the template or generated values fail to parse.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let config = Config::default();
        let generated_toml =
            toml::to_string(&config).context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;

        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}
