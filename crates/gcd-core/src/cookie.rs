//! Session cookie storage.
//!
//! The backend tracks the session through a single cookie. The store is the
//! client's stand-in for a browser cookie jar: every request reads it, and the
//! sign-out path is the only writer inside the workflow.
//!
//! Stores the cookie in `<base>/session.json` with restricted permissions (0600).
//! Cookie values are never logged or displayed in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub(crate) fn now_millis_u64() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
        .unwrap_or(u64::MAX)
}

/// A session cookie as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiry timestamp in milliseconds since epoch (session cookie when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<u64>,
}

fn default_path() -> String {
    "/".to_string()
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: path.into(),
            expires: None,
        }
    }

    /// An empty cookie whose expiry lies in the past: writing it clears the
    /// cookie of the same name and path.
    pub fn expired(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            path: path.into(),
            expires: Some(0),
        }
    }

    /// Builds a cookie from user input: either the bare value or a
    /// `name=value` pair copied from a browser.
    pub fn from_pasted(input: &str, name: &str, path: &str) -> Option<Self> {
        let input = input.trim().trim_end_matches(';').trim();
        let value = input
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
            .unwrap_or(input)
            .trim();
        if value.is_empty() || value.contains(char::is_whitespace) {
            return None;
        }
        Some(Self::new(name, value, path))
    }

    pub fn is_expired(&self) -> bool {
        self.expires.is_some_and(|at| now_millis_u64() >= at)
    }

    /// True if the cookie can authenticate a request.
    pub fn is_live(&self) -> bool {
        !self.value.is_empty() && !self.is_expired()
    }

    /// `Cookie` header value for this cookie.
    pub fn header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Returns a masked version of a cookie value for display (first 6 chars + ...).
pub fn mask_value(value: &str) -> String {
    if value.len() <= 12 {
        return "***".to_string();
    }
    let prefix: String = value.chars().take(6).collect();
    format!("{prefix}...")
}

/// Credential store shared by every network operation.
pub trait SessionStore: Send + Sync {
    /// Loads the stored cookie, live or not.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<SessionCookie>>;

    /// Replaces the stored cookie.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, cookie: &SessionCookie) -> Result<()>;

    /// Overwrites the cookie with an already-expired empty value for the
    /// same name and path.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn expire(&self, name: &str, path: &str) -> Result<()> {
        self.save(&SessionCookie::expired(name, path))
    }

    /// Returns the cookie only if it can authenticate a request.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn credential(&self) -> Result<Option<SessionCookie>> {
        Ok(self.load()?.filter(SessionCookie::is_live))
    }
}

/// File-backed store at `<base>/session.json`.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under `GCD_HOME`.
    pub fn default_location() -> Self {
        Self::new(crate::config::paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for CookieFile {
    fn load(&self) -> Result<Option<SessionCookie>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;

        let cookie = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))?;
        Ok(Some(cookie))
    }

    fn save(&self, cookie: &SessionCookie) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(cookie).context("Failed to serialize session cookie")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cookie: Mutex<Option<SessionCookie>>,
}

impl MemoryStore {
    pub fn with_cookie(cookie: SessionCookie) -> Self {
        Self {
            cookie: Mutex::new(Some(cookie)),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<SessionCookie>> {
        let guard = self
            .cookie
            .lock()
            .map_err(|_poisoned| anyhow::anyhow!("session store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, cookie: &SessionCookie) -> Result<()> {
        let mut guard = self
            .cookie
            .lock()
            .map_err(|_poisoned| anyhow::anyhow!("session store lock poisoned"))?;
        *guard = Some(cookie.clone());
        Ok(())
    }
}
