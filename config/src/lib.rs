//! Configuration loading for carvote.
//!
//! The only environment-derived setting is the backend base address
//! ([`BACKEND_URL_ENV`]). Everything else comes from an optional TOML file:
//!
//! ```toml
//! [backend]
//! url = "http://localhost:8001/api"
//! timeout_secs = 10
//!
//! [session]
//! advance_delay_ms = 3000
//! refetch_delay_ms = 500
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Environment variable selecting the backend base address.
pub const BACKEND_URL_ENV: &str = "CARVOTE_BACKEND_URL";

/// Backend address used when neither the environment nor the config file sets one.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001/api";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ADVANCE_DELAY_MS: u64 = 3000;
pub const DEFAULT_REFETCH_DELAY_MS: u64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct CarvoteConfig {
    pub backend: Option<BackendConfig>,
    pub session: Option<SessionSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionSettings {
    /// How long a vote result stays on screen before the next car loads.
    pub advance_delay_ms: Option<u64>,
    /// Pause between seeding an empty store and fetching again.
    pub refetch_delay_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl CarvoteConfig {
    /// Load `~/.carvote/config.toml`. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .backend
            .as_ref()
            .and_then(|backend| backend.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    #[must_use]
    pub fn advance_delay(&self) -> Duration {
        let ms = self
            .session
            .as_ref()
            .and_then(|session| session.advance_delay_ms)
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_ADVANCE_DELAY_MS);
        Duration::from_millis(ms)
    }

    #[must_use]
    pub fn refetch_delay(&self) -> Duration {
        let ms = self
            .session
            .as_ref()
            .and_then(|session| session.refetch_delay_ms)
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_REFETCH_DELAY_MS);
        Duration::from_millis(ms)
    }

    fn backend_url(&self) -> Option<&str> {
        self.backend
            .as_ref()
            .and_then(|backend| backend.url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".carvote").join("config.toml"))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("invalid backend url '{raw}': {reason}")]
    Invalid { raw: String, reason: String },
    #[error("backend url must use http or https (got {0})")]
    UnsupportedScheme(String),
}

/// Validated backend base address.
///
/// Always an http(s) URL whose path ends in `/`, so endpoint paths can be
/// appended as segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrl(Url);

impl BackendUrl {
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let trimmed = raw.trim();
        let mut url = Url::parse(trimmed).map_err(|e| UrlError::Invalid {
            raw: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self(url))
    }

    #[must_use]
    pub fn local_default() -> Self {
        Self::parse(DEFAULT_BACKEND_URL).unwrap_or_else(|_| unreachable!("default url is valid"))
    }

    /// Build the URL for `segments` below the base path.
    ///
    /// Segments are percent-encoded individually, so opaque ids containing
    /// `/` or `?` stay within a single path segment.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.0.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl fmt::Display for BackendUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Pick the backend address: environment, then config file, then the local default.
///
/// An empty environment value counts as unset.
pub fn resolve_backend_url(
    env_value: Option<&str>,
    config: Option<&CarvoteConfig>,
) -> Result<BackendUrl, UrlError> {
    if let Some(raw) = env_value.map(str::trim).filter(|v| !v.is_empty()) {
        return BackendUrl::parse(raw);
    }
    if let Some(raw) = config.and_then(CarvoteConfig::backend_url) {
        return BackendUrl::parse(raw);
    }
    Ok(BackendUrl::local_default())
}
