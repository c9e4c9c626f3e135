//! Harness configuration.
//!
//! The only environment-derived value is the service base URL. It is
//! resolved, in order, from an explicit override, the `REACT_APP_BACKEND_URL`
//! key of the frontend's env file, and finally a hardcoded fallback.

use bls_proto::paths;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Env file the frontend deployment writes its backend URL to.
pub const DEFAULT_ENV_FILE: &str = "/app/frontend/.env";

/// Key holding the base URL inside the env file.
pub const BASE_URL_KEY: &str = "REACT_APP_BACKEND_URL";

pub const FALLBACK_BASE_URL: &str =
    "https://44c25e8e-2b3e-4316-b962-665a2581e188.preview.emergentagent.com";

/// Upper bound on waiting for the echo frame.
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Where the base URL came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrlSource {
    /// Passed explicitly (CLI flag or constructor)
    Override,
    /// Read from an env file
    EnvFile(PathBuf),
    /// Nothing configured; hardcoded fallback
    Fallback,
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Service base URL without trailing slash; the API lives under `/api`.
    pub base_url: String,
    pub source: BaseUrlSource,
    /// Streaming endpoint path, relative to `base_url`.
    pub stream_path: String,
    pub stream_timeout: Duration,
}

impl HarnessConfig {
    /// Creates a configuration with an explicit base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize(base_url).unwrap_or_else(|| FALLBACK_BASE_URL.to_string()),
            source: BaseUrlSource::Override,
            stream_path: paths::STREAM.to_string(),
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
        }
    }

    /// Resolves the base URL from `override_url`, then `env_file`, then the
    /// fallback. Unreadable env files are logged and skipped.
    pub fn resolve(override_url: Option<&str>, env_file: &Path) -> Self {
        if let Some(url) = override_url.and_then(normalize) {
            return Self {
                base_url: url,
                ..Self::new(FALLBACK_BASE_URL)
            };
        }

        let from_file = match read_base_url(env_file) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "ignoring env file");
                None
            }
        };

        match from_file {
            Some(url) => Self {
                base_url: url,
                source: BaseUrlSource::EnvFile(env_file.to_path_buf()),
                ..Self::new(FALLBACK_BASE_URL)
            },
            None => Self {
                source: BaseUrlSource::Fallback,
                ..Self::new(FALLBACK_BASE_URL)
            },
        }
    }

    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn api_root(&self) -> String {
        format!("{}{}", self.base_url, paths::API_PREFIX)
    }
}

/// Reads [`BASE_URL_KEY`] from an env-style file.
///
/// A missing file or missing key is `Ok(None)`; a malformed file is an error.
pub fn read_base_url(env_file: &Path) -> Result<Option<String>, ConfigError> {
    let to_error = |source| ConfigError::EnvFile {
        path: env_file.to_path_buf(),
        source,
    };

    let entries = match dotenvy::from_path_iter(env_file) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => {
            debug!(path = %env_file.display(), "env file not found");
            return Ok(None);
        }
        Err(e) => return Err(to_error(e)),
    };

    for entry in entries {
        let (key, value) = entry.map_err(to_error)?;
        if key == BASE_URL_KEY {
            return Ok(normalize(&value));
        }
    }

    Ok(None)
}

fn normalize(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');
    (!url.is_empty()).then(|| url.to_string())
}
