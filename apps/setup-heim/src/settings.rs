//! Runner configuration.
//!
//! Everything the installer needs from the process environment is read once
//! here. The rest of the crate receives a [`Settings`] value and never looks
//! at environment variables itself.
//!
//! | Variable            | Default                                   |
//! |---------------------|-------------------------------------------|
//! | `HEIM_DIST_SERVER`  | `https://cloud.heim.dev/heim`             |
//! | `RUNNER_TOOL_CACHE` | `<user cache dir>/setup-heim/tool-cache`  |
//! | `RUNNER_TEMP`       | system temp dir                           |
//! | `RUNNER_DEBUG`      | off; `1` enables debug logging            |
//! | `GITHUB_PATH`       | unset; falls back to `::add-path::`       |
//! | `GITHUB_ENV`        | unset; falls back to `::set-env::`        |
//! | `GITHUB_OUTPUT`     | unset; falls back to `::set-output::`     |

use std::path::PathBuf;

use crate::actions::CommandFiles;
use crate::errors::{Result, SetupError};

/// Environment variable overriding the release service base URL.
pub const DIST_SERVER_ENV: &str = "HEIM_DIST_SERVER";

/// Release service used when [`DIST_SERVER_ENV`] is not set.
pub const DEFAULT_DIST_SERVER: &str = "https://cloud.heim.dev/heim";

/// Root of the runner tool cache.
pub const TOOL_CACHE_ENV: &str = "RUNNER_TOOL_CACHE";
/// Runner scratch directory for downloads and extraction.
pub const TEMP_ENV: &str = "RUNNER_TEMP";
/// Set to `1` by the runner when step debug logging is on.
pub const DEBUG_ENV: &str = "RUNNER_DEBUG";

/// Configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Release service base URL, without a trailing slash.
    pub base_url: String,
    /// Root of the tool cache.
    pub tool_cache_root: PathBuf,
    /// Scratch directory for downloads and extraction.
    pub temp_dir: PathBuf,
    /// Whether the runner asked for step debug logging.
    pub debug: bool,
    /// Runner file-command targets.
    pub command_files: CommandFiles,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::MissingConfiguration`] if `RUNNER_TOOL_CACHE` is
    /// unset and no user cache directory can be determined.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`. Empty or blank values count as unset.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = var(DIST_SERVER_ENV)
            .map_or_else(|| DEFAULT_DIST_SERVER.to_string(), |url| {
                url.trim_end_matches('/').to_string()
            });

        let tool_cache_root = match var(TOOL_CACHE_ENV) {
            Some(root) => PathBuf::from(root),
            None => dirs::cache_dir()
                .ok_or(SetupError::MissingConfiguration {
                    name: "tool cache root",
                })?
                .join("setup-heim")
                .join("tool-cache"),
        };

        let temp_dir = var(TEMP_ENV).map_or_else(std::env::temp_dir, PathBuf::from);

        Ok(Self {
            base_url,
            tool_cache_root,
            temp_dir,
            debug: var(DEBUG_ENV).as_deref() == Some("1"),
            command_files: CommandFiles {
                path: var("GITHUB_PATH").map(PathBuf::from),
                env: var("GITHUB_ENV").map(PathBuf::from),
                output: var("GITHUB_OUTPUT").map(PathBuf::from),
            },
        })
    }
}
