//! Heim distribution installer.
//!
//! [`HeimDist::setup`] runs one installation request end to end:
//!
//! 1. Resolve the specifier and host into a [`ResolvedInstallInfo`]
//! 2. Look the cache key `(heim, version, arch)` up in the tool cache
//! 3. On a miss, download, extract and register the archive in the cache
//! 4. Derive [`InstalledPaths`] under the cached root
//! 5. Append the bin directory to `PATH`, then export `HEIM_HOME`
//!
//! Every step awaits the previous one; any error aborts the run.

pub mod paths;
pub mod platform;
pub mod release;
pub mod resolve;
pub mod version;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::actions::ActionEnvironment;
use crate::errors::Result;
use crate::toolcache::{Fetcher, ToolCache};

pub use paths::{HEIM_HOME_ENV, InstalledPaths};
pub use platform::Host;
pub use resolve::{ResolvedInstallInfo, Resolver, TOOL_NAME};

use release::ReleaseLookup;

/// Installs Heim through the given collaborators.
pub struct HeimDist<'a> {
    base_url: &'a str,
    lookup: &'a dyn ReleaseLookup,
    cache: &'a dyn ToolCache,
    fetcher: &'a dyn Fetcher,
    env: &'a dyn ActionEnvironment,
}

impl<'a> HeimDist<'a> {
    #[must_use]
    pub fn new(
        base_url: &'a str,
        lookup: &'a dyn ReleaseLookup,
        cache: &'a dyn ToolCache,
        fetcher: &'a dyn Fetcher,
        env: &'a dyn ActionEnvironment,
    ) -> Self {
        Self {
            base_url,
            lookup,
            cache,
            fetcher,
            env,
        }
    }

    /// Installs the release matching `specifier` for `host` and exposes it
    /// to later steps.
    ///
    /// # Errors
    ///
    /// Propagates resolution, download, extraction, cache and environment
    /// errors unchanged.
    pub async fn setup(&self, specifier: &str, host: &Host) -> Result<InstalledPaths> {
        let info = Resolver::new(self.lookup, self.base_url)
            .resolve(specifier, host)
            .await?;

        let root = match self.find_in_cache(&info) {
            Some(path) => {
                info!("Found in cache @ {}", path.display());
                path
            }
            None => self.fetch_and_install(&info).await?,
        };

        let paths = InstalledPaths::derive(&root, info.platform);
        self.expose(&paths)?;
        Ok(paths)
    }

    fn find_in_cache(&self, info: &ResolvedInstallInfo) -> Option<PathBuf> {
        self.cache
            .find(TOOL_NAME, &info.resolved_version(), info.arch.as_str())
    }

    /// Downloads, extracts and caches the archive, returning the cached root.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::SetupError::DownloadFailed`] when the server
    /// answers the download with an error status; extraction and cache
    /// errors propagate unchanged.
    pub async fn fetch_and_install(&self, info: &ResolvedInstallInfo) -> Result<PathBuf> {
        info!(
            "Acquiring {} ({} - {} - {})",
            info.archive_name(),
            info.version,
            info.arch,
            info.platform
        );
        info!("Starting download");
        let archive = self.fetcher.download_tool(&info.download_url).await?;
        info!("Download path: {}", archive.display());

        let root = self.extract_and_cache(&archive, info).await?;
        info!("Done");
        Ok(root)
    }

    async fn extract_and_cache(&self, archive: &Path, info: &ResolvedInstallInfo) -> Result<PathBuf> {
        info!("Extracting...");
        let extracted = if info.platform.is_windows() {
            self.fetcher.extract_zip(archive).await?
        } else {
            self.fetcher.extract_tar(archive).await?
        };

        info!("Adding to the cache...");
        self.cache
            .cache_dir(
                &extracted,
                TOOL_NAME,
                &info.resolved_version(),
                info.arch.as_str(),
            )
            .await
    }

    fn expose(&self, paths: &InstalledPaths) -> Result<()> {
        info!("Appending to Path");
        self.env.add_path(&paths.bin)?;

        info!("Adding {HEIM_HOME_ENV} env");
        self.env
            .export_variable(HEIM_HOME_ENV, &paths.home.to_string_lossy())?;

        debug!(
            "Paths:\n  heimHome: {}\n  bin: {}\n  runtime: {}\n  cli: {}",
            paths.home.display(),
            paths.bin.display(),
            paths.runtime.display(),
            paths.cli.display()
        );
        Ok(())
    }
}
