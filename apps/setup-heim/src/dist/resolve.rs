//! Resolution of a version specifier and host into a concrete artifact.
//!
//! Resolution runs in a fixed order: architecture, then platform, then
//! version. An unsupported architecture therefore fails before any network
//! traffic. Only floating specifiers reach the release service, and they
//! reach it exactly once.

use semver::Version;
use tracing::debug;

use super::platform::{Host, VendorArch, VendorPlatform};
use super::release::ReleaseLookup;
use super::version::{VersionSpecifier, parse_strict};
use crate::errors::{Result, SetupError};

/// Name of the tool, used in artifact names and as the cache key prefix.
pub const TOOL_NAME: &str = "heim";

/// Everything needed to locate, fetch and cache one Heim build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstallInfo {
    /// Exact version to install.
    pub version: Version,
    /// Vendor architecture token.
    pub arch: VendorArch,
    /// Vendor platform token.
    pub platform: VendorPlatform,
    /// Archive download URL, derived from the three fields above.
    pub download_url: String,
}

impl ResolvedInstallInfo {
    /// Builds the info for a known version, arch and platform.
    #[must_use]
    pub fn new(
        base_url: &str,
        version: Version,
        arch: VendorArch,
        platform: VendorPlatform,
    ) -> Self {
        let download_url = download_url(base_url, &version, arch, platform);
        Self {
            version,
            arch,
            platform,
            download_url,
        }
    }

    /// The version string used in cache keys and artifact names.
    #[must_use]
    pub fn resolved_version(&self) -> String {
        self.version.to_string()
    }

    /// The archive file name, e.g. `heim_1.1.1_x86_64_linux.tar.gz`.
    #[must_use]
    pub fn archive_name(&self) -> String {
        archive_name(&self.version, self.arch, self.platform)
    }
}

fn archive_name(version: &Version, arch: VendorArch, platform: VendorPlatform) -> String {
    format!(
        "{TOOL_NAME}_{version}_{arch}_{platform}.{}",
        platform.archive_extension()
    )
}

/// Builds the download URL for an artifact.
///
/// `{base}/download?file=heim_{version}_{arch}_{platform}.{ext}&major=v{major}`
#[must_use]
pub fn download_url(
    base_url: &str,
    version: &Version,
    arch: VendorArch,
    platform: VendorPlatform,
) -> String {
    format!(
        "{base_url}/download?file={}&major=v{}",
        archive_name(version, arch, platform),
        version.major
    )
}

/// Turns a specifier and host into a [`ResolvedInstallInfo`].
pub struct Resolver<'a> {
    lookup: &'a dyn ReleaseLookup,
    base_url: &'a str,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver that builds download URLs under `base_url`.
    #[must_use]
    pub fn new(lookup: &'a dyn ReleaseLookup, base_url: &'a str) -> Self {
        Self { lookup, base_url }
    }

    /// Resolves `specifier` for `host`.
    ///
    /// # Errors
    ///
    /// - [`SetupError::UnsupportedArchitecture`] when the host arch has no build
    /// - [`SetupError::VersionNotFound`] when a floating specifier has no release
    /// - [`SetupError::MalformedVersion`] when a version string is not strict semver
    /// - transport errors from the release lookup
    pub async fn resolve(&self, specifier: &str, host: &Host) -> Result<ResolvedInstallInfo> {
        let arch = VendorArch::from_host(&host.arch)?;
        let platform = VendorPlatform::from_host(&host.os);
        let version = self.resolve_version(specifier).await?;

        let info = ResolvedInstallInfo::new(self.base_url, version, arch, platform);
        debug!("DownloadUrl: {}", info.download_url);
        Ok(info)
    }

    async fn resolve_version(&self, specifier: &str) -> Result<Version> {
        match VersionSpecifier::parse(specifier)? {
            VersionSpecifier::Exact(version) => Ok(version),
            VersionSpecifier::Floating(spec) => {
                let record = self
                    .lookup
                    .find_release(&spec)
                    .await?
                    .ok_or_else(|| SetupError::version_not_found(spec.as_str()))?;
                debug!("{spec} resolved to {}", record.version);
                parse_strict(&record.version)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::release::ReleaseRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const BASE: &str = "https://cloud.heim.dev/heim";

    /// Records every specifier it is asked about and answers from a fixed map.
    #[derive(Default)]
    struct RecordingLookup {
        answer: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingLookup {
        fn answering(version: &str) -> Self {
            Self {
                answer: Some(version.to_string()),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReleaseLookup for RecordingLookup {
        async fn find_release(&self, specifier: &str) -> Result<Option<ReleaseRecord>> {
            self.calls.lock().unwrap().push(specifier.to_string());
            Ok(self.answer.as_ref().map(|version| ReleaseRecord {
                name: TOOL_NAME.to_string(),
                version: version.clone(),
                date: "2024-05-02".to_string(),
                assets: Vec::new(),
            }))
        }
    }

    #[tokio::test]
    async fn literal_version_skips_lookup() {
        let lookup = RecordingLookup::answering("9.9.9");
        let info = Resolver::new(&lookup, BASE)
            .resolve("1.1.1", &Host::new("x64", "linux"))
            .await
            .unwrap();

        assert_eq!(info.version, Version::new(1, 1, 1));
        assert_eq!(info.arch, VendorArch::X86_64);
        assert_eq!(info.platform, VendorPlatform::Linux);
        assert_eq!(
            info.download_url,
            "https://cloud.heim.dev/heim/download?file=heim_1.1.1_x86_64_linux.tar.gz&major=v1"
        );
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn floating_specifiers_are_looked_up_once() {
        for spec in ["current", "latest", "v1"] {
            let lookup = RecordingLookup::answering("1.1.1");
            let info = Resolver::new(&lookup, BASE)
                .resolve(spec, &Host::new("x64", "linux"))
                .await
                .unwrap();

            assert_eq!(info.resolved_version(), "1.1.1");
            assert_eq!(lookup.calls(), vec![spec.to_string()]);
        }
    }

    #[tokio::test]
    async fn prefixed_full_version_goes_to_lookup_verbatim() {
        let lookup = RecordingLookup::answering("1.2.3");
        let info = Resolver::new(&lookup, BASE)
            .resolve("v1.2.3", &Host::new("x64", "linux"))
            .await
            .unwrap();

        assert_eq!(lookup.calls(), vec!["v1.2.3".to_string()]);
        assert_eq!(info.version, Version::new(1, 2, 3));
        assert!(info.download_url.ends_with("heim_1.2.3_x86_64_linux.tar.gz&major=v1"));
    }

    #[tokio::test]
    async fn major_tag_on_macos_arm() {
        let lookup = RecordingLookup::answering("1.1.1");
        let info = Resolver::new(&lookup, BASE)
            .resolve("v1", &Host::new("arm64", "darwin"))
            .await
            .unwrap();

        assert!(
            info.download_url
                .ends_with("file=heim_1.1.1_aarch64_macos.tar.gz&major=v1"),
            "unexpected url {}",
            info.download_url
        );
    }

    #[tokio::test]
    async fn windows_gets_zip_archive() {
        let lookup = RecordingLookup::default();
        let info = Resolver::new(&lookup, BASE)
            .resolve("2.0.3", &Host::new("x64", "win32"))
            .await
            .unwrap();

        assert_eq!(info.archive_name(), "heim_2.0.3_x86_64_windows.zip");
        assert!(info.download_url.ends_with(".zip&major=v2"));
    }

    #[tokio::test]
    async fn unofficial_platform_installs_linux_build() {
        let lookup = RecordingLookup::default();
        let info = Resolver::new(&lookup, BASE)
            .resolve("1.1.1", &Host::new("arm64", "openbsd"))
            .await
            .unwrap();

        assert_eq!(info.platform, VendorPlatform::Linux);
        assert_eq!(info.archive_name(), "heim_1.1.1_aarch64_linux.tar.gz");
    }

    #[tokio::test]
    async fn unsupported_arch_fails_before_lookup() {
        let lookup = RecordingLookup::answering("1.1.1");
        let err = Resolver::new(&lookup, BASE)
            .resolve("latest", &Host::new("ppc64", "linux"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unsupported architecture 'ppc64'");
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_release_echoes_specifier() {
        let lookup = RecordingLookup::default();
        let err = Resolver::new(&lookup, BASE)
            .resolve("v01", &Host::new("x64", "linux"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unabled to find a version matching v01");
    }

    #[tokio::test]
    async fn malformed_literal_is_rejected_without_lookup() {
        let lookup = RecordingLookup::default();
        let err = Resolver::new(&lookup, BASE)
            .resolve("invalid", &Host::new("x64", "linux"))
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::MalformedVersion { .. }));
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_remote_version_is_rejected() {
        let lookup = RecordingLookup::answering("one.two");
        let err = Resolver::new(&lookup, BASE)
            .resolve("current", &Host::new("x64", "linux"))
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::MalformedVersion { version, .. } if version == "one.two"));
    }

    #[tokio::test]
    async fn resolution_is_deterministic() {
        let lookup = RecordingLookup::answering("3.4.5");
        let resolver = Resolver::new(&lookup, BASE);
        let host = Host::new("arm64", "linux");

        let first = resolver.resolve("v3", &host).await.unwrap();
        let second = resolver.resolve("v3", &host).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.download_url.as_bytes(), second.download_url.as_bytes());
    }

    #[test]
    fn url_is_a_function_of_version_arch_and_platform() {
        let v = Version::new(1, 1, 1);
        assert_eq!(
            download_url(BASE, &v, VendorArch::Aarch64, VendorPlatform::Windows),
            "https://cloud.heim.dev/heim/download?file=heim_1.1.1_aarch64_windows.zip&major=v1"
        );
        assert_ne!(
            download_url(BASE, &v, VendorArch::X86_64, VendorPlatform::Linux),
            download_url(BASE, &v, VendorArch::Aarch64, VendorPlatform::Linux),
        );
    }
}
