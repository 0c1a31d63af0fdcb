//! Paths inside an installed Heim tree.
//!
//! ```text
//! {root}/                     # cache entry for heim/{version}/{arch}
//!   heim/                     # HEIM_HOME
//!     bin/                    # appended to PATH
//!       heim-runtime[.exe]
//!       heim[.exe]
//! ```

use std::path::{Path, PathBuf};

use super::platform::VendorPlatform;

/// Environment variable pointing at the Heim home directory.
pub const HEIM_HOME_ENV: &str = "HEIM_HOME";

/// Absolute paths of one Heim installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPaths {
    /// The Heim home directory.
    pub home: PathBuf,
    /// Directory holding the executables.
    pub bin: PathBuf,
    /// The runtime executable.
    pub runtime: PathBuf,
    /// The command-line executable.
    pub cli: PathBuf,
}

impl InstalledPaths {
    /// Derives the installation paths under `root` for `platform`.
    #[must_use]
    pub fn derive(root: &Path, platform: VendorPlatform) -> Self {
        let ext = platform.executable_extension();
        let home = root.join("heim");
        let bin = home.join("bin");
        let runtime = bin.join(format!("heim-runtime{ext}"));
        let cli = bin.join(format!("heim{ext}"));
        Self {
            home,
            bin,
            runtime,
            cli,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_layout_has_no_suffix() {
        let root = Path::new("/opt/hostedtoolcache/heim/1.1.1/x86_64");
        let paths = InstalledPaths::derive(root, VendorPlatform::Linux);

        assert_eq!(paths.home, root.join("heim"));
        assert_eq!(paths.bin, root.join("heim").join("bin"));
        assert_eq!(paths.runtime, root.join("heim").join("bin").join("heim-runtime"));
        assert_eq!(paths.cli, root.join("heim").join("bin").join("heim"));
    }

    #[test]
    fn windows_executables_get_exe_suffix() {
        let root = Path::new("cache");
        let paths = InstalledPaths::derive(root, VendorPlatform::Windows);

        assert_eq!(paths.runtime.file_name().unwrap(), "heim-runtime.exe");
        assert_eq!(paths.cli.file_name().unwrap(), "heim.exe");
    }

    #[test]
    fn macos_executables_have_no_suffix() {
        let paths = InstalledPaths::derive(Path::new("cache"), VendorPlatform::Macos);

        assert_eq!(paths.runtime.file_name().unwrap(), "heim-runtime");
        assert_eq!(paths.cli.file_name().unwrap(), "heim");
    }

    #[test]
    fn executables_are_siblings_in_bin() {
        for platform in [
            VendorPlatform::Linux,
            VendorPlatform::Macos,
            VendorPlatform::Windows,
        ] {
            let paths = InstalledPaths::derive(Path::new("root"), platform);
            assert_eq!(paths.runtime.parent(), Some(paths.bin.as_path()));
            assert_eq!(paths.cli.parent(), Some(paths.bin.as_path()));
            assert_eq!(paths.bin.parent(), Some(paths.home.as_path()));
        }
    }

    #[test]
    fn derivation_depends_only_on_root_and_platform() {
        let a = InstalledPaths::derive(Path::new("/cache/heim/1.1.1/aarch64"), VendorPlatform::Macos);
        let b = InstalledPaths::derive(Path::new("/cache/heim/1.1.1/aarch64"), VendorPlatform::Macos);
        assert_eq!(a, b);
    }
}
