//! Host detection and vendor naming for Heim release artifacts.
//!
//! The host is described with the identifiers the CI runner ecosystem uses
//! (`x64`, `arm64`, `win32`, `darwin`, `linux`). Two closed tables translate
//! them into the tokens that appear in Heim artifact names:
//!
//! | host arch | vendor arch |   | host OS  | vendor platform |
//! |-----------|-------------|---|----------|-----------------|
//! | `x64`     | `x86_64`    |   | `win32`  | `windows`       |
//! | `arm64`   | `aarch64`   |   | `darwin` | `macos`         |
//! |           |             |   | `linux`  | `linux`         |
//!
//! An architecture outside the table is an error. An OS outside the table
//! installs the `linux` build, since Heim only ships three platform builds.

use std::fmt;

use tracing::debug;

use crate::errors::{Result, SetupError};

/// Host identifiers for the machine being provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// CPU architecture, e.g. `x64` or `arm64`.
    pub arch: String,
    /// Operating system, e.g. `linux`, `darwin` or `win32`.
    pub os: String,
}

impl Host {
    /// Creates a host description from explicit identifiers.
    #[must_use]
    pub fn new(arch: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            arch: arch.into(),
            os: os.into(),
        }
    }

    /// Describes the machine this binary was compiled for.
    #[must_use]
    pub fn detect() -> Self {
        Self::new(
            host_arch_name(std::env::consts::ARCH),
            host_os_name(std::env::consts::OS),
        )
    }
}

/// Translates a Rust target architecture name into the runner naming scheme.
fn host_arch_name(target_arch: &str) -> &str {
    match target_arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        "arm" => "arm",
        "powerpc64" => "ppc64",
        "s390x" => "s390x",
        other => other,
    }
}

/// Translates a Rust target OS name into the runner naming scheme.
fn host_os_name(target_os: &str) -> &str {
    match target_os {
        "windows" => "win32",
        "macos" => "darwin",
        other => other,
    }
}

/// CPU architecture token used in Heim artifact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorArch {
    /// 64-bit x86.
    X86_64,
    /// 64-bit ARM.
    Aarch64,
}

impl VendorArch {
    /// Maps a host architecture identifier to its vendor token.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::UnsupportedArchitecture`] for anything other than
    /// `x64` or `arm64`.
    pub fn from_host(arch: &str) -> Result<Self> {
        match arch {
            "x64" => Ok(Self::X86_64),
            "arm64" => Ok(Self::Aarch64),
            other => Err(SetupError::unsupported_architecture(other)),
        }
    }

    /// Returns the token as it appears in artifact names and cache keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for VendorArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system token used in Heim artifact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorPlatform {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    Macos,
    /// Linux, and the fallback for every unrecognized OS.
    Linux,
}

impl VendorPlatform {
    /// Maps a host OS identifier to its vendor token.
    ///
    /// Unrecognized systems (the BSDs, illumos, ...) get the Linux build.
    #[must_use]
    pub fn from_host(os: &str) -> Self {
        match os {
            "win32" => Self::Windows,
            "darwin" => Self::Macos,
            "linux" => Self::Linux,
            other => {
                debug!("Platform {other} does not have an official build, installing linux version");
                Self::Linux
            }
        }
    }

    /// Returns the token as it appears in artifact names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
        }
    }

    /// Returns whether this is the Windows build.
    #[must_use]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Returns the executable file extension for this platform.
    ///
    /// Returns `.exe` on Windows, empty string otherwise.
    #[must_use]
    pub fn executable_extension(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Macos | Self::Linux => "",
        }
    }

    /// Returns the archive extension the vendor publishes for this platform.
    #[must_use]
    pub fn archive_extension(self) -> &'static str {
        match self {
            Self::Windows => "zip",
            Self::Macos | Self::Linux => "tar.gz",
        }
    }
}

impl fmt::Display for VendorPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
