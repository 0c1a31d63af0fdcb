//! Version specifiers accepted by setup-heim.
//!
//! A specifier is either an exact release (`1.1.1`) or something the release
//! service has to resolve: the aliases `current` and `latest`, or anything
//! carrying a major prefix such as `v1` or `v1.2.3`. Exact releases are
//! strict `MAJOR.MINOR.PATCH` versions; pre-release and build metadata are
//! rejected.

use semver::Version;

use crate::errors::{Result, SetupError};

/// A user-supplied version specifier, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpecifier {
    /// An exact version. Never triggers a remote lookup.
    Exact(Version),
    /// `current`, `latest`, or a `v`-prefixed tag; resolved remotely as given.
    Floating(String),
}

impl VersionSpecifier {
    /// Classifies a raw specifier.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::MalformedVersion`] if the specifier is not
    /// floating and is not a strict semantic version.
    pub fn parse(raw: &str) -> Result<Self> {
        if is_floating(raw) {
            return Ok(Self::Floating(raw.to_string()));
        }
        parse_strict(raw).map(Self::Exact)
    }
}

fn is_floating(raw: &str) -> bool {
    matches!(raw, "current" | "latest") || is_major_tag(raw)
}

/// `v` followed by an ASCII digit. The rest is left to the release service.
fn is_major_tag(raw: &str) -> bool {
    raw.strip_prefix('v')
        .and_then(|rest| rest.bytes().next())
        .is_some_and(|b| b.is_ascii_digit())
}

/// Parses `MAJOR.MINOR.PATCH` with no pre-release or build suffix.
///
/// # Errors
///
/// Returns [`SetupError::MalformedVersion`] when the text does not parse or
/// carries a suffix.
pub fn parse_strict(raw: &str) -> Result<Version> {
    let version = Version::parse(raw).map_err(|e| SetupError::malformed_version(raw, e))?;
    if !version.pre.is_empty() {
        return Err(SetupError::malformed_version(
            raw,
            "pre-release versions are not supported",
        ));
    }
    if !version.build.is_empty() {
        return Err(SetupError::malformed_version(
            raw,
            "build metadata is not supported",
        ));
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_floating() {
        assert_eq!(
            VersionSpecifier::parse("current").unwrap(),
            VersionSpecifier::Floating("current".to_string())
        );
        assert!(matches!(
            VersionSpecifier::parse("latest").unwrap(),
            VersionSpecifier::Floating(_)
        ));
    }

    #[test]
    fn major_tags_are_floating() {
        for tag in ["v1", "v01", "v23", "v1.2.3", "v2.0"] {
            let spec = VersionSpecifier::parse(tag).unwrap();
            assert_eq!(spec, VersionSpecifier::Floating(tag.to_string()));
        }
    }

    #[test]
    fn exact_versions_are_not_floating() {
        let spec = VersionSpecifier::parse("1.1.1").unwrap();
        assert_eq!(spec, VersionSpecifier::Exact(Version::new(1, 1, 1)));
    }

    #[test]
    fn major_tag_needs_a_digit_after_v() {
        assert!(!is_major_tag("v"));
        assert!(!is_major_tag("vnext"));
        assert!(!is_major_tag("1.2.3"));
        assert!(is_major_tag("v7"));
        assert!(is_major_tag("v1.2.3"));
    }

    #[test]
    fn malformed_literals_are_rejected() {
        for raw in ["invalid", "1.1", "1.1.1.1", "vnext", "v", "", " 1.1.1"] {
            let err = VersionSpecifier::parse(raw).unwrap_err();
            assert!(
                matches!(&err, SetupError::MalformedVersion { version, .. } if version == raw),
                "expected MalformedVersion for {raw:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn suffixes_are_rejected() {
        assert!(matches!(
            parse_strict("1.2.3-beta.1"),
            Err(SetupError::MalformedVersion { .. })
        ));
        assert!(matches!(
            parse_strict("1.2.3+build.5"),
            Err(SetupError::MalformedVersion { .. })
        ));
    }

    #[test]
    fn strict_parse_round_trips_text() {
        assert_eq!(parse_strict("10.0.3").unwrap().to_string(), "10.0.3");
    }
}
