use std::fmt;
use std::str::FromStr;

use semver::Version;
use thiserror::Error;

/// A published extension version. Ordering follows semantic-version
/// precedence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExtensionVersion(Version);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid semantic version '{input}': {reason}")]
pub struct VersionParseError {
    pub input: String,
    pub reason: String,
}

impl ExtensionVersion {
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }
}

impl FromStr for ExtensionVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        Version::parse(bare)
            .map(Self)
            .map_err(|error| VersionParseError {
                input: s.to_string(),
                reason: error.to_string(),
            })
    }
}

impl fmt::Display for ExtensionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether `latest` should replace what is installed. A missing installation
/// is older than every version.
#[must_use]
pub fn is_update_available(installed: Option<&ExtensionVersion>, latest: &ExtensionVersion) -> bool {
    installed.is_none_or(|installed| latest > installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ExtensionVersion {
        s.parse().expect("valid version in test")
    }

    #[test]
    fn parses_plain_and_prefixed_versions() {
        assert_eq!(v("1.2.3"), ExtensionVersion::new(1, 2, 3));
        assert_eq!(v(" v0.512.0 "), ExtensionVersion::new(0, 512, 0));
    }

    #[test]
    fn rejects_partial_versions() {
        assert!("1.2".parse::<ExtensionVersion>().is_err());
        assert!("latest".parse::<ExtensionVersion>().is_err());
        assert!("".parse::<ExtensionVersion>().is_err());
    }

    #[test]
    fn display_round_trips_without_prefix() {
        assert_eq!(v("v0.511.0").to_string(), "0.511.0");
    }

    #[test]
    fn ordering_uses_semver_precedence() {
        assert!(v("0.10.0") > v("0.9.9"));
        assert!(v("1.0.0") > v("1.0.0-beta.2"));
        assert!(v("1.0.0-beta.10") > v("1.0.0-beta.2"));
    }

    #[test]
    fn update_available_only_when_strictly_newer() {
        assert!(is_update_available(Some(&v("0.511.0")), &v("0.512.0")));
        assert!(!is_update_available(Some(&v("0.512.0")), &v("0.512.0")));
        assert!(!is_update_available(Some(&v("0.513.0")), &v("0.512.0")));
    }

    #[test]
    fn missing_installation_is_older_than_any_version() {
        assert!(is_update_available(None, &v("0.0.1")));
        assert!(is_update_available(None, &v("0.0.0")));
    }
}
