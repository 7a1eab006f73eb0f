use crate::error::{RelflowError, Result};
use std::fmt;

/// Semantic version representation
///
/// Ordering is lexicographic on (major, minor, patch), which the derived
/// `Ord` provides for free given the field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version from a string (e.g., "1.2.3" or "v1.2.3")
    ///
    /// Branch and tag names embed versions with a `v` prefix, so at most
    /// one leading 'v' or 'V' is stripped before parsing. Exactly three
    /// dot-separated integer components are required; no pre-release or
    /// build metadata.
    pub fn parse(input: &str) -> Result<Self> {
        let clean = input
            .strip_prefix('v')
            .or_else(|| input.strip_prefix('V'))
            .unwrap_or(input);

        let parts: Vec<&str> = clean.split('.').collect();
        if parts.len() != 3 {
            return Err(RelflowError::version(format!(
                "Invalid version format: '{}' - expected MAJOR.MINOR.PATCH",
                input
            )));
        }

        let major = parts[0]
            .parse::<u32>()
            .map_err(|_| RelflowError::version(format!("Invalid major version: {}", parts[0])))?;
        let minor = parts[1]
            .parse::<u32>()
            .map_err(|_| RelflowError::version(format!("Invalid minor version: {}", parts[1])))?;
        let patch = parts[2]
            .parse::<u32>()
            .map_err(|_| RelflowError::version(format!("Invalid patch version: {}", parts[2])))?;

        Ok(Version {
            major,
            minor,
            patch,
        })
    }

    /// Bump version according to bump type
    pub fn bump(&self, bump_type: &VersionBump) -> Self {
        match bump_type {
            VersionBump::Major => Version {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            VersionBump::Minor => Version {
                major: self.major,
                minor: self.minor + 1,
                patch: 0,
            },
            VersionBump::Patch => Version {
                major: self.major,
                minor: self.minor,
                patch: self.patch + 1,
            },
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Which version component an operation increments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

/// Return the greatest version in the iterator, or None when it is empty
pub fn max_version<I>(versions: I) -> Option<Version>
where
    I: IntoIterator<Item = Version>,
{
    versions.into_iter().max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
    }

    #[test]
    fn test_version_parse_with_prefix() {
        assert_eq!(Version::parse("v1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(Version::parse("V0.1.0").unwrap(), Version::new(0, 1, 0));
    }

    #[test]
    fn test_version_parse_strips_at_most_one_prefix() {
        assert!(Version::parse("vv1.2.3").is_err());
        assert!(Version::parse("Vv1.2.3").is_err());
        assert!(Version::parse("vV1.2.3").is_err());
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("X.Y.Z").is_err());
        assert!(Version::parse("1.two.3").is_err());
        assert!(Version::parse("").is_err());
    }

    #[test]
    fn test_roundtrip() {
        for (a, b, c) in [(0, 0, 0), (1, 0, 0), (1, 2, 3), (10, 20, 30)] {
            let v = Version::new(a, b, c);
            assert_eq!(Version::parse(&v.to_string()).unwrap(), v);
        }
    }

    #[test]
    fn test_version_bump_major() {
        let v = Version::new(1, 2, 3);
        let bumped = v.bump(&VersionBump::Major);
        assert_eq!(bumped, Version::new(2, 0, 0));
        assert_eq!(bumped.minor, 0);
        assert_eq!(bumped.patch, 0);
    }

    #[test]
    fn test_version_bump_minor() {
        let v = Version::new(1, 2, 3);
        assert_eq!(v.bump(&VersionBump::Minor), Version::new(1, 3, 0));
    }

    #[test]
    fn test_version_bump_patch() {
        let v = Version::new(1, 2, 3);
        assert_eq!(v.bump(&VersionBump::Patch), Version::new(1, 2, 4));
    }

    #[test]
    fn test_version_ordering() {
        assert!(Version::new(1, 0, 0) < Version::new(1, 0, 1));
        assert!(Version::new(1, 0, 9) < Version::new(1, 1, 0));
        assert!(Version::new(1, 9, 9) < Version::new(2, 0, 0));
        assert_eq!(Version::new(1, 2, 3), Version::new(1, 2, 3));
    }

    #[test]
    fn test_max_version() {
        let versions = vec![
            Version::new(1, 0, 0),
            Version::new(1, 3, 0),
            Version::new(1, 2, 0),
        ];
        assert_eq!(max_version(versions), Some(Version::new(1, 3, 0)));
        assert_eq!(max_version(Vec::new()), None);
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::new(1, 2, 3).to_string(), "1.2.3");
    }
}
