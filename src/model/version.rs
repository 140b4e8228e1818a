//! Version requirements and metadata versions.

use std::fmt;

use strum::{EnumIter, FromRepr};

use crate::{Error, Result};

/// A dotted `major.minor.patch` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Version {
    /// Major component
    pub major: u32,
    /// Minor component
    pub minor: u32,
    /// Patch component
    pub patch: u32,
}

impl Version {
    /// Creates a new version
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Packs the version into the compact form, if every component fits.
    ///
    /// The compact layout is `major | minor << 3 | patch << 7`, which requires
    /// `major < 8`, `minor < 16` and `patch < 128`.
    #[must_use]
    pub fn pack_compact(&self) -> Option<u32> {
        if self.major < 8 && self.minor < 16 && self.patch < 128 {
            Some(self.major | self.minor << 3 | self.patch << 7)
        } else {
            None
        }
    }

    /// Unpacks the compact form
    #[must_use]
    pub fn unpack_compact(packed: u32) -> Self {
        Version::new(packed & 0x7, (packed >> 3) & 0xF, (packed >> 7) & 0x7F)
    }

    /// Packs the version into the full form `major | minor << 8 | patch << 16`, if every
    /// component fits.
    ///
    /// The full layout requires `major < 256`, `minor < 256` and `patch < 65536`.
    #[must_use]
    pub fn pack_full(&self) -> Option<u32> {
        if self.major <= 0xFF && self.minor <= 0xFF && self.patch <= 0xFFFF {
            Some(self.major | self.minor << 8 | self.patch << 16)
        } else {
            None
        }
    }

    /// Unpacks the full form
    #[must_use]
    pub fn unpack_full(packed: u32) -> Self {
        Version::new(packed & 0xFF, (packed >> 8) & 0xFF, packed >> 16)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// What kind of version a requirement refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, FromRepr)]
#[repr(u8)]
pub enum VersionKind {
    /// Kotlin language version
    #[default]
    LanguageVersion = 0,
    /// Kotlin compiler version
    CompilerVersion = 1,
    /// Kotlin API version
    ApiVersion = 2,
}

/// How an unmet requirement is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, FromRepr)]
#[repr(u8)]
pub enum VersionLevel {
    /// Report a warning
    Warning = 0,
    /// Report an error
    #[default]
    Error = 1,
    /// Hide the declaration
    Hidden = 2,
}

/// A requirement on the environment a declaration may be used in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRequirement {
    /// Kind of the required version
    pub kind: VersionKind,
    /// Reporting level if the requirement is not met
    pub level: VersionLevel,
    /// Optional error code
    pub error_code: Option<i32>,
    /// Optional message
    pub message: Option<String>,
    /// The required version
    pub version: Version,
}

impl VersionRequirement {
    /// Creates an error level requirement without code or message
    #[must_use]
    pub fn new(kind: VersionKind, version: Version) -> Self {
        VersionRequirement {
            kind,
            level: VersionLevel::Error,
            error_code: None,
            message: None,
            version,
        }
    }
}

/// Version of the metadata format (`mv`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetadataVersion(pub Version);

impl MetadataVersion {
    /// The newest metadata version the reader accepts under strict semantics
    pub const LATEST: MetadataVersion = MetadataVersion(Version::new(1, 9, 0));

    /// Converts the version into its `mv` array form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ModelInvariant`] if a component does not fit an `i32`.
    pub fn to_array(&self) -> Result<Vec<i32>> {
        [self.0.major, self.0.minor, self.0.patch]
            .into_iter()
            .map(|component| {
                i32::try_from(component).map_err(|_| {
                    Error::ModelInvariant(format!(
                        "Metadata version component {component} does not fit an int"
                    ))
                })
            })
            .collect()
    }

    /// Parses the `mv` array form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the array does not hold exactly three
    /// non-negative components.
    pub fn from_array(values: &[i32]) -> Result<Self> {
        match values {
            [major, minor, patch] => {
                let component = |value: i32| {
                    u32::try_from(value)
                        .map_err(|_| malformed_error!("Negative metadata version component - {}", value))
                };
                Ok(MetadataVersion(Version::new(
                    component(*major)?,
                    component(*minor)?,
                    component(*patch)?,
                )))
            }
            _ => Err(malformed_error!(
                "Metadata version must have 3 components, found {}",
                values.len()
            )),
        }
    }

    /// Returns true if a reader supporting [`MetadataVersion::LATEST`] can read this version.
    ///
    /// Only major version 1 is known. Under strict semantics newer minor versions are
    /// rejected as well.
    #[must_use]
    pub fn is_compatible(&self, strict: bool) -> bool {
        if self.0.major != Self::LATEST.0.major {
            return false;
        }
        !strict || self.0.minor <= Self::LATEST.0.minor
    }
}

impl Default for MetadataVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for MetadataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_packing() {
        let version = Version::new(1, 4, 30);
        let packed = version.pack_compact().unwrap();
        assert_eq!(packed, 1 | 4 << 3 | 30 << 7);
        assert_eq!(Version::unpack_compact(packed), version);
    }

    #[test]
    fn wide_components_need_the_full_form() {
        let version = Version::new(8, 0, 0);
        assert!(version.pack_compact().is_none());
        assert_eq!(Version::unpack_full(version.pack_full().unwrap()), version);

        let version = Version::new(1, 16, 200);
        assert!(version.pack_compact().is_none());
        assert_eq!(Version::unpack_full(version.pack_full().unwrap()), version);

        let version = Version::new(255, 255, 65535);
        assert_eq!(Version::unpack_full(version.pack_full().unwrap()), version);
    }

    #[test]
    fn too_wide_for_any_form() {
        assert!(Version::new(256, 0, 0).pack_full().is_none());
        assert!(Version::new(1, 256, 0).pack_full().is_none());
        assert!(Version::new(300, 1, 70000).pack_full().is_none());
    }

    #[test]
    fn metadata_version_compatibility() {
        assert!(MetadataVersion(Version::new(1, 9, 0)).is_compatible(true));
        assert!(MetadataVersion(Version::new(1, 12, 0)).is_compatible(false));
        assert!(!MetadataVersion(Version::new(1, 12, 0)).is_compatible(true));
        assert!(!MetadataVersion(Version::new(2, 0, 0)).is_compatible(false));
    }

    #[test]
    fn metadata_version_array_form() {
        let version = MetadataVersion::from_array(&[1, 8, 0]).unwrap();
        assert_eq!(version.to_array().unwrap(), vec![1, 8, 0]);
        assert!(MetadataVersion(Version::new(1, u32::MAX, 0)).to_array().is_err());
        assert!(MetadataVersion::from_array(&[1, 8]).is_err());
        assert!(MetadataVersion::from_array(&[1, -1, 0]).is_err());
    }
}
