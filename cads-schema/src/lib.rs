//! Parsed views of the `modelDescription.xml` shipped inside FMU archives.
//!
//! Only the subset of the FMI 2.0 and 3.0 schemas that a Co-Simulation
//! driver needs is modelled: the interface kind, the default experiment,
//! and the scalar variables. Unknown attributes and elements are ignored.

use thiserror::Error;

pub mod fmi2;
pub mod fmi3;
pub mod minimal;
pub mod traits;
mod variable;

pub use variable::{Causality, ScalarKind, Variable};

#[derive(Debug, Error)]
pub enum Error {
    #[error("error parsing model description XML: {0}")]
    XmlParse(#[from] quick_xml::DeError),

    #[error("unsupported FMI version '{0}'")]
    UnsupportedVersion(String),
}

/// The FMI major standard version an FMU was exported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorVersion {
    Fmi2,
    Fmi3,
}

impl std::fmt::Display for MajorVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MajorVersion::Fmi2 => write!(f, "2.0"),
            MajorVersion::Fmi3 => write!(f, "3.0"),
        }
    }
}

impl MajorVersion {
    /// Classify an `fmiVersion` attribute value ("2.0", "3.0-beta.3", ...).
    pub fn from_version_string(version: &str) -> Result<Self, Error> {
        match version.split('.').next() {
            Some("2") => Ok(MajorVersion::Fmi2),
            Some("3") => Ok(MajorVersion::Fmi3),
            _ => Err(Error::UnsupportedVersion(version.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_major_versions() {
        assert_eq!(
            MajorVersion::from_version_string("2.0").unwrap(),
            MajorVersion::Fmi2
        );
        assert_eq!(
            MajorVersion::from_version_string("3.0-beta.3").unwrap(),
            MajorVersion::Fmi3
        );
    }

    #[test]
    fn rejects_other_versions() {
        assert!(matches!(
            MajorVersion::from_version_string("1.0"),
            Err(Error::UnsupportedVersion(_))
        ));
        assert!(matches!(
            MajorVersion::from_version_string(""),
            Err(Error::UnsupportedVersion(_))
        ));
    }
}
