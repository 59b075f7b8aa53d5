//! Minimal model description used to determine the FMI version of an FMU
//! before committing to a full parse.

use std::str::FromStr;

use serde::Deserialize;

use crate::{Error, MajorVersion};

#[derive(Debug, Default, PartialEq, Deserialize)]
pub struct MinimalModelDescription {
    #[serde(rename = "@fmiVersion")]
    pub fmi_version: String,
    #[serde(default, rename = "@modelName")]
    pub model_name: String,
}

impl MinimalModelDescription {
    /// Classify the `fmiVersion` attribute into a supported major version.
    pub fn major_version(&self) -> Result<MajorVersion, Error> {
        MajorVersion::from_version_string(&self.fmi_version)
    }
}

impl FromStr for MinimalModelDescription {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        quick_xml::de::from_str(s).map_err(Error::from)
    }
}
