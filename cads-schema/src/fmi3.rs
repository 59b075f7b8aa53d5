//! The FMI 3.0 model description subset consumed by the Co-Simulation driver.
//!
//! FMI 3.0 lists model variables as one element per base type
//! (`<Float64 .../>`, `<Int32 .../>`, ...). Only `Float64`, `Int32` and
//! `Boolean` map onto the supported scalar kinds; the remaining widths are
//! still parsed so that targeting them yields a precise error instead of an
//! unknown-variable one.

use std::str::FromStr;

use serde::Deserialize;

use crate::{
    Causality, Error, ScalarKind, Variable,
    traits::{DefaultExperimentView, ModelVariablesView},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Fmi3ModelDescription {
    #[serde(rename = "@fmiVersion")]
    pub fmi_version: String,

    #[serde(rename = "@modelName")]
    pub model_name: String,

    /// Token verifying that XML and binary belong together; the FMI 3.0
    /// successor of the FMI 2.0 guid.
    #[serde(rename = "@instantiationToken")]
    pub instantiation_token: String,

    pub co_simulation: Option<CoSimulation>,

    pub model_exchange: Option<ModelExchange>,

    pub default_experiment: Option<DefaultExperiment>,

    pub model_variables: ModelVariables,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CoSimulation {
    #[serde(rename = "@modelIdentifier")]
    pub model_identifier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelExchange {
    #[serde(rename = "@modelIdentifier")]
    pub model_identifier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DefaultExperiment {
    #[serde(rename = "@startTime")]
    pub start_time: Option<f64>,
    #[serde(rename = "@stopTime")]
    pub stop_time: Option<f64>,
    #[serde(rename = "@tolerance")]
    pub tolerance: Option<f64>,
    #[serde(rename = "@stepSize")]
    pub step_size: Option<f64>,
}

/// One variable element; the base type is implied by the element name.
#[derive(Debug, Deserialize)]
pub struct Fmi3Variable {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "@valueReference")]
    pub value_reference: u32,

    #[serde(default, rename = "@causality")]
    pub causality: Causality,

    #[serde(default, rename = "@start")]
    pub start: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelVariables {
    #[serde(rename = "Float64")]
    pub float64: Vec<Fmi3Variable>,
    #[serde(rename = "Float32")]
    pub float32: Vec<Fmi3Variable>,
    #[serde(rename = "Int8")]
    pub int8: Vec<Fmi3Variable>,
    #[serde(rename = "Int16")]
    pub int16: Vec<Fmi3Variable>,
    #[serde(rename = "Int32")]
    pub int32: Vec<Fmi3Variable>,
    #[serde(rename = "Int64")]
    pub int64: Vec<Fmi3Variable>,
    #[serde(rename = "UInt8")]
    pub uint8: Vec<Fmi3Variable>,
    #[serde(rename = "UInt16")]
    pub uint16: Vec<Fmi3Variable>,
    #[serde(rename = "UInt32")]
    pub uint32: Vec<Fmi3Variable>,
    #[serde(rename = "UInt64")]
    pub uint64: Vec<Fmi3Variable>,
    #[serde(rename = "Boolean")]
    pub boolean: Vec<Fmi3Variable>,
    #[serde(rename = "String")]
    pub string: Vec<Fmi3Variable>,
    #[serde(rename = "Enumeration")]
    pub enumeration: Vec<Fmi3Variable>,
    #[serde(rename = "Clock")]
    pub clock: Vec<Fmi3Variable>,
}

impl ModelVariables {
    /// All groups with their scalar-kind mapping.
    fn groups(&self) -> [(&[Fmi3Variable], Option<ScalarKind>, &'static str); 14] {
        [
            (&self.float64, Some(ScalarKind::Real), "Float64"),
            (&self.float32, None, "Float32"),
            (&self.int8, None, "Int8"),
            (&self.int16, None, "Int16"),
            (&self.int32, Some(ScalarKind::Integer), "Int32"),
            (&self.int64, None, "Int64"),
            (&self.uint8, None, "UInt8"),
            (&self.uint16, None, "UInt16"),
            (&self.uint32, None, "UInt32"),
            (&self.uint64, None, "UInt64"),
            (&self.boolean, Some(ScalarKind::Boolean), "Boolean"),
            (&self.string, None, "String"),
            (&self.enumeration, None, "Enumeration"),
            (&self.clock, None, "Clock"),
        ]
    }
}

impl DefaultExperimentView for Fmi3ModelDescription {
    fn start_time(&self) -> Option<f64> {
        self.default_experiment.as_ref().and_then(|e| e.start_time)
    }

    fn stop_time(&self) -> Option<f64> {
        self.default_experiment.as_ref().and_then(|e| e.stop_time)
    }

    fn step_size(&self) -> Option<f64> {
        self.default_experiment.as_ref().and_then(|e| e.step_size)
    }

    fn tolerance(&self) -> Option<f64> {
        self.default_experiment.as_ref().and_then(|e| e.tolerance)
    }
}

impl ModelVariablesView for Fmi3ModelDescription {
    fn variables(&self) -> Vec<Variable<'_>> {
        self.model_variables
            .groups()
            .into_iter()
            .flat_map(|(vars, kind, type_name)| {
                vars.iter().map(move |v| Variable {
                    name: &v.name,
                    value_reference: v.value_reference,
                    causality: v.causality,
                    kind,
                    type_name,
                })
            })
            .collect()
    }
}

impl FromStr for Fmi3ModelDescription {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        quick_xml::de::from_str(s).map_err(Error::from)
    }
}
