//! The FMI 2.0 model description subset consumed by the Co-Simulation driver.

use std::str::FromStr;

use serde::Deserialize;

use crate::{
    Causality, Error, ScalarKind, Variable,
    traits::{DefaultExperimentView, ModelVariablesView},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Fmi2ModelDescription {
    /// Version of FMI; "2.0" for all FMI 2.0.x revisions.
    #[serde(rename = "@fmiVersion")]
    pub fmi_version: String,

    #[serde(rename = "@modelName")]
    pub model_name: String,

    /// Fingerprint used to verify that the XML file and the binary match.
    #[serde(rename = "@guid")]
    pub guid: String,

    /// Present iff the FMU supports Co-Simulation.
    pub co_simulation: Option<CoSimulation>,

    /// Present iff the FMU supports Model Exchange (rejected by the driver).
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

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ModelVariables {
    #[serde(rename = "ScalarVariable")]
    pub scalar_variable: Vec<ScalarVariable>,
}

#[derive(Debug, Deserialize)]
pub struct ScalarVariable {
    #[serde(rename = "@name")]
    pub name: String,

    #[serde(rename = "@valueReference")]
    pub value_reference: u32,

    #[serde(default, rename = "@causality")]
    pub causality: Causality,

    /// Swallows `<Annotations>` so the typed child below stays unambiguous.
    #[serde(rename = "Annotations")]
    pub annotations: Option<()>,

    /// The typed child element (`<Real>`, `<Integer>`, ...).
    #[serde(rename = "$value")]
    pub typed: TypedElement,
}

#[derive(Debug, Deserialize)]
pub enum TypedElement {
    Real(RealElement),
    Integer(IntegerElement),
    Boolean(BooleanElement),
    String(StringElement),
    Enumeration(EnumerationElement),
}

impl TypedElement {
    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            TypedElement::Real(_) => Some(ScalarKind::Real),
            TypedElement::Integer(_) => Some(ScalarKind::Integer),
            TypedElement::Boolean(_) => Some(ScalarKind::Boolean),
            TypedElement::String(_) | TypedElement::Enumeration(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            TypedElement::Real(_) => "Real",
            TypedElement::Integer(_) => "Integer",
            TypedElement::Boolean(_) => "Boolean",
            TypedElement::String(_) => "String",
            TypedElement::Enumeration(_) => "Enumeration",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RealElement {
    #[serde(rename = "@start")]
    pub start: Option<f64>,
    #[serde(rename = "@unit")]
    pub unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IntegerElement {
    #[serde(rename = "@start")]
    pub start: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BooleanElement {
    #[serde(rename = "@start")]
    pub start: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StringElement {
    #[serde(rename = "@start")]
    pub start: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnumerationElement {
    #[serde(rename = "@declaredType")]
    pub declared_type: Option<String>,
    #[serde(rename = "@start")]
    pub start: Option<i32>,
}

impl DefaultExperimentView for Fmi2ModelDescription {
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

impl ModelVariablesView for Fmi2ModelDescription {
    fn variables(&self) -> Vec<Variable<'_>> {
        self.model_variables
            .scalar_variable
            .iter()
            .map(|sv| Variable {
                name: &sv.name,
                value_reference: sv.value_reference,
                causality: sv.causality,
                kind: sv.typed.kind(),
                type_name: sv.typed.type_name(),
            })
            .collect()
    }
}

impl FromStr for Fmi2ModelDescription {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        quick_xml::de::from_str(s).map_err(Error::from)
    }
}
