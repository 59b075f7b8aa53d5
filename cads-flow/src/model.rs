//! The workflow document: an ordered sequence of FMU invocations with
//! literal and derived start values.
//!
//! Unknown fields at any level are ignored so that documents written for
//! newer runners keep loading.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Step {
    /// Unique step identifier; also the key later steps reference.
    pub name: String,

    /// FMU path, absolute or relative to the workflow root.
    pub fmu: String,

    /// Variables to capture; empty means auto-select by causality.
    pub outputs: Vec<String>,

    /// Literal start values.
    pub start_values: BTreeMap<String, StartValue>,

    /// Derived start values: target variable to `<prior_step>.<variable>`.
    pub start_from: BTreeMap<String, String>,

    pub start_time: Option<f64>,
    pub stop_time: Option<f64>,
    pub step_size: Option<f64>,

    /// Where to persist this step's result snapshot as JSON.
    pub result: Option<PathBuf>,
}

/// A literal start value: number, boolean, or string-encoded number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StartValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl StartValue {
    /// Wire text handed to the driver's start-value codec.
    pub fn encode(&self) -> String {
        match self {
            StartValue::Boolean(b) => if *b { "1" } else { "0" }.to_owned(),
            StartValue::Integer(i) => i.to_string(),
            StartValue::Real(v) => format!("{v}"),
            StartValue::Text(s) => s.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_step() {
        let workflow: Workflow = serde_yaml::from_str(
            r#"
            steps:
              - name: producer
                fmu: fmus/producer.fmu
                outputs: [mean]
                start_values:
                  seed: 42
                  scale: 0.5
                  enabled: true
                  encoded: "3.25"
                stop_time: 10.0
                result: out/producer.json
              - name: consumer
                fmu: fmus/consumer.fmu
                start_from:
                  m_in: producer.mean
            "#,
        )
        .unwrap();

        assert_eq!(workflow.steps.len(), 2);
        let producer = &workflow.steps[0];
        assert_eq!(producer.name, "producer");
        assert_eq!(producer.outputs, vec!["mean"]);
        assert_eq!(producer.start_values["seed"], StartValue::Integer(42));
        assert_eq!(producer.start_values["scale"], StartValue::Real(0.5));
        assert_eq!(producer.start_values["enabled"], StartValue::Boolean(true));
        assert_eq!(
            producer.start_values["encoded"],
            StartValue::Text("3.25".to_owned())
        );
        assert_eq!(producer.stop_time, Some(10.0));
        assert_eq!(producer.result.as_deref().unwrap().to_str(), Some("out/producer.json"));

        let consumer = &workflow.steps[1];
        assert_eq!(consumer.start_from["m_in"], "producer.mean");
        assert!(consumer.outputs.is_empty());
        assert!(consumer.result.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let workflow: Workflow = serde_yaml::from_str(
            r#"
            version: 99
            steps:
              - name: a
                fmu: a.fmu
                retry_policy: exponential
            "#,
        )
        .unwrap();
        assert_eq!(workflow.steps[0].name, "a");
    }

    #[test]
    fn start_value_encoding() {
        assert_eq!(StartValue::Boolean(true).encode(), "1");
        assert_eq!(StartValue::Boolean(false).encode(), "0");
        assert_eq!(StartValue::Integer(-3).encode(), "-3");
        assert_eq!(StartValue::Real(0.25).encode(), "0.25");
        assert_eq!(StartValue::Text("1e-3".into()).encode(), "1e-3");
    }
}
