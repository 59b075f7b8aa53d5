use serde::Deserialize;

/// Declared role of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Causality {
    Parameter,
    CalculatedParameter,
    Input,
    Output,
    #[default]
    Local,
    Independent,
    /// FMI 3.0 only.
    StructuralParameter,
}

/// The scalar base types the driver can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Real,
    Integer,
    Boolean,
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarKind::Real => write!(f, "real"),
            ScalarKind::Integer => write!(f, "integer"),
            ScalarKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// A normalized view of one model variable, identical across FMI 2.0 and 3.0.
///
/// `kind` is `None` for base types the driver does not support (strings,
/// enumerations, the non-32-bit integer widths of FMI 3.0); `type_name`
/// then carries the declared type for error reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variable<'a> {
    pub name: &'a str,
    pub value_reference: u32,
    pub causality: Causality,
    pub kind: Option<ScalarKind>,
    pub type_name: &'static str,
}
