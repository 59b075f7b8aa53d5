//! The tagged scalar exchanged between workflow steps and the text codec
//! that feeds FMU start values.
//!
//! Start values cross the binding as text, so every coercion funnels
//! through one locale-independent numeric parse. Booleans follow the FMI
//! convention of `0` meaning false and anything else true, which lets a
//! real output of one step drive a boolean input of the next.

use cads_schema::ScalarKind;
use serde::Serialize;
use thiserror::Error;

/// A captured or supplied scalar, tagged with its base type.
///
/// Serializes untagged: reals and integers become JSON numbers, booleans
/// become JSON `true`/`false`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Real(f64),
    Integer(i32),
    Boolean(bool),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Real(_) => ScalarKind::Real,
            ScalarValue::Integer(_) => ScalarKind::Integer,
            ScalarValue::Boolean(_) => ScalarKind::Boolean,
        }
    }

    /// Encode to the wire text accepted by [`parse_as`].
    ///
    /// Reals use Rust's shortest round-trip formatting; booleans go out as
    /// `0`/`1` so they can feed any downstream base type.
    pub fn encode(&self) -> String {
        match self {
            ScalarValue::Real(v) => format!("{v}"),
            ScalarValue::Integer(v) => v.to_string(),
            ScalarValue::Boolean(b) => if *b { "1" } else { "0" }.to_owned(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("empty value")]
    Empty,

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not finite")]
    NonFinite(String),

    #[error("'{0}' is out of range for a 32-bit integer")]
    OutOfRange(String),
}

/// Parse text into a finite number. Rejects empty input, non-finite values
/// and trailing garbage.
pub fn parse_number(text: &str) -> Result<f64, CodecError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CodecError::Empty);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| CodecError::NotANumber(text.to_owned()))?;
    if !value.is_finite() {
        return Err(CodecError::NonFinite(text.to_owned()));
    }
    Ok(value)
}

/// Parse text into the scalar a variable of the given kind requires.
///
/// A real feeding an integer is rounded to nearest, ties away from zero; a
/// number feeding a boolean maps `0` to false and everything else to true.
pub fn parse_as(kind: ScalarKind, text: &str) -> Result<ScalarValue, CodecError> {
    let value = parse_number(text)?;
    match kind {
        ScalarKind::Real => Ok(ScalarValue::Real(value)),
        ScalarKind::Integer => {
            // f64::round ties away from zero, matching the coercion rule.
            let rounded = value.round();
            if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
                return Err(CodecError::OutOfRange(text.to_owned()));
            }
            Ok(ScalarValue::Integer(rounded as i32))
        }
        ScalarKind::Boolean => Ok(ScalarValue::Boolean(value != 0.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reals() {
        assert_eq!(
            parse_as(ScalarKind::Real, "3.5").unwrap(),
            ScalarValue::Real(3.5)
        );
        assert_eq!(
            parse_as(ScalarKind::Real, "-1e-3").unwrap(),
            ScalarValue::Real(-1e-3)
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse_number(""), Err(CodecError::Empty));
        assert_eq!(parse_number("   "), Err(CodecError::Empty));
        assert!(matches!(parse_number("NaN"), Err(CodecError::NonFinite(_))));
        assert!(matches!(parse_number("inf"), Err(CodecError::NonFinite(_))));
        assert!(matches!(
            parse_number("-inf"),
            Err(CodecError::NonFinite(_))
        ));
        assert!(matches!(
            parse_number("1.5abc"),
            Err(CodecError::NotANumber(_))
        ));
        assert!(matches!(
            parse_number("1,5"),
            Err(CodecError::NotANumber(_))
        ));
    }

    #[test]
    fn integer_coercion_rounds_ties_away_from_zero() {
        assert_eq!(
            parse_as(ScalarKind::Integer, "2.5").unwrap(),
            ScalarValue::Integer(3)
        );
        assert_eq!(
            parse_as(ScalarKind::Integer, "-2.5").unwrap(),
            ScalarValue::Integer(-3)
        );
        assert_eq!(
            parse_as(ScalarKind::Integer, "2.4").unwrap(),
            ScalarValue::Integer(2)
        );
        assert_eq!(
            parse_as(ScalarKind::Integer, "42").unwrap(),
            ScalarValue::Integer(42)
        );
        assert!(matches!(
            parse_as(ScalarKind::Integer, "1e12"),
            Err(CodecError::OutOfRange(_))
        ));
    }

    #[test]
    fn boolean_coercion_is_zero_or_not() {
        assert_eq!(
            parse_as(ScalarKind::Boolean, "0").unwrap(),
            ScalarValue::Boolean(false)
        );
        assert_eq!(
            parse_as(ScalarKind::Boolean, "0.0").unwrap(),
            ScalarValue::Boolean(false)
        );
        assert_eq!(
            parse_as(ScalarKind::Boolean, "1").unwrap(),
            ScalarValue::Boolean(true)
        );
        assert_eq!(
            parse_as(ScalarKind::Boolean, "0.25").unwrap(),
            ScalarValue::Boolean(true)
        );
    }

    #[test]
    fn encode_round_trips() {
        for value in [
            ScalarValue::Real(0.25),
            ScalarValue::Real(-1234.5678),
            ScalarValue::Integer(-7),
            ScalarValue::Boolean(true),
            ScalarValue::Boolean(false),
        ] {
            let text = value.encode();
            assert_eq!(parse_as(value.kind(), &text).unwrap(), value);
        }
    }

    #[test]
    fn serializes_untagged_json() {
        assert_eq!(
            serde_json::to_string(&ScalarValue::Real(0.25)).unwrap(),
            "0.25"
        );
        assert_eq!(serde_json::to_string(&ScalarValue::Integer(25)).unwrap(), "25");
        assert_eq!(
            serde_json::to_string(&ScalarValue::Boolean(true)).unwrap(),
            "true"
        );
    }
}
