//! Runtime type predicates shared by the decoder and the render closures.

use serde_json::Value as JsonValue;

use super::value::Value;

const MIN_SAFE_INTEGER: f64 = -9_007_199_254_740_991.0;
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Numeric checks and diagnostics over a dynamically-typed value.
///
/// Implemented for raw tag-tree input (`serde_json::Value`) and for render-time
/// scope values, so decoding and rendering agree on what an integer is.
pub trait Kind {
    fn as_f64(&self) -> Option<f64>;

    /// Compact rendering used in error messages.
    fn describe(&self) -> String;

    /// True for numbers inside the safe-integer range.
    fn is_number(&self) -> bool {
        self.as_f64()
            .is_some_and(|n| (MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n))
    }

    fn is_integer(&self) -> bool {
        self.is_number() && self.as_f64().is_some_and(|n| n.fract() == 0.0)
    }

    /// The integer value, whether written `2` or `2.0`.
    #[allow(clippy::cast_possible_truncation)]
    fn as_integer(&self) -> Option<i64> {
        // safe-integer range fits in i64 exactly
        self.as_f64().filter(|_| self.is_integer()).map(|n| n as i64)
    }
}

impl Kind for JsonValue {
    fn as_f64(&self) -> Option<f64> {
        JsonValue::as_f64(self)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl Kind for Value {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Node(_) => "<node>".to_string(),
            Value::Function(f) => format!("<function {}>", f.name()),
            other => other.to_json().to_string(),
        }
    }
}

/// Describe an optional raw slot; a missing slot reads as `nothing`.
pub fn describe_slot(slot: Option<&JsonValue>) -> String {
    slot.map_or_else(|| "nothing".to_string(), Kind::describe)
}
