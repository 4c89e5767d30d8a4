//! Text codec for argument values
//!
//! Values persist as JSON text:
//!
//! | kind      | text                          |
//! |-----------|-------------------------------|
//! | string    | `"bot"`                       |
//! | integer   | `5`                           |
//! | float     | `2.5`, or `"NaN"`/`"inf"`/`"-inf"` |
//! | boolean   | `true`                        |
//! | vectorN   | `{"x":1,"y":2,"z":3}`         |
//! | choice    | `"fast"` (the tag, never its position) |
//!
//! Decoding is directed by the expected kind, because the same text can be
//! valid for several kinds (`"fast"` is both a string and a choice).

use super::{ChoiceSet, Value, ValueKind};
use crate::foundation::math::{Vec2, Vec3, Vec4, AXES};
use serde_json::{Map, Number, Value as Json};
use thiserror::Error;

const MAX_FRAGMENT_CHARS: usize = 64;

/// Codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Text does not hold a value of the expected kind
    #[error("cannot decode {fragment:?}: {reason}")]
    Decode {
        /// Offending piece of text
        fragment: String,
        /// What was wrong with it
        reason: String,
    },

    /// Choice tag is not part of the current choice set
    #[error("unknown choice {tag:?}")]
    UnknownChoice {
        /// The stored tag
        tag: String,
    },
}

/// Encode a value as persisted text
pub fn encode(value: &Value) -> String {
    to_json(value).to_string()
}

/// Decode persisted text as a value of `kind`
///
/// When `choices` is given, a decoded choice tag must belong to it.
pub fn decode(kind: ValueKind, text: &str, choices: Option<&ChoiceSet>) -> Result<Value, CodecError> {
    let json: Json = serde_json::from_str(text)
        .map_err(|e| decode_error(text, e.to_string()))?;

    match kind {
        ValueKind::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| decode_error(text, "expected a string")),
        ValueKind::Integer => json
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| decode_error(text, "expected an integer")),
        ValueKind::Float => float_from_json(&json)
            .map(Value::Float)
            .ok_or_else(|| decode_error(text, "expected a float")),
        ValueKind::Boolean => json
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| decode_error(text, "expected a boolean")),
        ValueKind::Vector2 => {
            let [x, y] = vector_from_json::<2>(&json, text)?;
            Ok(Value::Vector2(Vec2::new(x, y)))
        }
        ValueKind::Vector3 => {
            let [x, y, z] = vector_from_json::<3>(&json, text)?;
            Ok(Value::Vector3(Vec3::new(x, y, z)))
        }
        ValueKind::Vector4 => {
            let [x, y, z, w] = vector_from_json::<4>(&json, text)?;
            Ok(Value::Vector4(Vec4::new(x, y, z, w)))
        }
        ValueKind::Choice => {
            let tag = json
                .as_str()
                .ok_or_else(|| decode_error(text, "expected a choice tag"))?;
            match choices {
                Some(set) if !set.contains(tag) => Err(CodecError::UnknownChoice {
                    tag: tag.to_string(),
                }),
                _ => Ok(Value::Choice(tag.to_string())),
            }
        }
    }
}

/// Encode a choice set as a JSON array of tags
pub fn encode_choices(choices: &ChoiceSet) -> String {
    Json::Array(choices.iter().map(|tag| Json::String(tag.to_string())).collect()).to_string()
}

/// Decode a JSON array of tags
pub fn decode_choices(text: &str) -> Result<ChoiceSet, CodecError> {
    let tags: Vec<String> = serde_json::from_str(text)
        .map_err(|e| decode_error(text, e.to_string()))?;
    Ok(ChoiceSet::new(tags))
}

fn to_json(value: &Value) -> Json {
    match value {
        Value::String(s) | Value::Choice(s) => Json::String(s.clone()),
        Value::Integer(v) => Json::Number(Number::from(*v)),
        Value::Float(v) => float_to_json(*v),
        Value::Boolean(v) => Json::Bool(*v),
        Value::Vector2(v) => vector_to_json(v.as_slice()),
        Value::Vector3(v) => vector_to_json(v.as_slice()),
        Value::Vector4(v) => vector_to_json(v.as_slice()),
    }
}

fn non_finite_tag(v: f64) -> &'static str {
    if v.is_nan() {
        "NaN"
    } else if v.is_sign_positive() {
        "inf"
    } else {
        "-inf"
    }
}

fn float_to_json(v: f64) -> Json {
    Number::from_f64(v).map_or_else(|| Json::String(non_finite_tag(v).to_string()), Json::Number)
}

fn float_from_json(json: &Json) -> Option<f64> {
    match json {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "inf" => Some(f64::INFINITY),
            "-inf" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

// f32 components go through their shortest decimal form so `0.1f32` is
// stored as `0.1` rather than its widened f64 expansion.
fn component_to_json(c: f32) -> Json {
    if !c.is_finite() {
        return Json::String(non_finite_tag(f64::from(c)).to_string());
    }
    c.to_string()
        .parse::<Number>()
        .map_or_else(|_| float_to_json(f64::from(c)), Json::Number)
}

fn component_from_json(json: &Json) -> Option<f32> {
    match json {
        Json::Number(n) => n.to_string().parse::<f32>().ok(),
        #[allow(clippy::cast_possible_truncation)]
        Json::String(_) => float_from_json(json).map(|v| v as f32),
        _ => None,
    }
}

fn vector_to_json(components: &[f32]) -> Json {
    let record: Map<String, Json> = AXES
        .iter()
        .zip(components)
        .map(|(axis, c)| ((*axis).to_string(), component_to_json(*c)))
        .collect();
    Json::Object(record)
}

fn vector_from_json<const N: usize>(json: &Json, text: &str) -> Result<[f32; N], CodecError> {
    let record = json
        .as_object()
        .ok_or_else(|| decode_error(text, format!("expected a record with axes {:?}", &AXES[..N])))?;

    if let Some(extra) = record.keys().find(|key| !AXES[..N].contains(&key.as_str())) {
        return Err(decode_error(extra, format!("unexpected axis in a {N}-component vector")));
    }

    let mut components = [0.0f32; N];
    for (slot, axis) in components.iter_mut().zip(AXES) {
        let raw = record
            .get(axis)
            .ok_or_else(|| decode_error(text, format!("missing axis {axis:?}")))?;
        *slot = component_from_json(raw)
            .ok_or_else(|| decode_error(&raw.to_string(), format!("axis {axis:?} is not a number")))?;
    }
    Ok(components)
}

fn decode_error(text: &str, reason: impl Into<String>) -> CodecError {
    let fragment = match text.char_indices().nth(MAX_FRAGMENT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    };
    CodecError::Decode {
        fragment,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: &Value) -> Value {
        decode(value.kind(), &encode(value), None).expect("round trip")
    }

    #[test]
    fn test_round_trip_every_kind() {
        let values = [
            Value::from("bot"),
            Value::from(""),
            Value::from("quote \" and unicode \u{263a}"),
            Value::from(i64::MIN),
            Value::from(42),
            Value::from(2.5),
            Value::from(0.1),
            Value::from(-1.0e-300),
            Value::from(true),
            Value::from(false),
            Value::from(Vec2::new(0.1, -3.0)),
            Value::from(Vec3::new(1.5, 2.25, 1.0e30)),
            Value::from(Vec4::new(0.0, 1.0, 0.333_333_34, -7.0)),
            Value::choice("fast"),
        ];
        for value in &values {
            assert_eq!(&round_trip(value), value, "text was {}", encode(value));
        }
    }

    // Deterministic bit patterns covering every exponent range
    fn xorshift(seed: &mut u64) -> u64 {
        *seed ^= *seed << 13;
        *seed ^= *seed >> 7;
        *seed ^= *seed << 17;
        *seed
    }

    #[test]
    fn test_arbitrary_floats_round_trip_exactly() {
        let mut seed = 0x9e37_79b9_7f4a_7c15;
        for _ in 0..5000 {
            let v = f64::from_bits(xorshift(&mut seed));
            if !v.is_finite() {
                continue;
            }
            let text = encode(&Value::Float(v));
            let back = decode(ValueKind::Float, &text, None).expect("float text");
            assert_eq!(back.as_float().map(f64::to_bits), Some(v.to_bits()), "text was {text}");
        }
    }

    #[test]
    fn test_arbitrary_vector_components_round_trip_exactly() {
        let mut seed = 0x2545_f491_4f6c_dd1d;
        for _ in 0..2000 {
            let bits = xorshift(&mut seed);
            #[allow(clippy::cast_possible_truncation)]
            let (x, y) = (f32::from_bits(bits as u32), f32::from_bits((bits >> 32) as u32));
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            let value = Value::from(Vec2::new(x, y));
            assert_eq!(round_trip(&value), value, "text was {}", encode(&value));
        }
    }

    #[test]
    fn test_non_finite_floats_round_trip() {
        assert_eq!(encode(&Value::Float(f64::INFINITY)), "\"inf\"");
        assert_eq!(round_trip(&Value::Float(f64::NEG_INFINITY)), Value::Float(f64::NEG_INFINITY));
        let nan = round_trip(&Value::Float(f64::NAN));
        assert!(nan.as_float().is_some_and(f64::is_nan));

        let vector = Value::from(Vec2::new(f32::INFINITY, 1.0));
        assert_eq!(round_trip(&vector), vector);
    }

    #[test]
    fn test_vectors_use_axis_records() {
        assert_eq!(encode(&Value::from(Vec4::new(1.0, 2.0, 3.0, 4.0))), r#"{"x":1,"y":2,"z":3,"w":4}"#);
        assert_eq!(encode(&Value::from(Vec2::new(0.1, 0.5))), r#"{"x":0.1,"y":0.5}"#);
    }

    #[test]
    fn test_vector_key_order_does_not_matter() {
        let value = decode(ValueKind::Vector3, r#"{"z":3,"x":1,"y":2}"#, None).expect("decode");
        assert_eq!(value, Value::from(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_vector_shape_is_checked() {
        let missing = decode(ValueKind::Vector3, r#"{"x":1,"y":2}"#, None);
        assert!(matches!(missing, Err(CodecError::Decode { .. })));

        let extra = decode(ValueKind::Vector2, r#"{"x":1,"y":2,"z":3}"#, None);
        assert!(matches!(extra, Err(CodecError::Decode { fragment, .. }) if fragment == "z"));

        let bad = decode(ValueKind::Vector2, r#"{"x":1,"y":"up"}"#, None);
        assert!(matches!(bad, Err(CodecError::Decode { fragment, .. }) if fragment == "\"up\""));
    }

    #[test]
    fn test_kind_mismatch_is_decode_error() {
        assert!(decode(ValueKind::Integer, "2.5", None).is_err());
        assert!(decode(ValueKind::Boolean, "1", None).is_err());
        assert!(decode(ValueKind::String, "1", None).is_err());
        assert_eq!(decode(ValueKind::Float, "2", None), Ok(Value::Float(2.0)));
    }

    #[test]
    fn test_malformed_text_carries_fragment() {
        let err = decode(ValueKind::Integer, "{oops", None).expect_err("malformed");
        assert!(matches!(err, CodecError::Decode { fragment, .. } if fragment == "{oops"));

        let long = "x".repeat(200);
        let err = decode(ValueKind::String, &long, None).expect_err("malformed");
        assert!(matches!(err, CodecError::Decode { fragment, .. } if fragment.len() < 100));
    }

    #[test]
    fn test_choice_stability() {
        let choices = ChoiceSet::new(["slow", "fast"]);
        let text = encode(&Value::choice("fast"));
        assert_eq!(text, "\"fast\"");
        assert_eq!(decode(ValueKind::Choice, &text, Some(&choices)), Ok(Value::choice("fast")));

        let reordered = ChoiceSet::new(["fast", "slow"]);
        assert_eq!(decode(ValueKind::Choice, &text, Some(&reordered)), Ok(Value::choice("fast")));

        let shrunk = ChoiceSet::new(["slow"]);
        assert_eq!(
            decode(ValueKind::Choice, &text, Some(&shrunk)),
            Err(CodecError::UnknownChoice { tag: "fast".to_string() })
        );
    }

    #[test]
    fn test_choice_sets_round_trip() {
        let choices = ChoiceSet::new(["a", "b", "c"]);
        assert_eq!(decode_choices(&encode_choices(&choices)), Ok(choices));
        assert!(decode_choices("\"a\"").is_err());
    }
}
