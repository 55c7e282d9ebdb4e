//! Argument decoding in both directions: typed OSC arguments to integers for
//! the MIDI path, and untyped command-line tokens to typed OSC values for
//! the send path.

use rosc::OscType;

use crate::error::{Error, Result};

/// Short name of an OSC argument's type, used in error messages.
pub fn type_name(arg: &OscType) -> &'static str {
    match arg {
        OscType::Int(_) => "int32",
        OscType::Long(_) => "int64",
        OscType::Float(_) => "float32",
        OscType::Double(_) => "float64",
        OscType::String(_) => "string",
        OscType::Blob(_) => "blob",
        OscType::Time(_) => "time",
        OscType::Char(_) => "char",
        OscType::Color(_) => "color",
        OscType::Midi(_) => "midi",
        OscType::Bool(_) => "bool",
        OscType::Array(_) => "array",
        OscType::Nil => "nil",
        OscType::Inf => "inf",
    }
}

/// Decode the argument at `index` as an integer.
///
/// Only 32-bit and 64-bit integer arguments are accepted. Floats are a type
/// mismatch, not rounded.
pub fn decode_inbound_int(arg: &OscType, index: usize) -> Result<i64> {
    match *arg {
        OscType::Int(v) => Ok(v as i64),
        OscType::Long(v) => Ok(v),
        ref other => Err(Error::TypeMismatch {
            index,
            found: type_name(other),
        }),
    }
}

/// Infer an OSC value from a text token: integer first, then float, then
/// the text itself. Never fails.
///
/// Integers that overflow 32 bits are narrowed, as are floats outside the
/// `f32` range. Hex floats with a binary exponent (`0x1p4`) count as floats.
pub fn decode_outbound_token(text: &str) -> OscType {
    if let Ok(num) = text.parse::<i64>() {
        return OscType::Int(num as i32);
    }
    if let Some(flt) = text.parse::<f64>().ok().or_else(|| parse_hex_float(text)) {
        return OscType::Float(flt as f32);
    }
    OscType::String(text.to_string())
}

/// `[+-]0x<hex>[.<hex>]p[+-]<dec>`. The exponent is required.
fn parse_hex_float(text: &str) -> Option<f64> {
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let rest = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))?;
    let (mantissa, exponent) = rest.split_once(|c| c == 'p' || c == 'P')?;
    let exponent: i32 = exponent.parse().ok()?;
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut value = 0f64;
    for c in whole.chars() {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }
    let mut scale = 1.0 / 16.0;
    for c in fraction.chars() {
        value += f64::from(c.to_digit(16)?) * scale;
        scale /= 16.0;
    }
    let value = value * 2f64.powi(exponent);
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_int_and_long() {
        assert_eq!(decode_inbound_int(&OscType::Int(144), 0).unwrap(), 144);
        assert_eq!(decode_inbound_int(&OscType::Int(-1), 1).unwrap(), -1);
        assert_eq!(decode_inbound_int(&OscType::Long(1 << 40), 2).unwrap(), 1 << 40);
    }

    #[test]
    fn test_inbound_rejects_non_integers() {
        let cases = [
            OscType::Float(64.0),
            OscType::Double(1.0),
            OscType::String("60".to_string()),
            OscType::Blob(vec![1, 2]),
            OscType::Bool(true),
            OscType::Nil,
        ];
        for arg in cases {
            match decode_inbound_int(&arg, 2) {
                Err(Error::TypeMismatch { index, found }) => {
                    assert_eq!(index, 2);
                    assert_eq!(found, type_name(&arg));
                }
                other => panic!("expected type mismatch for {:?}, got {:?}", arg, other),
            }
        }
    }

    #[test]
    fn test_outbound_inference_order() {
        assert_eq!(decode_outbound_token("42"), OscType::Int(42));
        assert_eq!(decode_outbound_token("-5"), OscType::Int(-5));
        assert_eq!(decode_outbound_token("+7"), OscType::Int(7));
        assert_eq!(decode_outbound_token("1.0"), OscType::Float(1.0));
        assert_eq!(decode_outbound_token("abc"), OscType::String("abc".to_string()));
        assert_eq!(decode_outbound_token(""), OscType::String(String::new()));
        assert_eq!(decode_outbound_token(" 42"), OscType::String(" 42".to_string()));
    }

    #[test]
    fn test_outbound_float_value() {
        match decode_outbound_token("3.14") {
            OscType::Float(v) => assert!((v - 3.14).abs() < 1e-6),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_outbound_narrowing() {
        // fits i64 but not i32: still an int, truncated
        assert_eq!(decode_outbound_token("4294967297"), OscType::Int(1));
        match decode_outbound_token("1e39") {
            OscType::Float(v) => assert!(v.is_infinite()),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_outbound_hex_float() {
        assert_eq!(decode_outbound_token("0x1p4"), OscType::Float(16.0));
        assert_eq!(decode_outbound_token("0x1.8p1"), OscType::Float(3.0));
        assert_eq!(decode_outbound_token("-0X.8P-1"), OscType::Float(-0.25));
        // no binary exponent: not a number at all
        assert_eq!(decode_outbound_token("0x10"), OscType::String("0x10".to_string()));
        assert_eq!(decode_outbound_token("0xp4"), OscType::String("0xp4".to_string()));
        assert_eq!(decode_outbound_token("0x1g"), OscType::String("0x1g".to_string()));
    }

    #[test]
    fn test_outbound_is_deterministic() {
        for token in ["42", "3.14", "abc", "-5", "", "/midi"] {
            assert_eq!(decode_outbound_token(token), decode_outbound_token(token));
        }
    }
}
