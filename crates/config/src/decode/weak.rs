//! Weak typing: unambiguous conversions between strings, numbers and bools.
//!
//! Env vars are always strings and YAML happily produces numbers where a
//! string field was meant, so every schema field is nudged towards the JSON
//! shape its kind deserializes from before serde sees it.

use anyhow::{Context, anyhow, bail};
use serde_json::{Number, Value};

use crate::duration::format_duration;
use crate::flatten::value_kind;
use crate::schema::FieldKind;

/// Coerce a non-null value towards the JSON shape of `kind`.
pub(super) fn coerce(kind: &FieldKind, value: Value) -> anyhow::Result<Value> {
    match kind {
        FieldKind::String | FieldKind::Secret => to_string(value),
        FieldKind::Bool => to_bool(value),
        FieldKind::Integer => to_integer(value),
        FieldKind::Unsigned => to_unsigned(value),
        FieldKind::Float => to_float(value),
        FieldKind::Duration => to_duration(value),
        FieldKind::List(_) => Ok(match value {
            Value::Array(items) => Value::Array(items),
            single => Value::Array(vec![single]),
        }),
        FieldKind::Map(_) => match value {
            Value::Object(map) => Ok(Value::Object(map)),
            other => bail!("expected a map, got {}", value_kind(&other)),
        },
        FieldKind::Record(_) => match value {
            Value::Object(map) => Ok(Value::Object(map)),
            other => bail!("expected a record, got {}", value_kind(&other)),
        },
        FieldKind::Any => Ok(value),
    }
}

fn to_string(value: Value) -> anyhow::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(s)),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        other => bail!("expected a string, got {}", value_kind(&other)),
    }
}

fn to_bool(value: Value) -> anyhow::Result<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        Value::String(s) => parse_bool(&s).map(Value::Bool),
        other => bail!("expected a bool, got {}", value_kind(&other)),
    }
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s {
        "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        other => bail!("cannot parse \"{}\" as bool", other),
    }
}

fn to_integer(value: Value) -> anyhow::Result<Value> {
    match value {
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Ok(Value::Number(n))
            } else {
                let f = integral_float(&n)?;
                // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
                if f < i64::MIN as f64 || f >= i64::MAX as f64 {
                    bail!("{} is out of range for an integer field", n);
                }
                Ok(Value::from(f as i64))
            }
        }
        Value::Bool(b) => Ok(Value::from(i64::from(b))),
        Value::String(s) if s.is_empty() => Ok(Value::from(0i64)),
        Value::String(s) => parse_signed(&s).map(Value::from),
        other => bail!("expected an integer, got {}", value_kind(&other)),
    }
}

fn to_unsigned(value: Value) -> anyhow::Result<Value> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if n.is_i64() {
                bail!("cannot use negative number {} for an unsigned field", n)
            } else {
                let f = integral_float(&n)?;
                if f < 0.0 {
                    bail!("cannot use negative number {} for an unsigned field", n);
                }
                if f >= u64::MAX as f64 {
                    bail!("{} is out of range for an unsigned field", n);
                }
                Ok(Value::from(f as u64))
            }
        }
        Value::Bool(b) => Ok(Value::from(u64::from(b))),
        Value::String(s) if s.is_empty() => Ok(Value::from(0u64)),
        Value::String(s) => parse_unsigned(&s).map(Value::from),
        other => bail!("expected an unsigned integer, got {}", value_kind(&other)),
    }
}

fn to_float(value: Value) -> anyhow::Result<Value> {
    let f = match value {
        Value::Number(n) => return Ok(Value::Number(n)),
        Value::Bool(b) => f64::from(u8::from(b)),
        Value::String(s) if s.is_empty() => 0.0,
        Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("cannot parse \"{}\" as float", s))?,
        other => bail!("expected a float, got {}", value_kind(&other)),
    };
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| anyhow!("{} is not a finite float", f))
}

/// Strings are already canonical once `StringToDuration` has run; numbers
/// are nanoseconds; `{secs, nanos}` is the std serde shape of `Duration`.
fn to_duration(value: Value) -> anyhow::Result<Value> {
    if value.is_string() {
        return Ok(value);
    }
    let nanos: u64 = match &value {
        Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(u), _) => u,
            (None, Some(f)) if f >= 0.0 && f < u64::MAX as f64 => f as u64,
            _ => bail!("cannot use {} as a duration", n),
        },
        Value::Object(map) => {
            let secs = map.get("secs").and_then(Value::as_u64);
            let sub = map.get("nanos").and_then(Value::as_u64).unwrap_or(0);
            let secs = secs.ok_or_else(|| anyhow!("expected a duration, got struct"))?;
            secs.checked_mul(1_000_000_000)
                .and_then(|n| n.checked_add(sub))
                .ok_or_else(|| anyhow!("duration out of range"))?
        }
        other => bail!("expected a duration, got {}", value_kind(other)),
    };
    Ok(Value::String(format_duration(std::time::Duration::from_nanos(
        nanos,
    ))))
}

fn integral_float(n: &Number) -> anyhow::Result<f64> {
    let f = n.as_f64().ok_or_else(|| anyhow!("invalid number {}", n))?;
    if f.fract() != 0.0 || !f.is_finite() {
        bail!("cannot use {} for an integer field", n);
    }
    Ok(f)
}

/// Splits a radix prefix (`0x`, `0o`, `0b`) off an unsigned literal.
fn radix_of(s: &str) -> (u32, &str) {
    let lower = s.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (16, &s[2..]),
        Some("0o") => (8, &s[2..]),
        Some("0b") => (2, &s[2..]),
        _ => (10, s),
    }
}

fn parse_unsigned(s: &str) -> anyhow::Result<u64> {
    let digits = s.strip_prefix('+').unwrap_or(s);
    if digits.starts_with(['+', '-']) {
        bail!("cannot parse \"{}\" as unsigned integer", s);
    }
    let (radix, digits) = radix_of(digits);
    u64::from_str_radix(&digits.replace('_', ""), radix)
        .with_context(|| format!("cannot parse \"{}\" as unsigned integer", s))
}

fn parse_signed(s: &str) -> anyhow::Result<i64> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if rest.starts_with(['+', '-']) {
        bail!("cannot parse \"{}\" as integer", s);
    }
    let (radix, digits) = radix_of(rest);
    let magnitude = i128::from_str_radix(&digits.replace('_', ""), radix)
        .with_context(|| format!("cannot parse \"{}\" as integer", s))?;
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed).with_context(|| format!("\"{}\" is out of range for an integer", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_forms() {
        for (input, expected) in [
            (json!("true"), true),
            (json!("T"), true),
            (json!("1"), true),
            (json!("False"), false),
            (json!(""), false),
            (json!(0), false),
            (json!(2.5), true),
        ] {
            assert_eq!(coerce(&FieldKind::Bool, input).unwrap(), json!(expected));
        }
        assert!(coerce(&FieldKind::Bool, json!("yes")).is_err());
    }

    #[test]
    fn test_integer_forms() {
        assert_eq!(coerce(&FieldKind::Integer, json!("-42")).unwrap(), json!(-42));
        assert_eq!(coerce(&FieldKind::Integer, json!("0x1F")).unwrap(), json!(31));
        assert_eq!(coerce(&FieldKind::Integer, json!("1_000")).unwrap(), json!(1000));
        assert_eq!(coerce(&FieldKind::Integer, json!("")).unwrap(), json!(0));
        assert_eq!(coerce(&FieldKind::Integer, json!(true)).unwrap(), json!(1));
        assert_eq!(coerce(&FieldKind::Integer, json!(3.0)).unwrap(), json!(3));
        assert!(coerce(&FieldKind::Integer, json!(3.5)).is_err());
        assert!(coerce(&FieldKind::Integer, json!("abc")).is_err());
    }

    #[test]
    fn test_unsigned_forms() {
        assert_eq!(coerce(&FieldKind::Unsigned, json!("8080")).unwrap(), json!(8080));
        assert_eq!(coerce(&FieldKind::Unsigned, json!("0b101")).unwrap(), json!(5));
        assert!(coerce(&FieldKind::Unsigned, json!("-1")).is_err());
        assert!(coerce(&FieldKind::Unsigned, json!(-1)).is_err());
    }

    #[test]
    fn test_float_and_string_forms() {
        assert_eq!(coerce(&FieldKind::Float, json!("1.25")).unwrap(), json!(1.25));
        assert_eq!(coerce(&FieldKind::Float, json!(false)).unwrap(), json!(0.0));
        assert_eq!(coerce(&FieldKind::String, json!(8080)).unwrap(), json!("8080"));
        assert_eq!(coerce(&FieldKind::Secret, json!(true)).unwrap(), json!("true"));
        assert!(coerce(&FieldKind::String, json!({"a": 1})).is_err());
    }

    #[test]
    fn test_duration_forms() {
        assert_eq!(
            coerce(&FieldKind::Duration, json!(1_500_000_000u64)).unwrap(),
            json!("1.5s")
        );
        assert_eq!(
            coerce(&FieldKind::Duration, json!({"secs": 60, "nanos": 0})).unwrap(),
            json!("1m")
        );
        assert!(coerce(&FieldKind::Duration, json!(-5)).is_err());
    }

    #[test]
    fn test_collections() {
        let list = FieldKind::list_of(FieldKind::String);
        assert_eq!(coerce(&list, json!("solo")).unwrap(), json!(["solo"]));
        assert_eq!(coerce(&list, json!(["a"])).unwrap(), json!(["a"]));

        let map = FieldKind::map_of(FieldKind::String);
        assert!(coerce(&map, json!("a=b")).is_err());
        assert!(coerce(&FieldKind::Any, json!([1, {"x": null}])).is_ok());
    }

    #[test]
    fn test_out_of_range_floats_are_rejected() {
        assert!(coerce(&FieldKind::Integer, json!(1.0e30)).is_err());
        assert!(coerce(&FieldKind::Integer, json!(-1.0e30)).is_err());
        assert!(coerce(&FieldKind::Unsigned, json!(1.0e30)).is_err());
        assert!(coerce(&FieldKind::Duration, json!(1.0e30)).is_err());
        assert_eq!(coerce(&FieldKind::Integer, json!(-1.0e15)).unwrap(), json!(-1_000_000_000_000_000i64));
        assert_eq!(coerce(&FieldKind::Unsigned, json!(1.0e15)).unwrap(), json!(1_000_000_000_000_000u64));
    }

    #[test]
    fn test_repeated_sign_is_rejected() {
        for input in ["--5", "-+5", "+-5", "++5"] {
            assert!(coerce(&FieldKind::Integer, json!(input)).is_err(), "{input}");
            assert!(coerce(&FieldKind::Unsigned, json!(input)).is_err(), "{input}");
        }
        assert_eq!(coerce(&FieldKind::Integer, json!("+5")).unwrap(), json!(5));
        assert_eq!(coerce(&FieldKind::Unsigned, json!("+5")).unwrap(), json!(5));
    }

    #[test]
    fn test_record_requires_object() {
        let record = FieldKind::Record(crate::schema::Schema::new());
        assert_eq!(coerce(&record, json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert!(coerce(&record, json!("a")).is_err());
    }
}
