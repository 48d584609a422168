//! Human-readable durations.
//!
//! Responsibilities:
//! - Parse duration strings such as `30s`, `1.5h`, `2h45m` or `300ms`.
//! - Format a `Duration` back into the canonical form understood by the parser.
//! - Provide the serde field codec used by destination structures:
//!   `#[serde(with = "stratum_config::duration")]`.
//!
//! Invariants:
//! - `parse_duration(&format_duration(d)) == Ok(d)` for every `Duration`
//!   representable in `u64` nanoseconds.
//! - Bare integers are nanoseconds; the bare string `"0"` is zero.
//! - Negative durations are rejected (`std::time::Duration` is unsigned).

use std::time::Duration;

use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// Errors produced when a duration string cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration \"{0}\"")]
    Invalid(String),

    #[error("missing unit in duration \"{0}\"")]
    MissingUnit(String),

    #[error("unknown unit \"{unit}\" in duration \"{input}\"")]
    UnknownUnit { unit: String, input: String },

    #[error("negative duration \"{0}\" is not supported")]
    Negative(String),

    #[error("duration \"{0}\" is out of range")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(NANOS_PER_MIN),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Parse a duration string.
///
/// Supports a sequence of decimal numbers, each with an optional fraction and
/// a unit suffix (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`), e.g. `1h30m`,
/// `1.5s`, `250ms`. A leading `+` is accepted.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    let s = match s.strip_prefix('-') {
        Some(rest) if rest == "0" => return Ok(Duration::ZERO),
        Some(_) => return Err(DurationError::Negative(input.to_string())),
        None => s.strip_prefix('+').unwrap_or(s),
    };

    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let mut total: u128 = 0;
    let mut rest = s;

    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_num) = match after_int.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(after_dot.len());
                after_dot.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DurationError::Invalid(input.to_string()));
        }

        let unit_len = after_num
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_num.len());
        let (unit, remaining) = after_num.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let overflow = || DurationError::Overflow(input.to_string());

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut value = whole.checked_mul(scale).ok_or_else(overflow)?;

        // Fractions finer than a nanosecond are truncated.
        let mut divisor: u128 = 1;
        let mut fraction: u128 = 0;
        for digit in frac_part.bytes().take(18) {
            fraction = fraction * 10 + u128::from(digit - b'0');
            divisor *= 10;
        }
        if divisor > 1 {
            value = value
                .checked_add(fraction * scale / divisor)
                .ok_or_else(overflow)?;
        }

        total = total.checked_add(value).ok_or_else(overflow)?;
        rest = remaining;
    }

    let nanos = u64::try_from(total).map_err(|_| DurationError::Overflow(input.to_string()))?;
    Ok(Duration::from_nanos(nanos))
}

/// Format a duration in the canonical form accepted by [`parse_duration`].
///
/// Whole-second durations use `h`/`m`/`s` components (`1h30m`, `45s`),
/// sub-second durations use the largest exact unit (`250ms`, `1500ns`), and
/// mixed values carry a fractional seconds component (`1m1.5s`).
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_nanos();
    if total == 0 {
        return "0s".to_string();
    }

    if total < NANOS_PER_SEC {
        return if total % NANOS_PER_MILLI == 0 {
            format!("{}ms", total / NANOS_PER_MILLI)
        } else if total % NANOS_PER_MICRO == 0 {
            format!("{}us", total / NANOS_PER_MICRO)
        } else {
            format!("{}ns", total)
        };
    }

    let hours = total / NANOS_PER_HOUR;
    let minutes = (total % NANOS_PER_HOUR) / NANOS_PER_MIN;
    let seconds = (total % NANOS_PER_MIN) / NANOS_PER_SEC;
    let subsec = total % NANOS_PER_SEC;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if subsec > 0 {
        let frac = format!("{:09}", subsec);
        out.push_str(&format!("{}.{}s", seconds, frac.trim_end_matches('0')));
    } else if seconds > 0 {
        out.push_str(&format!("{}s", seconds));
    }
    out
}

/// Serde codec for `Duration` fields, as human-readable strings.
///
/// Deserialization accepts a duration string or an integer number of
/// nanoseconds.
pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_duration(*duration))
}

/// See [`serialize`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl serde::de::Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a duration string such as \"30s\" or an integer number of nanoseconds")
    }

    fn visit_str<E>(self, v: &str) -> Result<Duration, E>
    where
        E: serde::de::Error,
    {
        parse_duration(v).map_err(E::custom)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Duration, E>
    where
        E: serde::de::Error,
    {
        Ok(Duration::from_nanos(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Duration, E>
    where
        E: serde::de::Error,
    {
        u64::try_from(v)
            .map(Duration::from_nanos)
            .map_err(|_| E::custom(DurationError::Negative(v.to_string())))
    }
}

/// Serde codec for `Option<Duration>` fields.
pub mod option {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    struct Wrapped(#[serde(with = "super")] Duration);

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => super::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(d)| d))
    }
}
