//! Secret string values.
//!
//! Responsibilities:
//! - Wrap sensitive configuration values so they cannot be printed by accident.
//! - Provide an explicitly named accessor for the real value.
//! - Serialize the real value so configs can be decoded and persisted.
//! - Serialize the mask instead while a `masked` scope is active on the
//!   current thread, wherever the secret sits (nested records, lists, maps).
//!
//! Does NOT handle:
//! - Masking fields that are not `SecretString` but are declared
//!   `FieldKind::Secret` (see `decode::SecretMask`).
//!
//! Invariants:
//! - `Display` and `Debug` always render `SECRET_MASK`, never the value.
//! - The inner value is held in `secrecy::SecretString` and zeroized on drop.
//! - A `masked` scope is restored on exit, including on panic.

use std::cell::Cell;
use std::fmt;

use secrecy::ExposeSecret;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::SECRET_MASK;

thread_local! {
    static MASKING: Cell<bool> = const { Cell::new(false) };
}

/// Restores the previous masking state on drop.
struct MaskingGuard {
    previous: bool,
}

impl Drop for MaskingGuard {
    fn drop(&mut self) {
        MASKING.with(|cell| cell.set(self.previous));
    }
}

/// Run `f` with every `SecretString` serializing as `SECRET_MASK`.
pub(crate) fn masked<R>(f: impl FnOnce() -> R) -> R {
    let previous = MASKING.with(|cell| cell.replace(true));
    let _guard = MaskingGuard { previous };
    f()
}

fn masking() -> bool {
    MASKING.with(Cell::get)
}

/// A string-like configuration value whose formatting output is always masked.
///
/// ```
/// use stratum_config::SecretString;
///
/// let password = SecretString::from("hunter2");
/// assert_eq!(password.to_string(), "****************");
/// assert_eq!(password.secret(), "hunter2");
/// ```
#[derive(Clone)]
pub struct SecretString(secrecy::SecretString);

impl SecretString {
    /// Wrap a value.
    pub fn new(value: String) -> Self {
        Self(secrecy::SecretString::new(value.into()))
    }

    /// Returns the real, unmasked value.
    pub fn secret(&self) -> &str {
        self.0.expose_secret()
    }

    /// Returns true if the wrapped value is the empty string.
    pub fn is_empty(&self) -> bool {
        self.secret().is_empty()
    }
}

impl Default for SecretString {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SECRET_MASK)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretString").field(&SECRET_MASK).finish()
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.secret() == other.secret()
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if masking() {
            return serializer.serialize_str(SECRET_MASK);
        }
        self.secret().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_masked() {
        let secret = SecretString::from("hunter2");
        assert_eq!(format!("{}", secret), SECRET_MASK);
        assert_eq!(secret.to_string(), SECRET_MASK);
    }

    #[test]
    fn test_debug_does_not_expose_value() {
        let secret = SecretString::from("hunter2");
        let debug_output = format!("{:?}", secret);
        assert!(!debug_output.contains("hunter2"));
        assert!(debug_output.contains(SECRET_MASK));

        let pretty = format!("{:#?}", Some(secret));
        assert!(!pretty.contains("hunter2"));
    }

    #[test]
    fn test_secret_returns_real_value() {
        let secret = SecretString::new("hunter2".to_string());
        assert_eq!(secret.secret(), "hunter2");
        assert!(!secret.is_empty());
        assert!(SecretString::default().is_empty());
    }

    #[test]
    fn test_serde_carries_real_value() {
        let secret = SecretString::from("hunter2");
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"hunter2\"");

        let back: SecretString = serde_json::from_str(&json).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn test_masked_scope_replaces_value_and_restores() {
        let secrets = vec![SecretString::from("hunter2"), SecretString::from("s3cr3t")];

        let inside = masked(|| serde_json::to_string(&secrets).unwrap());
        assert!(!inside.contains("hunter2"));
        assert!(!inside.contains("s3cr3t"));
        assert_eq!(inside.matches(SECRET_MASK).count(), 2);

        let outside = serde_json::to_string(&secrets).unwrap();
        assert!(outside.contains("hunter2"));
    }

    #[test]
    fn test_masked_scope_nests() {
        let secret = SecretString::from("hunter2");
        let json = masked(|| {
            masked(|| ());
            serde_json::to_string(&secret).unwrap()
        });
        assert_eq!(json, format!("\"{}\"", SECRET_MASK));
    }
}
