//! Property-based tests for secret masking and value decoding.
//!
//! These tests use randomly generated inputs to verify that:
//! - Printable output never contains a secret, whatever its content.
//! - Non-secret values survive the printable view unchanged.
//! - Durations survive the canonical string form.
//! - Env-provided strings decode into the declared field types.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serial_test::serial;
use std::time::Duration;
use stratum_config::{
    Configurable, FieldKind, Loader, Schema, SecretString, constants::SECRET_MASK,
    format_duration, parse_duration, printable, redacted,
};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
struct Account {
    name: String,
    port: u16,
    #[serde(with = "stratum_config::duration")]
    timeout: Duration,
    password: SecretString,
}

impl Configurable for Account {
    fn schema() -> Schema {
        Schema::new()
            .field("name", FieldKind::String)
            .field("port", FieldKind::Unsigned)
            .field("timeout", FieldKind::Duration)
            .field("password", FieldKind::Secret)
    }
}

/// Prefixed so a secret can never collide with other output by chance.
fn secret_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9!@#$%^&*]{1,48}".prop_map(|s| format!("pw-{s}"))
}

fn duration_strategy() -> impl Strategy<Value = Duration> {
    (0u64..400_000, 0u32..1_000_000_000).prop_map(|(secs, nanos)| Duration::new(secs, nanos))
}

proptest! {
    #[test]
    fn prop_printable_never_leaks_secret(
        name in "[a-z]{1,12}",
        port in any::<u16>(),
        secret in secret_strategy(),
    ) {
        let account = Account {
            name,
            port,
            password: SecretString::from(secret.clone()),
            ..Default::default()
        };

        let out = printable(&account).unwrap();
        prop_assert!(!out.contains(&secret));
        prop_assert!(out.contains(SECRET_MASK));
    }

    #[test]
    fn prop_printable_preserves_non_secret_values(
        name in "[a-zA-Z0-9 _-]{0,24}",
        port in any::<u16>(),
        timeout in duration_strategy(),
    ) {
        let account = Account {
            name: name.clone(),
            port,
            timeout,
            password: SecretString::from("pw"),
        };

        let value = redacted(&account).unwrap();
        prop_assert_eq!(value["name"].as_str(), Some(name.as_str()));
        prop_assert_eq!(value["port"].as_u64(), Some(u64::from(port)));
        prop_assert_eq!(parse_duration(value["timeout"].as_str().unwrap()).unwrap(), timeout);
    }

    #[test]
    fn prop_duration_canonical_form_is_stable(d in duration_strategy()) {
        let formatted = format_duration(d);
        let parsed = parse_duration(&formatted).unwrap();
        prop_assert_eq!(parsed, d);
        prop_assert_eq!(format_duration(parsed), formatted);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    #[serial]
    fn prop_env_strings_decode_to_field_types(
        port in 1u16..,
        secs in 1u64..86_400,
        name in "[a-z][a-z0-9]{0,15}",
    ) {
        let dir = tempfile::TempDir::new().unwrap();
        temp_env::with_vars(
            [
                ("STRATUM_PROP_NAME", Some(name.clone())),
                ("STRATUM_PROP_PORT", Some(port.to_string())),
                ("STRATUM_PROP_TIMEOUT", Some(format!("{secs}s"))),
            ],
            || {
                let mut account = Account::default();
                Loader::new()
                    .with_path(dir.path())
                    .with_env_prefix("STRATUM_PROP")
                    .load(&mut account)
                    .unwrap();

                assert_eq!(account.name, name);
                assert_eq!(account.port, port);
                assert_eq!(account.timeout, Duration::from_secs(secs));
            },
        );
    }
}
