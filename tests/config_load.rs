// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use std::fs;

use geyser_harness::config::{load_config, ConfigError, HarnessConfig};
use geyser_harness::core::economics::tolerance::{CURRENCY_DELTA, SHARE_DELTA};
use tempfile::tempdir;

const TOKEN: &str = "0x00000000000000000000000000000000000000a1";
const GEYSER: &str = "0x00000000000000000000000000000000000000b2";

fn document(extra: &str) -> String {
    format!(
        r#"
[rpc]
url = "http://127.0.0.1:8545"

[contracts]
token = "{TOKEN}"
geyser = "{GEYSER}"
{extra}
"#
    )
}

#[test]
fn minimal_file_gets_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("harness.toml");
    fs::write(&path, document("")).expect("write");

    let cfg = load_config(&path).expect("config");
    assert_eq!(cfg.rpc.timeout_ms, 30_000);
    assert_eq!(cfg.verification.founder_percentage, None);
    assert_eq!(cfg.currency_delta(), CURRENCY_DELTA);
    assert_eq!(cfg.share_delta(), SHARE_DELTA);
    assert!(!cfg.logging.json);
    assert_eq!(cfg.logging.level, "info");

    let resolved = cfg.validate().expect("valid");
    assert_eq!(resolved.token.to_string(), TOKEN);
    assert_eq!(resolved.geyser.to_string(), GEYSER);
    assert!(resolved.owner.is_none());
    assert!(resolved.watch.is_empty());
}

#[test]
fn full_file_round_trips_every_section() {
    let cfg = HarnessConfig::from_toml_str(&document(&format!(
        r#"
[accounts]
owner = "{TOKEN}"
watch = ["{GEYSER}", "{TOKEN}"]

[verification]
founder_percentage = 10
currency_delta = 5

[logging]
json = true
level = "debug"
"#
    )))
    .expect("config");

    assert_eq!(cfg.verification.founder_percentage, Some(10));
    assert_eq!(cfg.verification.currency_delta, 5);
    assert!(cfg.logging.json);
    let resolved = cfg.validate().expect("valid");
    assert_eq!(resolved.watch.len(), 2);
    assert_eq!(resolved.owner.map(|o| o.to_string()).as_deref(), Some(TOKEN));
}

#[test]
fn founder_percentage_over_hundred_is_rejected() {
    let err = HarnessConfig::from_toml_str(&document("[verification]\nfounder_percentage = 101\n"))
        .expect_err("invalid");
    match err {
        ConfigError::Invalid { field, .. } => assert_eq!(field, "verification.founder_percentage"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn bad_watch_address_names_its_index() {
    let err = HarnessConfig::from_toml_str(&document(
        "[accounts]\nwatch = [\"0x00000000000000000000000000000000000000b2\", \"0x1234\"]\n",
    ))
    .expect_err("invalid");
    match err {
        ConfigError::Invalid { field, .. } => assert_eq!(field, "accounts.watch[1]"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn empty_url_is_rejected() {
    let raw = document("").replace("http://127.0.0.1:8545", " ");
    assert!(matches!(
        HarnessConfig::from_toml_str(&raw),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn malformed_toml_and_missing_files_are_reported() {
    assert!(matches!(
        HarnessConfig::from_toml_str("[rpc\nurl ="),
        Err(ConfigError::Parse(_))
    ));
    let dir = tempdir().expect("tempdir");
    assert!(matches!(
        load_config(dir.path().join("absent.toml")),
        Err(ConfigError::Read { .. })
    ));
}
