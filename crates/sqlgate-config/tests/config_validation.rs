//! Config loading and validation tests for sqlgate-config.
// crates/sqlgate-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Validate defaults, file loading, and fail-closed checks.
// Purpose: Ensure invalid configuration never reaches the server.
// =============================================================================

use std::path::PathBuf;

use sqlgate_config::AuditSinkKind;
use sqlgate_config::ConfigError;
use sqlgate_config::GatewayConfig;
use sqlgate_store_sqlite::SqliteStoreMode;
use sqlgate_store_sqlite::SqliteSyncMode;

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn default_config_validates() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:3000" {
        return Err(format!("unexpected default bind {}", config.server.bind));
    }
    if config.server.max_body_bytes != 1024 * 1024 {
        return Err("default body limit should be 1 MiB".to_string());
    }
    if config.server.fallback_redirect != "/docs" {
        return Err("default redirect should be /docs".to_string());
    }
    if config.storage.root != PathBuf::from("./data") {
        return Err("default storage root should be ./data".to_string());
    }
    if config.storage.journal_mode != SqliteStoreMode::Delete
        || config.storage.sync_mode != SqliteSyncMode::Full
    {
        return Err("default journal/sync modes should be delete/full".to_string());
    }
    if config.logging.sink != AuditSinkKind::Stderr {
        return Err("default audit sink should be stderr".to_string());
    }
    Ok(())
}

#[test]
fn full_file_round_trips_into_store_config() -> TestResult {
    let (_dir, path) = common::write_config(
        br#"
[server]
bind = "0.0.0.0:8080"
max_body_bytes = 4096
fallback_redirect = "https://example.com/"
cors_allowed_origins = ["https://app.example.com"]

[storage]
root = "/var/lib/sqlgate"
busy_timeout_ms = 250
journal_mode = "wal"
sync_mode = "normal"

[logging]
sink = "none"
"#,
    )?;
    let config = GatewayConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    let store = config.storage.store_config();
    if store.busy_timeout_ms != 250
        || store.journal_mode != SqliteStoreMode::Wal
        || store.sync_mode != SqliteSyncMode::Normal
    {
        return Err("store config not carried through".to_string());
    }
    if config.server.bind_addr().map_err(|err| err.to_string())?.port() != 8080 {
        return Err("bind port should be 8080".to_string());
    }
    if config.logging.sink != AuditSinkKind::None {
        return Err("sink should be none".to_string());
    }
    Ok(())
}

#[test]
fn explicit_missing_file_is_io_error() -> TestResult {
    let dir = tempfile::TempDir::new().map_err(|err| err.to_string())?;
    let result = GatewayConfig::load(Some(&dir.path().join("absent.toml")));
    match result {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(error) => Err(format!("expected io error, got {error}")),
        Ok(_) => Err("expected io error, got a config".to_string()),
    }
}

#[test]
fn malformed_toml_is_parse_error() -> TestResult {
    let (_dir, path) = common::write_config(b"[server\nbind = ")?;
    assert_invalid(GatewayConfig::load(Some(&path)), "config parse error")
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let (_dir, path) = common::write_config(&[0xff, 0xfe, 0x00])?;
    assert_invalid(GatewayConfig::load(Some(&path)), "utf-8")
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let content = vec![b'#'; 1024 * 1024 + 1];
    let (_dir, path) = common::write_config(&content)?;
    assert_invalid(GatewayConfig::load(Some(&path)), "size limit")
}

#[test]
fn unparseable_bind_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = "localhost".to_string();
    assert_invalid(config.validate(), "server.bind")
}

#[test]
fn zero_body_limit_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")
}

#[test]
fn redirect_must_be_path_or_http_url() -> TestResult {
    for target in ["docs", "//evil.example", "javascript:alert(1)", "/docs\r\nSet-Cookie: x"] {
        let mut config = common::minimal_config().map_err(|err| err.to_string())?;
        config.server.fallback_redirect = target.to_string();
        assert_invalid(config.validate(), "fallback_redirect")?;
    }
    for target in ["/", "/docs", "https://example.com/"] {
        let mut config = common::minimal_config().map_err(|err| err.to_string())?;
        config.server.fallback_redirect = target.to_string();
        config.validate().map_err(|err| err.to_string())?;
    }
    Ok(())
}

#[test]
fn cors_origins_must_be_http() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.server.cors_allowed_origins = vec!["ftp://files.example".to_string()];
    assert_invalid(config.validate(), "cors_allowed_origins")
}

#[test]
fn empty_storage_root_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.root = PathBuf::from("  ");
    assert_invalid(config.validate(), "storage.root")
}

#[test]
fn excessive_busy_timeout_is_rejected() -> TestResult {
    let mut config = common::minimal_config().map_err(|err| err.to_string())?;
    config.storage.busy_timeout_ms = 600_000;
    assert_invalid(config.validate(), "busy_timeout_ms")
}

#[test]
fn unknown_journal_mode_is_parse_error() -> TestResult {
    let result = common::config_from_toml("[storage]\njournal_mode = \"memory\"\n");
    if result.is_ok() {
        return Err("journal_mode = memory should not parse".to_string());
    }
    Ok(())
}
