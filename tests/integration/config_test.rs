//! Config Integration Tests
//!
//! File loading plus environment and command-line override layering.

use std::collections::HashMap;

use gem_eye::models::settings::{resolve_api_key, API_KEY_ENV, MODEL_ENV, PROXY_ENV};
use gem_eye::{AppConfig, ConfigService, SettingsUpdate};
use gem_eye_core::ProxyProtocol;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_override_precedence_file_env_cli() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"model": "from-file", "temperature": 0.3}"#).unwrap();

    let mut service = ConfigService::open(&path).unwrap();
    assert_eq!(service.get_config().model, "from-file");

    let env = lookup(&[(MODEL_ENV, "from-env"), (PROXY_ENV, "socks5://10.0.0.1:1080")]);
    service
        .overlay(AppConfig::env_overrides(&env).unwrap())
        .unwrap();
    assert_eq!(service.get_config().model, "from-env");

    service
        .overlay(SettingsUpdate {
            model: Some("from-cli".to_string()),
            ..Default::default()
        })
        .unwrap();

    let config = service.get_config();
    assert_eq!(config.model, "from-cli");
    assert!((config.temperature - 0.3).abs() < f32::EPSILON);
    let proxy = config.proxy.as_ref().unwrap();
    assert_eq!(proxy.protocol, ProxyProtocol::Socks5);
    assert_eq!(proxy.port, 1080);
}

#[test]
fn test_credential_never_written_to_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let service = ConfigService::init(&path, false).unwrap();

    let api_key = resolve_api_key(lookup(&[(API_KEY_ENV, "secret-key")]));
    let provider = service.get_config().provider_config(api_key);
    assert_eq!(provider.api_key.as_deref(), Some("secret-key"));

    service.save().unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(!written.contains("secret-key"));
    assert!(!written.contains("api_key"));
}
