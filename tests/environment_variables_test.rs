//! Integration tests for environment variable handling.
//!
//! These mutate the process environment, so every test holds `ENV_LOCK`.

use barkcast::Config;
use std::env;
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

// Global lock to prevent env var pollution between tests
static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: [&str; 3] = ["BARKCAST_CONFIG_DIR", "BARKCAST_ENCRYPT", "BARKCAST_SERVER_URL"];

/// Clears the barkcast env vars on creation and again on drop.
struct EnvGuard {
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for var in VARS {
            env::remove_var(var);
        }
        Self { _lock: lock }
    }

    fn set(&self, key: &str, value: &str) {
        env::set_var(key, value);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for var in VARS {
            env::remove_var(var);
        }
    }
}

#[test]
fn test_config_dir_respects_override() {
    let guard = EnvGuard::new();
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("nested");
    guard.set("BARKCAST_CONFIG_DIR", dir.to_str().unwrap());

    assert_eq!(Config::config_dir().unwrap(), dir);
    assert!(dir.is_dir(), "config dir is created on demand");
}

#[test]
fn test_load_reads_file_from_config_dir() {
    let guard = EnvGuard::new();
    let temp_dir = TempDir::new().unwrap();
    guard.set("BARKCAST_CONFIG_DIR", temp_dir.path().to_str().unwrap());

    let saved = Config {
        encryption_enabled: true,
        ..Config::default()
    };
    saved.save().unwrap();

    assert!(temp_dir.path().join("config.json").exists());
    assert_eq!(Config::load().unwrap(), saved);
}

#[test]
fn test_encrypt_env_overrides_file() {
    let guard = EnvGuard::new();
    let temp_dir = TempDir::new().unwrap();
    guard.set("BARKCAST_CONFIG_DIR", temp_dir.path().to_str().unwrap());
    Config {
        encryption_enabled: true,
        ..Config::default()
    }
    .save()
    .unwrap();

    guard.set("BARKCAST_ENCRYPT", "false");
    assert!(!Config::load().unwrap().encryption_enabled);

    guard.set("BARKCAST_ENCRYPT", "1");
    assert!(Config::load().unwrap().encryption_enabled);
}

#[test]
fn test_invalid_encrypt_env_is_ignored() {
    let guard = EnvGuard::new();
    guard.set("BARKCAST_ENCRYPT", "banana");

    let mut config = Config::default();
    config.apply_env_overrides();
    assert!(!config.encryption_enabled);
}

#[test]
fn test_server_url_env_sets_default_server() {
    let guard = EnvGuard::new();
    guard.set("BARKCAST_SERVER_URL", "https://push.example.com");

    let mut config = Config::default();
    config.apply_env_overrides();
    assert_eq!(config.default_server_url, "https://push.example.com");
}

#[test]
fn test_blank_server_url_env_is_ignored() {
    let guard = EnvGuard::new();
    guard.set("BARKCAST_SERVER_URL", "");

    let mut config = Config::default();
    config.apply_env_overrides();
    assert_eq!(config.default_server_url, "https://api.day.app");
}
