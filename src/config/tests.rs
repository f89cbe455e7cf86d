use super::load::{config_dir, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_segue_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("SEGUE_CONFIG_PATH", "/tmp/segue-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/segue-test-config.toml")
    );
}

#[test]
fn config_dir_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        config_dir().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home").join("segue")
    );
}

#[test]
fn config_dir_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        config_dir().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("segue")
    );
}

#[test]
fn defaults_pass_validation() {
    assert!(Settings::default().validate().is_ok());
}

#[test]
fn validate_rejects_zero_tick() {
    let mut s = Settings::default();
    s.controls.tick_ms = 0;
    assert!(s.validate().is_err());
}

#[test]
fn validate_rejects_out_of_range_volume() {
    let mut s = Settings::default();
    s.playback.volume = 3.0;
    assert!(s.validate().is_err());
}

#[test]
fn save_and_reload_round_trips_through_toml() {
    let _lock = env_lock();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let _g1 = EnvGuard::set("SEGUE_CONFIG_PATH", path.to_str().unwrap());

    let mut s = Settings::default();
    s.library.root = "/music/here".to_string();
    s.ui.visualizer = false;
    s.playback.volume = 0.8;
    s.save().unwrap();

    let loaded = Settings::load().unwrap();
    assert_eq!(loaded.library.root, "/music/here");
    assert!(!loaded.ui.visualizer);
    assert!((loaded.playback.volume - 0.8).abs() < f32::EPSILON);
}
