//! Bridge configuration – reads/writes `~/.simbridge/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which message family the bridge speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Ros,
    Apollo,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Ros => write!(f, "ros"),
            Protocol::Apollo => write!(f, "apollo"),
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ros" => Ok(Protocol::Ros),
            "apollo" => Ok(Protocol::Apollo),
            other => Err(format!("unknown protocol '{other}'")),
        }
    }
}

/// Persisted configuration stored in `~/.simbridge/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub protocol: Protocol,

    /// WebSocket URL of the `rosbridge_server`.
    #[serde(default = "default_rosbridge_url")]
    pub rosbridge_url: String,

    #[serde(default = "default_clock_topic")]
    pub clock_topic: String,

    #[serde(default = "default_control_topic")]
    pub control_topic: String,

    /// Clock publish rate in Hz.
    #[serde(default = "default_clock_hz")]
    pub clock_hz: u32,
}

fn default_rosbridge_url() -> String {
    "ws://localhost:9090".to_string()
}
fn default_clock_topic() -> String {
    "/clock".to_string()
}
fn default_control_topic() -> String {
    "/simulator/vehicle_control".to_string()
}
fn default_clock_hz() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            rosbridge_url: default_rosbridge_url(),
            clock_topic: default_clock_topic(),
            control_topic: default_control_topic(),
            clock_hz: default_clock_hz(),
        }
    }
}

/// Return the path to `~/.simbridge/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".simbridge").join("config.toml")
}

/// Load the config from disk, falling back to defaults when the file does
/// not exist.  Environment overrides are applied in both cases.
pub fn load() -> Result<Config, String> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if it is missing.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `SIMBRIDGE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SIMBRIDGE_PROTOCOL` | `protocol` |
/// | `SIMBRIDGE_ROSBRIDGE_URL` | `rosbridge_url` |
/// | `SIMBRIDGE_CLOCK_TOPIC` | `clock_topic` |
/// | `SIMBRIDGE_CONTROL_TOPIC` | `control_topic` |
/// | `SIMBRIDGE_CLOCK_HZ` | `clock_hz` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SIMBRIDGE_PROTOCOL")
        && let Ok(protocol) = v.parse::<Protocol>()
    {
        cfg.protocol = protocol;
    }
    if let Some(v) = lookup("SIMBRIDGE_ROSBRIDGE_URL") {
        cfg.rosbridge_url = v;
    }
    if let Some(v) = lookup("SIMBRIDGE_CLOCK_TOPIC") {
        cfg.clock_topic = v;
    }
    if let Some(v) = lookup("SIMBRIDGE_CONTROL_TOPIC") {
        cfg.control_topic = v;
    }
    if let Some(v) = lookup("SIMBRIDGE_CLOCK_HZ")
        && let Ok(hz) = v.parse::<u32>()
        && hz > 0
    {
        cfg.clock_hz = hz;
    }
}

/// Save the config to disk, creating `~/.simbridge/` if necessary.
pub fn save(cfg: &Config) -> Result<PathBuf, String> {
    let path = config_path();
    save_to(cfg, &path)?;
    Ok(path)
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.protocol, Protocol::Ros);
        assert_eq!(cfg.rosbridge_url, "ws://localhost:9090");
        assert_eq!(cfg.clock_topic, "/clock");
        assert_eq!(cfg.control_topic, "/simulator/vehicle_control");
        assert_eq!(cfg.clock_hz, 10);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: Config = toml::from_str("protocol = \"apollo\"\nclock_hz = 50\n").unwrap();
        assert_eq!(cfg.protocol, Protocol::Apollo);
        assert_eq!(cfg.clock_hz, 50);
        assert_eq!(cfg.rosbridge_url, "ws://localhost:9090");
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600, "config file must have 0o600 permissions");

        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700, "config directory must have 0o700 permissions");
    }

    #[test]
    fn roundtrip_custom_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config {
            protocol: Protocol::Apollo,
            rosbridge_url: "ws://sim-host:9090".into(),
            clock_hz: 100,
            ..Default::default()
        };
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn config_path_points_to_simbridge_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".simbridge"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "clock_hz = \"fast\"").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.contains("Failed to parse config"), "{err}");
    }

    #[test]
    fn overrides_replace_every_field() {
        let env = make_env(&[
            ("SIMBRIDGE_PROTOCOL", "Apollo"),
            ("SIMBRIDGE_ROSBRIDGE_URL", "ws://robot:9091"),
            ("SIMBRIDGE_CLOCK_TOPIC", "/sim/clock"),
            ("SIMBRIDGE_CONTROL_TOPIC", "/apollo/control"),
            ("SIMBRIDGE_CLOCK_HZ", "25"),
        ]);
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, |k| env.get(k).cloned());
        assert_eq!(cfg.protocol, Protocol::Apollo);
        assert_eq!(cfg.rosbridge_url, "ws://robot:9091");
        assert_eq!(cfg.clock_topic, "/sim/clock");
        assert_eq!(cfg.control_topic, "/apollo/control");
        assert_eq!(cfg.clock_hz, 25);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let env = make_env(&[("SIMBRIDGE_PROTOCOL", "carla"), ("SIMBRIDGE_CLOCK_HZ", "not-a-rate")]);
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, |k| env.get(k).cloned());
        assert_eq!(cfg, Config::default());

        let env = make_env(&[("SIMBRIDGE_CLOCK_HZ", "0")]);
        apply_overrides(&mut cfg, |k| env.get(k).cloned());
        assert_eq!(cfg.clock_hz, 10);
    }

    #[test]
    fn protocol_parsing() {
        assert_eq!("ros".parse::<Protocol>(), Ok(Protocol::Ros));
        assert_eq!("APOLLO".parse::<Protocol>(), Ok(Protocol::Apollo));
        assert!("lgsvl".parse::<Protocol>().is_err());
        assert_eq!(Protocol::Apollo.to_string(), "apollo");
    }
}
