//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional `key = value`
//! file, then `MACWATCH_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::capture::CaptureTarget;
use crate::error::ConfigError;
use crate::reporter::ReportFilter;

const DEFAULT_OUI_PATH: &str = "oui.txt";
const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;
const DEFAULT_REPORT_INTERVAL_MS: u64 = 1000;

/// Which interfaces get an aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InterfaceSelection {
    /// Every interface that is up
    #[default]
    All,
    /// Only the default interface (up, not loopback, has an address)
    First,
    /// A single reader bound to all interfaces
    CatchAll,
    /// Exactly the named interfaces
    Named(Vec<String>),
}

impl InterfaceSelection {
    /// Parse a `mode` value.
    pub fn from_mode(mode: &str) -> Result<Self, ConfigError> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(InterfaceSelection::All),
            "first" => Ok(InterfaceSelection::First),
            "catch-all" | "any" => Ok(InterfaceSelection::CatchAll),
            other => Err(ConfigError::InvalidSelection(other.to_string())),
        }
    }

    /// Turn the selection into concrete capture targets.
    ///
    /// `active` lists interfaces that are up; `default` is the preferred one
    /// among them.
    pub fn targets(&self, active: &[String], default: Option<&str>) -> Vec<CaptureTarget> {
        match self {
            InterfaceSelection::All => active
                .iter()
                .map(|name| CaptureTarget::Interface(name.clone()))
                .collect(),
            InterfaceSelection::First => default
                .or_else(|| active.first().map(String::as_str))
                .map(|name| vec![CaptureTarget::Interface(name.to_string())])
                .unwrap_or_default(),
            InterfaceSelection::CatchAll => vec![CaptureTarget::CatchAll],
            InterfaceSelection::Named(names) => names
                .iter()
                .map(|name| CaptureTarget::Interface(name.clone()))
                .collect(),
        }
    }
}

/// Values supplied on the command line; `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub interfaces: Vec<String>,
    pub mode: Option<String>,
    pub oui_path: Option<PathBuf>,
    pub read_timeout_ms: Option<u64>,
    pub report_interval_ms: Option<u64>,
    pub duration_secs: Option<u64>,
    pub hide_unresolved: bool,
    pub no_clear: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub selection: InterfaceSelection,
    pub oui_path: PathBuf,
    /// Upper bound on one blocking read, and so on stop latency
    pub read_timeout: Duration,
    pub report_interval: Duration,
    /// Stop after this long; `None` runs until interrupted
    pub duration: Option<Duration>,
    pub filter: ReportFilter,
    pub clear_screen: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selection: InterfaceSelection::default(),
            oui_path: PathBuf::from(DEFAULT_OUI_PATH),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            report_interval: Duration::from_millis(DEFAULT_REPORT_INTERVAL_MS),
            duration: None,
            filter: ReportFilter::default(),
            clear_screen: true,
        }
    }
}

/// Intermediate state while layers are applied.
#[derive(Debug, Default)]
struct Builder {
    config: Config,
    interfaces: Vec<String>,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::load_with_env(config_file, overrides, |key| std::env::var(key).ok())
    }

    /// Build the configuration with an explicit environment lookup.
    pub fn load_with_env<F>(
        config_file: Option<&Path>,
        overrides: &Overrides,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Builder::default();

        if let Some(path) = config_file {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            builder.apply_file(&content)?;
        }

        // Allow environment variable overrides
        if let Some(val) = env("MACWATCH_OUI_PATH") {
            builder.config.oui_path = PathBuf::from(val);
        }
        if let Some(val) = env("MACWATCH_MODE") {
            builder.override_mode(&val)?;
        }
        if let Some(val) = env("MACWATCH_INTERFACES") {
            builder.interfaces = split_list(&val);
        }

        builder.apply_overrides(overrides)?;
        Ok(builder.finish())
    }
}

impl Builder {
    fn apply_file(&mut self, content: &str) -> Result<(), ConfigError> {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!("Ignoring config line without '=': {}", line);
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "interfaces" => self.interfaces = split_list(value),
                "mode" => self.config.selection = InterfaceSelection::from_mode(value)?,
                "oui_path" => self.config.oui_path = PathBuf::from(value),
                "read_timeout_ms" => {
                    self.config.read_timeout = positive_millis(key, parse_number(key, value)?)?
                }
                "report_interval_ms" => {
                    self.config.report_interval = positive_millis(key, parse_number(key, value)?)?
                }
                "duration_secs" => self.config.duration = duration_secs(parse_number(key, value)?),
                "hide_unresolved" => {
                    if parse_bool(key, value)? {
                        self.config.filter = ReportFilter::HideUnresolved;
                    } else {
                        self.config.filter = ReportFilter::ShowAll;
                    }
                }
                "clear_screen" => self.config.clear_screen = parse_bool(key, value)?,
                _ => warn!("Unknown config key: {}", key),
            }
        }
        Ok(())
    }

    /// A mode from a higher layer replaces interface names from lower ones.
    /// Names given in the same layer are applied afterwards and still win.
    fn override_mode(&mut self, mode: &str) -> Result<(), ConfigError> {
        self.config.selection = InterfaceSelection::from_mode(mode)?;
        self.interfaces.clear();
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
        if let Some(mode) = &overrides.mode {
            self.override_mode(mode)?;
        }
        if !overrides.interfaces.is_empty() {
            self.interfaces = overrides.interfaces.clone();
        }
        if let Some(path) = &overrides.oui_path {
            self.config.oui_path = path.clone();
        }
        if let Some(ms) = overrides.read_timeout_ms {
            self.config.read_timeout = positive_millis("read_timeout_ms", ms)?;
        }
        if let Some(ms) = overrides.report_interval_ms {
            self.config.report_interval = positive_millis("report_interval_ms", ms)?;
        }
        if let Some(secs) = overrides.duration_secs {
            self.config.duration = duration_secs(secs);
        }
        if overrides.hide_unresolved {
            self.config.filter = ReportFilter::HideUnresolved;
        }
        if overrides.no_clear {
            self.config.clear_screen = false;
        }
        Ok(())
    }

    /// Explicit interface names win over a mode from the same or a lower layer.
    fn finish(self) -> Config {
        let mut config = self.config;
        if !self.interfaces.is_empty() {
            config.selection = InterfaceSelection::Named(self.interfaces);
        }
        config
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn positive_millis(key: &str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: ms.to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

/// Zero means "no time budget".
fn duration_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_with_env(None, &Overrides::default(), no_env).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.read_timeout, Duration::from_millis(1000));
        assert_eq!(config.report_interval, Duration::from_secs(1));
        assert_eq!(config.oui_path, PathBuf::from("oui.txt"));
        assert_eq!(config.selection, InterfaceSelection::All);
    }

    #[test]
    fn test_file_values() {
        let file = config_file(
            "# macwatch\n\
             mode = first\n\
             oui_path = /usr/share/ieee-data/oui.txt\n\
             read_timeout_ms = 250\n\
             report_interval_ms = 2000\n\
             duration_secs = 60\n\
             hide_unresolved = yes\n\
             clear_screen = false\n\
             colour = blue\n",
        );

        let config = Config::load_with_env(Some(file.path()), &Overrides::default(), no_env).unwrap();

        assert_eq!(config.selection, InterfaceSelection::First);
        assert_eq!(config.oui_path, PathBuf::from("/usr/share/ieee-data/oui.txt"));
        assert_eq!(config.read_timeout, Duration::from_millis(250));
        assert_eq!(config.report_interval, Duration::from_secs(2));
        assert_eq!(config.duration, Some(Duration::from_secs(60)));
        assert_eq!(config.filter, ReportFilter::HideUnresolved);
        assert!(!config.clear_screen);
    }

    #[test]
    fn test_precedence() {
        let file = config_file("oui_path = from-file.txt\ninterfaces = eth0\nduration_secs = 30\n");
        let env: HashMap<&str, &str> = [
            ("MACWATCH_OUI_PATH", "from-env.txt"),
            ("MACWATCH_INTERFACES", "eth1, wlan0"),
        ]
        .into_iter()
        .collect();
        let overrides = Overrides {
            duration_secs: Some(0),
            no_clear: true,
            ..Overrides::default()
        };

        let config = Config::load_with_env(Some(file.path()), &overrides, |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.oui_path, PathBuf::from("from-env.txt"));
        assert_eq!(
            config.selection,
            InterfaceSelection::Named(vec!["eth1".to_string(), "wlan0".to_string()])
        );
        assert_eq!(config.duration, None);
        assert!(!config.clear_screen);
    }

    #[test]
    fn test_cli_interfaces_beat_mode() {
        let overrides = Overrides {
            interfaces: vec!["eth2".to_string()],
            mode: Some("catch-all".to_string()),
            ..Overrides::default()
        };

        let config = Config::load_with_env(None, &overrides, no_env).unwrap();

        assert_eq!(config.selection, InterfaceSelection::Named(vec!["eth2".to_string()]));
    }

    #[test]
    fn test_cli_mode_replaces_file_interfaces() {
        let file = config_file("interfaces = eth0\n");
        let overrides = Overrides {
            mode: Some("first".to_string()),
            ..Overrides::default()
        };

        let config = Config::load_with_env(Some(file.path()), &overrides, no_env).unwrap();

        assert_eq!(config.selection, InterfaceSelection::First);
    }

    #[test]
    fn test_env_mode_replaces_file_interfaces() {
        let file = config_file("interfaces = eth0\n");
        let env = |key: &str| (key == "MACWATCH_MODE").then(|| "catch-all".to_string());

        let config = Config::load_with_env(Some(file.path()), &Overrides::default(), env).unwrap();

        assert_eq!(config.selection, InterfaceSelection::CatchAll);
    }

    #[test]
    fn test_env_mode_and_interfaces_keep_interfaces() {
        let env: HashMap<&str, &str> = [("MACWATCH_MODE", "first"), ("MACWATCH_INTERFACES", "eth3")]
            .into_iter()
            .collect();

        let config = Config::load_with_env(None, &Overrides::default(), |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.selection, InterfaceSelection::Named(vec!["eth3".to_string()]));
    }

    #[test]
    fn test_file_interfaces_beat_file_mode() {
        let file = config_file("interfaces = eth0\nmode = catch-all\n");

        let config = Config::load_with_env(Some(file.path()), &Overrides::default(), no_env).unwrap();

        assert_eq!(config.selection, InterfaceSelection::Named(vec!["eth0".to_string()]));
    }

    #[test]
    fn test_invalid_values() {
        let file = config_file("read_timeout_ms = soon\n");
        let result = Config::load_with_env(Some(file.path()), &Overrides::default(), no_env);
        assert!(matches!(result, Err(ConfigError::InvalidValue { key, .. }) if key == "read_timeout_ms"));

        let overrides = Overrides {
            report_interval_ms: Some(0),
            ..Overrides::default()
        };
        let result = Config::load_with_env(None, &overrides, no_env);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let overrides = Overrides {
            mode: Some("some".to_string()),
            ..Overrides::default()
        };
        let result = Config::load_with_env(None, &overrides, no_env);
        assert!(matches!(result, Err(ConfigError::InvalidSelection(mode)) if mode == "some"));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.conf");

        let result = Config::load_with_env(Some(&path), &Overrides::default(), no_env);

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_selection_targets() {
        let active = vec!["lo".to_string(), "eth0".to_string(), "wlan0".to_string()];

        assert_eq!(
            InterfaceSelection::All.targets(&active, Some("eth0")),
            vec![
                CaptureTarget::Interface("lo".to_string()),
                CaptureTarget::Interface("eth0".to_string()),
                CaptureTarget::Interface("wlan0".to_string()),
            ]
        );
        assert_eq!(
            InterfaceSelection::First.targets(&active, Some("eth0")),
            vec![CaptureTarget::Interface("eth0".to_string())]
        );
        assert_eq!(
            InterfaceSelection::First.targets(&active, None),
            vec![CaptureTarget::Interface("lo".to_string())]
        );
        assert!(InterfaceSelection::First.targets(&[], None).is_empty());
        assert_eq!(
            InterfaceSelection::CatchAll.targets(&active, None),
            vec![CaptureTarget::CatchAll]
        );
        assert_eq!(
            InterfaceSelection::Named(vec!["eth9".to_string()]).targets(&active, None),
            vec![CaptureTarget::Interface("eth9".to_string())]
        );
    }

    #[test]
    fn test_from_mode() {
        assert_eq!(InterfaceSelection::from_mode("ALL").unwrap(), InterfaceSelection::All);
        assert_eq!(InterfaceSelection::from_mode(" any ").unwrap(), InterfaceSelection::CatchAll);
        assert!(InterfaceSelection::from_mode("").is_err());
    }
}
