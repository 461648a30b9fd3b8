//! Configuration data model

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize)]
pub struct Config {
    pub global: GlobalConfig,
    /// The keyboard to read from, if configured
    pub input: Option<InputConfig>,
    /// How the virtual output keyboard presents itself
    pub output: UinputConfig,
}

/// Global settings
#[derive(Debug, Clone, Serialize)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
    /// Period of the daemon's statistics tick
    pub tick_interval_ms: u64,
}

impl GlobalConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            tick_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// The physical keyboard events are read from
#[derive(Debug, Clone, Serialize)]
pub struct InputConfig {
    /// evdev node, e.g. `/dev/input/by-id/usb-...-event-kbd`
    pub device: PathBuf,
    /// Grab the device so only keybridge sees its events
    pub grab: bool,
}

/// Description of the virtual output keyboard.
///
/// Supplied once when the device is registered and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UinputConfig {
    /// Name the device registers under
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
    /// uinput control file
    pub path: PathBuf,
    /// Shell command run once after the device is registered
    pub post_init: Option<String>,
}

impl Default for UinputConfig {
    fn default() -> Self {
        Self {
            name: "keybridge".to_string(),
            vendor: 0x1235,
            product: 0x5679,
            version: 0,
            path: PathBuf::from("/dev/uinput"),
            post_init: None,
        }
    }
}
