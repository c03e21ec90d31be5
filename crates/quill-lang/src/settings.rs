use serde::{Deserialize, Serialize};

use crate::runtime::value::{Object, Value};

/// Host configuration for one run. Every field has a default, so a partial
/// JSON document (or `{}`) deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub canvas: CanvasSettings,
    /// Binds the `fs` namespace.
    pub enable_filesystem: bool,
    /// Binds the `shell` namespace.
    pub enable_shell: bool,
    pub config: Config,
    /// Deepest allowed nesting of script function calls.
    pub max_call_depth: usize,
}

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

impl Default for Settings {
    fn default() -> Self {
        Self {
            canvas: CanvasSettings::default(),
            enable_filesystem: false,
            enable_shell: false,
            config: Config::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub resolution: Resolution,
    pub background: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub x: u32,
    pub y: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self { x: 128, y: 64 }
    }
}

/// Channels are whatever numbers the script passed; nothing is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// Exposed to scripts as the `config` variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub editor: String,
    pub autosave: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            editor: "unknown".to_string(),
            autosave: false,
        }
    }
}

impl Config {
    pub fn to_object(&self) -> Object {
        [
            ("version", Value::str(&self.version)),
            ("editor", Value::str(&self.editor)),
            ("autosave", Value::Bool(self.autosave)),
        ]
        .into_iter()
        .collect()
    }
}
