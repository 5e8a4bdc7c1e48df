use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// User settings. Values in the project's `settings` mapping take
/// precedence over the ones loaded from the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cmake_binary: String,
    pub ctest_binary: String,
    pub silence_developer_warnings: bool,
    pub always_clear_cache_before_configure: bool,
    pub write_build_targets_after_successful_configure: bool,
    pub ctest_command_line_args: Vec<String>,
    pub cmake_debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cmake_binary: "cmake".to_string(),
            ctest_binary: "ctest".to_string(),
            silence_developer_warnings: false,
            always_clear_cache_before_configure: false,
            write_build_targets_after_successful_configure: false,
            ctest_command_line_args: Vec::new(),
            cmake_debug: false,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// `<config dir>/cmake-builder/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cmake-builder").join("settings.json"))
    }

    /// Load `path`, or the default location when it exists, or defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Layer the project's `settings` mapping on top of `self`. Keys that are
    /// not settings (such as `cmake`) are ignored.
    pub fn with_project_overrides(self, project: &Map<String, Value>) -> Result<Self> {
        let Some(Value::Object(overrides)) = project.get("settings") else {
            return Ok(self);
        };
        let Value::Object(mut merged) = serde_json::to_value(&self)? else {
            return Ok(self);
        };
        for (key, value) in overrides {
            if merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
            }
        }
        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}
