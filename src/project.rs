//! Access to the editor's project descriptor.
//!
//! The descriptor is a JSON object. Its `cmake` mapping lives under
//! `settings.cmake`, or at the top level for older project files. Hosts
//! provide the descriptor through [`ProjectStore`]; [`ProjectFile`] backs it
//! with a file on disk and [`MemoryProject`] keeps it in memory.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::expand::Variables;
use crate::platform::Platform;

pub type ProjectData = Map<String, Value>;

pub trait ProjectStore {
    /// A snapshot of the descriptor, if a project is open.
    fn project_data(&self) -> Option<ProjectData>;

    /// Replace the descriptor and persist it.
    fn set_project_data(&mut self, data: ProjectData) -> Result<()>;

    fn project_file_name(&self) -> Option<&Path>;

    /// Path variables available to placeholders in the cmake dictionary.
    fn extract_variables(&self, platform: Platform) -> Variables {
        project_variables(self.project_file_name(), platform)
    }
}

pub fn project_variables(project_file: Option<&Path>, platform: Platform) -> Variables {
    let mut vars = Variables::new();
    vars.insert("platform".to_string(), platform.to_string());
    let Some(file) = project_file else {
        return vars;
    };
    let lossy = |p: &Path| p.to_string_lossy().into_owned();
    vars.insert("project".to_string(), lossy(file));
    if let Some(dir) = file.parent() {
        vars.insert("project_path".to_string(), lossy(dir));
        vars.insert("folder".to_string(), lossy(dir));
    }
    if let Some(name) = file.file_name() {
        vars.insert("project_name".to_string(), lossy(Path::new(name)));
    }
    if let Some(stem) = file.file_stem() {
        vars.insert("project_base_name".to_string(), lossy(Path::new(stem)));
    }
    if let Some(ext) = file.extension() {
        vars.insert("project_extension".to_string(), lossy(Path::new(ext)));
    }
    vars
}

/// Where the cmake dictionary was found in the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLocation {
    /// `settings.cmake`
    Settings,
    /// `cmake`
    TopLevel,
}

pub fn cmake_section(project: &ProjectData) -> Option<(SectionLocation, &Map<String, Value>)> {
    if let Some(Value::Object(cmake)) = project
        .get("settings")
        .and_then(|settings| settings.get("cmake"))
    {
        return Some((SectionLocation::Settings, cmake));
    }
    match project.get("cmake") {
        Some(Value::Object(cmake)) => Some((SectionLocation::TopLevel, cmake)),
        _ => None,
    }
}

pub fn set_cmake_section(
    project: &mut ProjectData,
    location: SectionLocation,
    cmake: Map<String, Value>,
) {
    match location {
        SectionLocation::TopLevel => {
            project.insert("cmake".to_string(), Value::Object(cmake));
        }
        SectionLocation::Settings => {
            let settings = project
                .entry("settings")
                .or_insert_with(|| Value::Object(Map::new()));
            if !settings.is_object() {
                *settings = Value::Object(Map::new());
            }
            if let Value::Object(settings) = settings {
                settings.insert("cmake".to_string(), Value::Object(cmake));
            }
        }
    }
}

/// Look up `key`, preferring the platform-specific sub-mapping
/// (`cmake.linux.build_folder` over `cmake.build_folder`). `null` counts as
/// absent, and a `null` or empty platform value falls through to the common
/// one.
pub fn cmake_value<'a>(
    cmake: &'a Map<String, Value>,
    key: &str,
    platform: Platform,
) -> Option<&'a Value> {
    cmake
        .get(platform.key())
        .and_then(|sub| sub.get(key))
        .filter(|value| !is_unset(value))
        .or_else(|| cmake.get(key))
        .filter(|value| !value.is_null())
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Like [`cmake_value`] for string keys. Empty strings count as absent.
pub fn cmake_str<'a>(
    cmake: &'a Map<String, Value>,
    key: &'static str,
    platform: Platform,
) -> Result<Option<&'a str>> {
    match cmake_value(cmake, key, platform) {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::InvalidValue {
            key,
            reason: format!("must be a string, got {other}"),
        }),
    }
}

/// A project descriptor stored as a JSON file.
#[derive(Debug)]
pub struct ProjectFile {
    path: PathBuf,
    data: ProjectData,
}

impl ProjectFile {
    pub fn open<T>(path: T) -> Result<Self>
    where
        T: Into<PathBuf>,
    {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        let data = serde_json::from_str(&content)?;
        Ok(Self { path, data })
    }
}

impl ProjectStore for ProjectFile {
    fn project_data(&self) -> Option<ProjectData> {
        Some(self.data.clone())
    }

    fn set_project_data(&mut self, data: ProjectData) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&data)?;
        content.push('\n');
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "wrote project file");
        self.data = data;
        Ok(())
    }

    fn project_file_name(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// A descriptor held by the host in memory. Counts how often it was
/// persisted.
#[derive(Debug, Default)]
pub struct MemoryProject {
    path: Option<PathBuf>,
    data: Option<ProjectData>,
    writes: usize,
}

impl MemoryProject {
    pub fn new<T>(path: T, data: ProjectData) -> Self
    where
        T: Into<PathBuf>,
    {
        Self {
            path: Some(path.into()),
            data: Some(data),
            writes: 0,
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ProjectStore for MemoryProject {
    fn project_data(&self) -> Option<ProjectData> {
        self.data.clone()
    }

    fn set_project_data(&mut self, data: ProjectData) -> Result<()> {
        self.data = Some(data);
        self.writes += 1;
        Ok(())
    }

    fn project_file_name(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data(value: Value) -> ProjectData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn settings_section_wins_over_top_level() {
        let project = data(json!({
            "cmake": { "generator": "Ninja" },
            "settings": { "cmake": { "generator": "Unix Makefiles" } }
        }));
        let (location, cmake) = cmake_section(&project).unwrap();
        assert_eq!(location, SectionLocation::Settings);
        assert_eq!(cmake["generator"], "Unix Makefiles");
    }

    #[test]
    fn platform_value_overrides_common_value() {
        let cmake = data(json!({
            "build_folder": "build",
            "windows": { "build_folder": "build-win" },
            "generator": null
        }));
        assert_eq!(
            cmake_str(&cmake, "build_folder", Platform::Windows).unwrap(),
            Some("build-win")
        );
        assert_eq!(
            cmake_str(&cmake, "build_folder", Platform::Linux).unwrap(),
            Some("build")
        );
        assert_eq!(cmake_str(&cmake, "generator", Platform::Linux).unwrap(), None);
    }

    #[test]
    fn unset_platform_value_falls_through() {
        let cmake = data(json!({
            "build_folder": "build",
            "linux": { "build_folder": null },
            "osx": { "build_folder": "" }
        }));
        assert_eq!(
            cmake_str(&cmake, "build_folder", Platform::Linux).unwrap(),
            Some("build")
        );
        assert_eq!(
            cmake_str(&cmake, "build_folder", Platform::Osx).unwrap(),
            Some("build")
        );
    }

    #[test]
    fn non_string_value_is_rejected() {
        let cmake = data(json!({ "root_folder": 3 }));
        let err = cmake_str(&cmake, "root_folder", Platform::Linux).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { key: "root_folder", .. }));
    }

    #[test]
    fn set_section_creates_settings() {
        let mut project = data(json!({ "folders": [] }));
        set_cmake_section(
            &mut project,
            SectionLocation::Settings,
            data(json!({ "build_folder": "/tmp/x" })),
        );
        assert_eq!(
            Value::Object(project),
            json!({ "folders": [], "settings": { "cmake": { "build_folder": "/tmp/x" } } })
        );
    }

    #[test]
    fn variables_from_project_file() {
        let vars = project_variables(Some(Path::new("/src/app/app.sublime-project")), Platform::Linux);
        assert_eq!(vars["project_path"], "/src/app");
        assert_eq!(vars["project_name"], "app.sublime-project");
        assert_eq!(vars["project_base_name"], "app");
        assert_eq!(vars["project_extension"], "sublime-project");
        assert_eq!(vars["platform"], "Linux");
    }

    #[test]
    fn project_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.sublime-project");
        std::fs::write(&path, r#"{ "folders": [{ "path": "." }] }"#).unwrap();

        let mut project = ProjectFile::open(&path).unwrap();
        let mut contents = project.project_data().unwrap();
        contents.insert("cmake".to_string(), json!({ "generator": "Ninja" }));
        project.set_project_data(contents).unwrap();

        let reopened = ProjectFile::open(&path).unwrap();
        assert_eq!(reopened.project_data().unwrap()["cmake"]["generator"], "Ninja");
    }
}
