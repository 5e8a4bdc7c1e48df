//! "Help! What should I do?": a table of everything that has to be in place
//! before configuring works.

use std::fmt;

use comfy_table::Table;
use serde_json::Value;

use crate::cache::has_cache;
use crate::capabilities::{self, Capabilities};
use crate::expand::expand_map;
use crate::platform::Platform;
use crate::project::{ProjectStore, cmake_section, cmake_str, cmake_value};
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub check: String,
    pub value: String,
    pub suggestion: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub checks: Vec<Check>,
}

impl Diagnosis {
    pub fn run(settings: &Settings, project: Option<&dyn ProjectStore>, platform: Platform) -> Self {
        let mut diagnosis = Self::default();
        diagnosis.push("cmake binary", &settings.cmake_binary, "");

        let version = match capabilities::version(&settings.cmake_binary) {
            Ok(version) => version,
            Err(_) => {
                diagnosis.push("cmake present", false, "Install cmake");
                return diagnosis;
            }
        };
        diagnosis.push("cmake version", version, "");

        let file_api = Capabilities::query(&settings.cmake_binary)
            .map(|caps| caps.has_file_api())
            .unwrap_or(false);
        if !file_api {
            diagnosis.push("File API", false, "Download cmake version >= 3.15");
            return diagnosis;
        }
        diagnosis.push("File API", true, "");

        diagnosis.check_project(project, platform);
        diagnosis
    }

    /// The part of the diagnosis that only looks at the project.
    pub fn check_project(&mut self, project: Option<&dyn ProjectStore>, platform: Platform) {
        let Some((project, file)) =
            project.and_then(|p| Some((p, p.project_file_name()?.display().to_string())))
        else {
            self.push("project file", "NOT FOUND", "Open a project file");
            return;
        };
        self.push("project file", file, "");

        let data = project.project_data().unwrap_or_default();
        let Some((_, cmake)) = cmake_section(&data) else {
            self.push(
                "cmake dictionary present in settings",
                false,
                "Create a cmake dictionary in your settings",
            );
            return;
        };
        let cmake = match expand_map(cmake, &project.extract_variables(platform)) {
            Ok(cmake) => cmake,
            Err(e) => {
                self.push("cmake dictionary expands", false, e);
                return;
            }
        };

        let Ok(Some(build_folder)) = cmake_str(&cmake, "build_folder", platform) else {
            self.push(
                "build_folder present in cmake dictionary",
                false,
                "Write a build_folder key",
            );
            return;
        };
        self.push("cmake dictionary present in settings", true, "");
        self.push("build folder", build_folder, "");

        if let Some(Value::Object(overrides)) =
            cmake_value(&cmake, "command_line_overrides", platform)
        {
            if !overrides.is_empty() {
                self.push("overrides", Value::Object(overrides.clone()), "");
            }
        }

        let build_folder = std::path::Path::new(build_folder);
        let build_folder = match project.project_file_name().and_then(|f| f.parent()) {
            Some(dir) => dir.join(build_folder),
            None => build_folder.to_path_buf(),
        };
        if has_cache(&build_folder) {
            self.push("CMakeCache.txt file present", true, "");
        } else {
            self.push("CMakeCache.txt file present", false, "Run the Configure command");
        }
    }

    fn push(&mut self, check: &str, value: impl fmt::Display, suggestion: impl fmt::Display) {
        self.checks.push(Check {
            check: check.to_string(),
            value: value.to_string(),
            suggestion: suggestion.to_string(),
        });
    }

    pub fn render(&self) -> String {
        let mut table = Table::new();
        table.set_header(vec!["CHECK", "VALUE", "SUGGESTION/FIX"]);
        for check in &self.checks {
            table.add_row(vec![&check.check, &check.value, &check.suggestion]);
        }
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::MemoryProject;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn checks(diagnosis: &Diagnosis) -> Vec<(&str, &str)> {
        diagnosis
            .checks
            .iter()
            .map(|c| (c.check.as_str(), c.value.as_str()))
            .collect()
    }

    #[test]
    fn no_project() {
        let mut diagnosis = Diagnosis::default();
        diagnosis.check_project(None, Platform::Linux);
        assert_eq!(checks(&diagnosis), vec![("project file", "NOT FOUND")]);
    }

    #[test]
    fn project_without_cmake_dictionary() {
        let project = MemoryProject::new("/p/app.sublime-project", serde_json::Map::new());
        let mut diagnosis = Diagnosis::default();
        diagnosis.check_project(Some(&project), Platform::Linux);
        assert_eq!(
            checks(&diagnosis),
            vec![
                ("project file", "/p/app.sublime-project"),
                ("cmake dictionary present in settings", "false"),
            ]
        );
        assert_eq!(
            diagnosis.checks[1].suggestion,
            "Create a cmake dictionary in your settings"
        );
    }

    #[test]
    fn configured_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("build")).unwrap();
        std::fs::write(dir.path().join("build/CMakeCache.txt"), "").unwrap();
        let project = MemoryProject::new(
            dir.path().join("app.sublime-project"),
            json!({ "settings": { "cmake": {
                "build_folder": "$project_path/build",
                "command_line_overrides": { "BUILD_TESTING": true }
            } } })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let mut diagnosis = Diagnosis::default();
        diagnosis.check_project(Some(&project), Platform::Linux);

        let build = format!("{}/build", dir.path().display());
        assert_eq!(
            checks(&diagnosis)[1..].to_vec(),
            vec![
                ("cmake dictionary present in settings", "true"),
                ("build folder", build.as_str()),
                ("overrides", r#"{"BUILD_TESTING":true}"#),
                ("CMakeCache.txt file present", "true"),
            ]
        );
    }

    #[test]
    fn renders_a_table() {
        let mut diagnosis = Diagnosis::default();
        diagnosis.push("cmake binary", "cmake", "");
        let table = diagnosis.render();
        assert!(table.contains("SUGGESTION/FIX"));
        assert!(table.contains("cmake binary"));
    }
}
