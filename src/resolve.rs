//! Filling defaults into the cmake dictionary and expanding it.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::expand::expand_map;
use crate::platform::Platform;
use crate::project::{
    ProjectStore, SectionLocation, cmake_section, cmake_str, cmake_value, set_cmake_section,
};

/// The cmake dictionary after defaults and placeholder expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// The whole expanded dictionary.
    pub cmake: Map<String, Value>,
    /// `build_folder` as written in the project, placeholders intact.
    pub unexpanded_build_folder: String,
    pub build_folder: PathBuf,
    pub root_folder: PathBuf,
    pub generator: String,
    pub overrides: Map<String, Value>,
}

/// Build folder and generator of a project that was configured before.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildLocation {
    pub build_folder: PathBuf,
    pub generator: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver {
    platform: Platform,
}

impl ConfigResolver {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Return the raw cmake dictionary, giving it a temporary `build_folder`
    /// first if it has none. The new folder is written back to the project
    /// so later invocations reuse it.
    pub fn ensure_build_folder(
        &self,
        project: &mut dyn ProjectStore,
    ) -> Result<(SectionLocation, Map<String, Value>)> {
        let mut data = project.project_data().ok_or(Error::NoProject)?;
        let (location, mut cmake) = match cmake_section(&data) {
            Some((location, cmake)) => (location, cmake.clone()),
            None => (SectionLocation::Settings, Map::new()),
        };
        if cmake_str(&cmake, "build_folder", self.platform)?.is_some() {
            return Ok((location, cmake));
        }

        let tempdir = tempfile::Builder::new()
            .prefix("cmake-build-")
            .tempdir()?
            .keep();
        info!("Temporary directory shall be \"{}\"", tempdir.display());
        cmake.insert(
            "build_folder".to_string(),
            Value::String(tempdir.to_string_lossy().into_owned()),
        );
        set_cmake_section(&mut data, location, cmake.clone());
        project.set_project_data(data)?;
        Ok((location, cmake))
    }

    pub fn resolve(&self, project: &mut dyn ProjectStore) -> Result<ResolvedConfig> {
        let project_dir = project_dir(project)?;
        let variables = project.extract_variables(self.platform);

        // Fail before a temporary build folder gets persisted.
        let data = project.project_data().ok_or(Error::NoProject)?;
        let current = cmake_section(&data)
            .map(|(_, cmake)| cmake.clone())
            .unwrap_or_default();
        let root_folder = self.root_folder(&expand_map(&current, &variables)?, &project_dir)?;

        let (_, raw) = self.ensure_build_folder(project)?;
        let unexpanded_build_folder = cmake_str(&raw, "build_folder", self.platform)?
            .unwrap_or_default()
            .to_string();
        let cmake = expand_map(&raw, &variables)?;

        let build_folder = cmake_str(&cmake, "build_folder", self.platform)?
            .map(|folder| project_dir.join(folder))
            .ok_or_else(|| Error::InvalidValue {
                key: "build_folder",
                reason: "is empty after expansion".to_string(),
            })?;
        let generator = self.generator(&cmake)?;
        let overrides = match cmake_value(&cmake, "command_line_overrides", self.platform) {
            Some(Value::Object(overrides)) => overrides.clone(),
            Some(other) => {
                warn!(value = %other, "command_line_overrides is not a dictionary, ignoring it");
                Map::new()
            }
            None => Map::new(),
        };

        fs::create_dir_all(&build_folder).map_err(|source| Error::CreateBuildFolder {
            path: build_folder.clone(),
            source,
        })?;
        let build_folder = realpath(&build_folder);

        Ok(ResolvedConfig {
            cmake,
            unexpanded_build_folder,
            build_folder,
            root_folder,
            generator,
            overrides,
        })
    }

    /// Where an already configured project builds. Only reads and expands
    /// the dictionary: nothing is written to the project or the disk.
    /// `None` while no `build_folder` is set.
    pub fn locate(&self, project: &dyn ProjectStore) -> Result<Option<BuildLocation>> {
        let project_dir = project_dir(project)?;
        let data = project.project_data().ok_or(Error::NoProject)?;
        let Some((_, raw)) = cmake_section(&data) else {
            return Ok(None);
        };
        let cmake = expand_map(raw, &project.extract_variables(self.platform))?;
        let Some(build_folder) = cmake_str(&cmake, "build_folder", self.platform)? else {
            return Ok(None);
        };
        Ok(Some(BuildLocation {
            build_folder: realpath(&project_dir.join(build_folder)),
            generator: self.generator(&cmake)?,
        }))
    }

    fn generator(&self, cmake: &Map<String, Value>) -> Result<String> {
        Ok(cmake_str(cmake, "generator", self.platform)?
            .unwrap_or(self.platform.default_generator())
            .to_string())
    }

    fn root_folder(&self, cmake: &Map<String, Value>, project_dir: &Path) -> Result<PathBuf> {
        match cmake_str(cmake, "root_folder", self.platform)? {
            Some(root) => Ok(realpath(&project_dir.join(root))),
            None if project_dir.join("CMakeLists.txt").is_file() => Ok(realpath(project_dir)),
            None => Err(Error::MissingRootFolder),
        }
    }
}

fn project_dir(project: &dyn ProjectStore) -> Result<PathBuf> {
    let file = project.project_file_name().ok_or(Error::NoProject)?;
    Ok(file.parent().unwrap_or(Path::new(".")).to_path_buf())
}

fn realpath(path: &Path) -> PathBuf {
    // canonicalize on Windows yields \\?\ paths that cmake rejects.
    if cfg!(windows) {
        return path.to_path_buf();
    }
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
