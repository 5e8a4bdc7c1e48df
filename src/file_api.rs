//! The cmake file API: ask for a codemodel before configuring, turn the
//! reply into editor build systems afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::platform::Platform;
use crate::project::ProjectStore;

pub const CLIENT: &str = "client-cmake-builder";

pub fn api_dir(build_folder: &Path) -> PathBuf {
    build_folder.join(".cmake").join("api").join("v1")
}

pub fn query_dir(build_folder: &Path) -> PathBuf {
    api_dir(build_folder).join("query").join(CLIENT)
}

pub fn reply_dir(build_folder: &Path) -> PathBuf {
    api_dir(build_folder).join("reply")
}

/// Request a codemodel v2 on the next configure.
pub fn write_query(build_folder: &Path) -> Result<()> {
    let dir = query_dir(build_folder);
    fs::create_dir_all(&dir)?;
    let query = json!({ "requests": [{ "kind": "codemodel", "version": 2 }] });
    fs::write(dir.join("query.json"), serde_json::to_string(&query)?)?;
    debug!(path = %dir.display(), "wrote file API query");
    Ok(())
}

/// The newest `index-*.json` in the reply directory.
pub fn latest_index(build_folder: &Path) -> Result<PathBuf> {
    let dir = reply_dir(build_folder);
    let entries = fs::read_dir(&dir).map_err(|source| Error::Read {
        path: dir.clone(),
        source,
    })?;
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("index-") && name.ends_with(".json"))
        })
        .max()
        .ok_or_else(|| Error::FileApi(format!("no index file in {}", dir.display())))
}

#[derive(Debug, Deserialize)]
struct ResponseRef {
    kind: String,
    #[serde(rename = "jsonFile")]
    json_file: String,
}

#[derive(Debug, Deserialize)]
struct Codemodel {
    configurations: Vec<Configuration>,
}

#[derive(Debug, Deserialize)]
struct Configuration {
    name: String,
    targets: Vec<TargetRef>,
}

#[derive(Debug, Deserialize)]
struct TargetRef {
    #[serde(rename = "jsonFile")]
    json_file: String,
}

#[derive(Debug, Deserialize)]
struct Target {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    path: String,
}

/// A build system entry as stored in the project's `build_systems`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSystem {
    pub name: String,
    pub config: String,
    pub target: String,
    pub working_dir: String,
    pub generator: String,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl Variant {
    fn build(name: &str) -> Self {
        Self {
            name: name.to_string(),
            build_target: Some(name.to_string()),
            target: None,
            artifact: None,
            debug: None,
        }
    }

    fn run(label: String, target: &str, artifact: &str, debug: bool) -> Self {
        Self {
            name: label,
            build_target: Some(target.to_string()),
            target: Some("cmake_run".to_string()),
            artifact: Some(artifact.to_string()),
            debug: Some(debug),
        }
    }
}

/// Reads a reply and turns it into build systems.
pub struct ReplyReader<'a> {
    build_folder: &'a Path,
    unexpanded_build_folder: &'a str,
    generator: Generator,
    platform: Platform,
}

impl<'a> ReplyReader<'a> {
    pub fn new(
        build_folder: &'a Path,
        unexpanded_build_folder: &'a str,
        generator: Generator,
        platform: Platform,
    ) -> Self {
        Self {
            build_folder,
            unexpanded_build_folder,
            generator,
            platform,
        }
    }

    fn load<T: serde::de::DeserializeOwned>(&self, json_file: &str) -> Result<T> {
        let path = reply_dir(self.build_folder).join(json_file);
        let content = fs::read_to_string(&path).map_err(|source| Error::Read {
            path: path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn build_systems(&self) -> Result<Vec<BuildSystem>> {
        let index_path = latest_index(self.build_folder)?;
        let index: Value = serde_json::from_str(&fs::read_to_string(&index_path)?)?;
        let responses = index
            .pointer(&format!("/reply/{CLIENT}/query.json/responses"))
            .cloned()
            .ok_or_else(|| Error::FileApi(format!("no responses for {CLIENT}")))?;
        let responses: Vec<ResponseRef> = serde_json::from_value(responses)?;

        let mut build_systems = Vec::new();
        for response in responses {
            match response.kind.as_str() {
                // One unreadable response does not spoil the others.
                "codemodel" => match self
                    .load::<Codemodel>(&response.json_file)
                    .and_then(|codemodel| self.codemodel(codemodel))
                {
                    Ok(systems) => build_systems.extend(systems),
                    Err(e) => warn!(file = %response.json_file, "skipping response: {e}"),
                },
                other => debug!(kind = other, "no response handler installed"),
            }
        }
        Ok(build_systems)
    }

    fn codemodel(&self, codemodel: Codemodel) -> Result<Vec<BuildSystem>> {
        codemodel
            .configurations
            .into_iter()
            .map(|configuration| {
                // Single-configuration generators without CMAKE_BUILD_TYPE
                // report an empty name.
                let name = if configuration.name.is_empty() {
                    "Default".to_string()
                } else {
                    configuration.name
                };
                let mut variants = Vec::new();
                for target in &configuration.targets {
                    let target: Target = self.load(&target.json_file)?;
                    self.target_variants(&mut variants, &target);
                }
                variants.push(Variant {
                    name: "ctest".to_string(),
                    build_target: None,
                    target: Some("ctest_run".to_string()),
                    artifact: None,
                    debug: None,
                });
                Ok::<_, Error>(BuildSystem {
                    config: name.clone(),
                    name,
                    target: "cmake_build".to_string(),
                    working_dir: self.unexpanded_build_folder.to_string(),
                    generator: self.generator.name().to_string(),
                    variants,
                })
            })
            .collect()
    }

    fn target_variants(&self, variants: &mut Vec<Variant>, target: &Target) {
        variants.push(Variant::build(&target.name));
        if target.kind != "EXECUTABLE" {
            return;
        }
        let Some(artifact) = target.artifacts.first() else {
            warn!(target = %target.name, "executable target without artifacts");
            return;
        };
        let name = &target.name;
        variants.push(Variant::run(format!("Run: {name}"), name, &artifact.path, false));
        match self.platform {
            Platform::Linux => variants.push(Variant::run(
                format!("Run under GDB: {name}"),
                name,
                &artifact.path,
                true,
            )),
            Platform::Osx => variants.push(Variant::run(
                format!("Run under LLDB: {name}"),
                name,
                &artifact.path,
                true,
            )),
            Platform::Windows => {}
        }
    }
}

/// Replace the project's `build_systems`.
pub fn write_build_systems(
    project: &mut dyn ProjectStore,
    build_systems: &[BuildSystem],
) -> Result<()> {
    let mut data = project.project_data().ok_or(Error::NoProject)?;
    data.insert("build_systems".to_string(), serde_json::to_value(build_systems)?);
    project.set_project_data(data)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Lay out a reply the way cmake does for a project with one library
    /// and one executable.
    pub fn fake_reply(build_folder: &Path, configuration: &str) {
        let reply = reply_dir(build_folder);
        fs::create_dir_all(&reply).unwrap();
        let write = |name: &str, value: Value| {
            fs::write(reply.join(name), serde_json::to_string(&value).unwrap()).unwrap();
        };
        write(
            "index-2024-01-01T00-00-00-0000.json",
            json!({ "reply": { CLIENT: { "query.json": { "responses": [] } } } }),
        );
        write(
            "index-2024-06-01T00-00-00-0000.json",
            json!({ "reply": { CLIENT: { "query.json": { "responses": [
                { "kind": "codemodel", "jsonFile": "codemodel-v2-abc.json" },
                { "kind": "cache", "jsonFile": "cache-v2-abc.json" }
            ] } } } }),
        );
        write(
            "codemodel-v2-abc.json",
            json!({ "configurations": [{
                "name": configuration,
                "targets": [
                    { "name": "core", "jsonFile": "target-core.json" },
                    { "name": "app", "jsonFile": "target-app.json" }
                ]
            }] }),
        );
        write(
            "target-core.json",
            json!({ "name": "core", "type": "STATIC_LIBRARY", "artifacts": [{ "path": "libcore.a" }] }),
        );
        write(
            "target-app.json",
            json!({ "name": "app", "type": "EXECUTABLE", "artifacts": [{ "path": "app" }] }),
        );
    }
}
