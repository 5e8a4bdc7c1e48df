//! What the installed cmake supports, from `cmake -E capabilities`.

use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Capabilities {
    pub version: Version,
    #[serde(rename = "fileApi", default)]
    pub file_api: Option<Value>,
    #[serde(default)]
    pub generators: Vec<GeneratorInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    pub string: String,
    pub major: u32,
    pub minor: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorInfo {
    pub name: String,
    #[serde(rename = "platformSupport", default)]
    pub platform_support: bool,
}

impl Capabilities {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn query(cmake_binary: &str) -> Result<Self> {
        let stdout = check_output(cmake_binary, &["-E", "capabilities"])
            .map_err(|e| Error::Capabilities(e.to_string()))?;
        Self::parse(&stdout)
    }

    pub fn has_file_api(&self) -> bool {
        self.file_api.is_some()
    }

    /// Fail unless the file API (cmake 3.15+) is available.
    pub fn require_file_api(&self) -> Result<()> {
        if self.has_file_api() {
            Ok(())
        } else {
            Err(Error::NoFileApi(self.version.string.clone()))
        }
    }
}

/// `cmake --version` without the `cmake version ` prefix.
pub fn version(cmake_binary: &str) -> Result<String> {
    let stdout = check_output(cmake_binary, &["--version"])?;
    let first = stdout.lines().next().unwrap_or_default();
    Ok(first.strip_prefix("cmake version ").unwrap_or(first).trim().to_string())
}

pub fn locate(binary: &str) -> Result<PathBuf> {
    which::which(binary).map_err(|_| Error::ToolNotFound(binary.to_string()))
}

/// Run to completion and return stdout. Anything on stderr is a failure.
fn check_output(binary: &str, args: &[&str]) -> Result<String> {
    let program = locate(binary)?;
    debug!(program = %program.display(), ?args, "running");
    let output = Command::new(&program).args(args).output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return Err(Error::Capabilities(stderr.trim().to_string()));
    }
    if !output.status.success() {
        return Err(Error::Capabilities(format!(
            "{} exited with {}",
            program.display(),
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPABILITIES: &str = r#"{
        "fileApi": { "requests": [{ "kind": "codemodel", "version": [{ "major": 2, "minor": 6 }] }] },
        "generators": [
            { "extraGenerators": [], "name": "Ninja", "platformSupport": false, "toolsetSupport": false },
            { "extraGenerators": [], "name": "Unix Makefiles", "platformSupport": false, "toolsetSupport": false }
        ],
        "serverMode": false,
        "tls": true,
        "version": { "isDirty": false, "major": 3, "minor": 28, "patch": 3, "string": "3.28.3", "suffix": "" }
    }"#;

    #[test]
    fn parses_capabilities() {
        let caps = Capabilities::parse(CAPABILITIES).unwrap();
        assert_eq!(caps.version.string, "3.28.3");
        assert_eq!((caps.version.major, caps.version.minor), (3, 28));
        assert!(caps.has_file_api());
        assert!(caps.require_file_api().is_ok());
        assert_eq!(caps.generators[0].name, "Ninja");
    }

    #[test]
    fn old_cmake_has_no_file_api() {
        let caps = Capabilities::parse(
            r#"{ "version": { "major": 3, "minor": 12, "patch": 0, "string": "3.12.0" }, "generators": [] }"#,
        )
        .unwrap();
        let err = caps.require_file_api().unwrap_err();
        assert!(matches!(err, Error::NoFileApi(version) if version == "3.12.0"));
    }

    #[test]
    fn missing_binary() {
        let err = Capabilities::query("no-such-cmake-binary").unwrap_err();
        assert!(matches!(err, Error::Capabilities(_)));
    }

    #[cfg(unix)]
    #[test]
    fn output_on_stderr_is_a_failure() {
        let err = check_output("sh", &["-c", "echo oops >&2; echo '{}'"]).unwrap_err();
        assert!(matches!(err, Error::Capabilities(message) if message == "oops"));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_a_failure() {
        let err = check_output("sh", &["-c", "echo '{}'; exit 3"]).unwrap_err();
        assert!(matches!(err, Error::Capabilities(message) if message.contains("exited with")));
    }

    #[cfg(unix)]
    #[test]
    fn clean_run_returns_stdout() {
        let stdout = check_output("sh", &["-c", "echo 'cmake version 3.28.3'"]).unwrap();
        assert_eq!(stdout, "cmake version 3.28.3\n");
    }
}
