use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::warn;

use crate::generator::Generator;
use crate::process::ExecRequest;
use crate::resolve::ResolvedConfig;
use crate::settings::Settings;

/// The cmake configure command line.
pub struct Cmd {
    binary: String,
    path: PathBuf,
    binary_path: PathBuf,
    generator: Option<Generator>,
    silence_dev_warnings: bool,
    defines: Vec<String>,
    args: Vec<String>,
}

impl Cmd {
    pub fn new<T>(binary: T) -> Self
    where
        T: Into<String>, {
        Self {
            binary: binary.into(),
            path: PathBuf::from("."),
            binary_path: PathBuf::from("build"),
            generator: None,
            silence_dev_warnings: false,
            defines: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Everything needed to configure `config` with the given settings.
    pub fn from_config(config: &ResolvedConfig, generator: Generator, settings: &Settings) -> Self {
        Self::new(settings.cmake_binary.as_str())
            .set_path(&config.root_folder)
            .set_binary_path(&config.build_folder)
            .set_generator(generator)
            .silence_dev_warnings(settings.silence_developer_warnings)
            .add_overrides(&config.overrides)
    }

    pub fn add_arg<T>(mut self, arg: T) -> Self
    where
        T: Into<String>, {
        self.args.push(arg.into());
        self
    }

    /// Source directory.
    pub fn set_path<T>(mut self, path: T) -> Self
    where
        T: Into<PathBuf>, {
        self.path = path.into();
        self
    }

    /// Build directory.
    pub fn set_binary_path<T>(mut self, path: T) -> Self
    where
        T: Into<PathBuf>, {
        self.binary_path = path.into();
        self
    }

    pub fn set_generator(mut self, generator: Generator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn silence_dev_warnings(mut self, silence: bool) -> Self {
        self.silence_dev_warnings = silence;
        self
    }

    pub fn add_define<K, V>(mut self, key: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>, {
        self.defines.push(format!("-D{}={}", key.as_ref(), value.as_ref()));
        self
    }

    /// One `-D` per override. Values that have no cache representation are
    /// skipped, the rest of the command is still built.
    pub fn add_overrides(mut self, overrides: &Map<String, Value>) -> Self {
        for (key, value) in overrides {
            match define_value(value) {
                Some(value) => self = self.add_define(key, value),
                None => warn!(key = %key, value = %value, "skipping override that is not a scalar"),
            }
        }
        self
    }

    /// Arguments after the binary name.
    pub fn args(&self) -> Vec<String> {
        // -H and -B are undocumented but supported by every cmake 3.x.
        let mut args = vec![
            format!("-H{}", self.path.display()),
            format!("-B{}", self.binary_path.display()),
        ];
        if self.silence_dev_warnings {
            args.push("-Wno-dev".to_string());
        }
        if let Some(flag) = self.generator.and_then(Generator::cmake_flag) {
            args.push("-G".to_string());
            args.push(flag.to_string());
        }
        args.extend(self.defines.iter().cloned());
        args.extend(self.args.iter().cloned());
        args
    }

    /// The command as it would be typed in a shell.
    pub fn shell_line(&self) -> String {
        let mut line = format!(
            "{} -H\"{}\" -B\"{}\"",
            self.binary,
            self.path.display(),
            self.binary_path.display()
        );
        if self.silence_dev_warnings {
            line.push_str(" -Wno-dev");
        }
        if let Some(flag) = self.generator.and_then(Generator::cmake_flag) {
            line.push_str(&format!(" -G \"{flag}\""));
        }
        for arg in self.defines.iter().chain(&self.args) {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run in the source directory with the given environment.
    pub fn into_request(self, env: BTreeMap<String, String>) -> ExecRequest {
        let args = self.args();
        ExecRequest {
            program: self.binary,
            args,
            working_dir: self.path,
            env,
        }
    }
}

/// Cache value for an override: booleans as `ON`/`OFF`, strings verbatim,
/// numbers in decimal. Anything else has no `-D` form.
pub fn define_value(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("ON".to_string()),
        Value::Bool(false) => Some("OFF".to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn overrides() -> Map<String, Value> {
        json!({
            "CMAKE_BUILD_TYPE": "Debug",
            "BUILD_TESTING": true,
            "USE_LTO": false,
            "JOBS": 8,
            "BROKEN": ["a", "b"],
            "NOTHING": null,
            "CMAKE_EXPORT_COMPILE_COMMANDS": true
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn renders_booleans_and_skips_malformed_overrides() {
        let cmd = Cmd::new("cmake")
            .set_path("/src")
            .set_binary_path("/build")
            .set_generator(Generator::Ninja)
            .add_overrides(&overrides());
        assert_eq!(
            cmd.shell_line(),
            "cmake -H\"/src\" -B\"/build\" -G \"Ninja\" -DCMAKE_BUILD_TYPE=Debug \
             -DBUILD_TESTING=ON -DUSE_LTO=OFF -DJOBS=8 -DCMAKE_EXPORT_COMPILE_COMMANDS=ON"
        );
    }

    #[test]
    fn visual_studio_gets_no_generator_flag() {
        let cmd = Cmd::new("cmake")
            .set_path("C:/src")
            .set_binary_path("C:/build")
            .set_generator(Generator::VisualStudio);
        assert_eq!(cmd.args(), vec!["-HC:/src", "-BC:/build"]);
        assert_eq!(cmd.shell_line(), "cmake -H\"C:/src\" -B\"C:/build\"");
    }

    #[test]
    fn every_other_generator_gets_generator_flag() {
        for generator in [Generator::Ninja, Generator::UnixMakefiles, Generator::NMakeMakefiles] {
            let args = Cmd::new("cmake").set_generator(generator).args();
            let at = args.iter().position(|a| a == "-G").unwrap();
            assert_eq!(args[at + 1], generator.name());
        }
    }

    #[test]
    fn silenced_dev_warnings() {
        let cmd = Cmd::new("cmake")
            .set_path("/src")
            .set_binary_path("/build")
            .silence_dev_warnings(true)
            .set_generator(Generator::UnixMakefiles)
            .add_define("FOO", "bar");
        assert_eq!(
            cmd.args(),
            vec!["-H/src", "-B/build", "-Wno-dev", "-G", "Unix Makefiles", "-DFOO=bar"]
        );
    }

    #[test]
    fn request_runs_in_source_directory() {
        let request = Cmd::new("/opt/cmake/bin/cmake")
            .set_path("/src")
            .set_binary_path("/build")
            .into_request(BTreeMap::from([("CC".to_string(), "clang".to_string())]));
        assert_eq!(request.program, "/opt/cmake/bin/cmake");
        assert_eq!(request.working_dir, PathBuf::from("/src"));
        assert_eq!(request.env["CC"], "clang");
    }
}
