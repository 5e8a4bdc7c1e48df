//! Commands that act on an already configured build folder: building a
//! target, running ctest, running an executable.

use std::path::PathBuf;

use crate::generator::Generator;
use crate::platform::Platform;
use crate::process::ExecRequest;
use crate::settings::Settings;

/// Where and how to drive an existing build tree.
#[derive(Debug, Clone)]
pub struct BuildTree {
    pub working_dir: PathBuf,
    pub generator: Generator,
    pub config: String,
    pub platform: Platform,
}

impl BuildTree {
    /// `cmake --build . --config <config> [--target <target>]`
    pub fn build(&self, settings: &Settings, target: Option<&str>) -> ExecRequest {
        ExecRequest {
            program: settings.cmake_binary.clone(),
            args: self.build_args(target),
            working_dir: self.working_dir.clone(),
            env: self.generator.env(self.platform),
        }
    }

    /// `ctest -C <config> <ctest_command_line_args...>`
    pub fn ctest(&self, settings: &Settings) -> ExecRequest {
        let mut args = vec!["-C".to_string(), self.config.clone()];
        args.extend(settings.ctest_command_line_args.iter().cloned());
        ExecRequest {
            program: settings.ctest_binary.clone(),
            args,
            working_dir: self.working_dir.clone(),
            env: self.generator.env(self.platform),
        }
    }

    /// Build `target` and then run `artifact` through the user's shell,
    /// optionally under a debugger.
    pub fn run(
        &self,
        settings: &Settings,
        target: &str,
        artifact: &str,
        debug: bool,
    ) -> ExecRequest {
        let mut line = vec![settings.cmake_binary.clone()];
        line.extend(self.build_args(Some(target)));
        line.push("&&".to_string());
        if debug {
            let debugger: &[&str] = match self.platform {
                Platform::Linux => &["gdb", "-q", "--args"],
                _ => &["lldb", "--"],
            };
            line.extend(debugger.iter().map(|s| s.to_string()));
        }
        line.push(match self.platform {
            Platform::Windows => artifact.to_string(),
            _ => format!("./{artifact}"),
        });

        let (shell, flag) = match self.platform {
            Platform::Windows => ("cmd.exe".to_string(), "/C"),
            _ => (
                std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string()),
                "-c",
            ),
        };
        ExecRequest {
            program: shell,
            args: vec![flag.to_string(), line.join(" ")],
            working_dir: self.working_dir.clone(),
            env: self.generator.env(self.platform),
        }
    }

    fn build_args(&self, target: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "--build".to_string(),
            ".".to_string(),
            "--config".to_string(),
            self.config.clone(),
        ];
        if let Some(target) = target {
            args.push("--target".to_string());
            args.push(target.to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree(platform: Platform) -> BuildTree {
        BuildTree {
            working_dir: PathBuf::from("/src/build"),
            generator: Generator::Ninja,
            config: "Debug".to_string(),
            platform,
        }
    }

    #[test]
    fn build_target() {
        let request = tree(Platform::Linux).build(&Settings::default(), Some("app"));
        assert_eq!(request.program, "cmake");
        assert_eq!(
            request.args,
            vec!["--build", ".", "--config", "Debug", "--target", "app"]
        );
        assert_eq!(request.working_dir, PathBuf::from("/src/build"));
    }

    #[test]
    fn build_all() {
        let request = tree(Platform::Linux).build(&Settings::default(), None);
        assert_eq!(request.args, vec!["--build", ".", "--config", "Debug"]);
    }

    #[test]
    fn ctest_with_extra_args() {
        let settings = Settings {
            ctest_command_line_args: vec!["--output-on-failure".to_string()],
            ..Settings::default()
        };
        let request = tree(Platform::Linux).ctest(&settings);
        assert_eq!(request.program, "ctest");
        assert_eq!(request.args, vec!["-C", "Debug", "--output-on-failure"]);
    }

    #[test]
    fn run_under_gdb() {
        let request = tree(Platform::Linux).run(&Settings::default(), "app", "bin/app", true);
        assert_eq!(request.args[0], "-c");
        assert_eq!(
            request.args[1],
            "cmake --build . --config Debug --target app && gdb -q --args ./bin/app"
        );
    }

    #[test]
    fn run_on_windows() {
        let request = tree(Platform::Windows).run(&Settings::default(), "app", "Debug\\app.exe", false);
        assert_eq!(request.program, "cmd.exe");
        assert_eq!(
            request.args,
            vec!["/C", "cmake --build . --config Debug --target app && Debug\\app.exe"]
        );
    }
}
