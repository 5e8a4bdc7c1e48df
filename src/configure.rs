//! One configure invocation, from reading the project to reacting to
//! cmake's exit code.

use std::sync::mpsc::Receiver;

use tracing::{info, warn};

use crate::cache;
use crate::cmd::Cmd;
use crate::diagnostics::{Diagnostic, OutputParser};
use crate::error::{Error, Result};
use crate::file_api::{self, BuildSystem, ReplyReader};
use crate::generator::Generator;
use crate::platform::Platform;
use crate::process::{ExecOutcome, ExecRequest, ExecResult, ProcessRunner};
use crate::project::ProjectStore;
use crate::resolve::{ConfigResolver, ResolvedConfig};
use crate::settings::Settings;
use crate::ui::Messenger;

/// Everything decided before cmake is started.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub config: ResolvedConfig,
    pub generator: Generator,
    pub command_line: String,
    pub request: ExecRequest,
}

/// A configure whose process has been handed to the runner.
pub struct RunningConfigure {
    pub invocation: Invocation,
    receiver: Receiver<ExecResult>,
}

impl RunningConfigure {
    /// Block until the runner reports completion.
    pub fn wait(self) -> (Invocation, ExecResult) {
        let result = self.receiver.recv().unwrap_or_else(|_| {
            Err(Error::Io(std::io::Error::other(
                "process runner exited without a result",
            )))
        });
        (self.invocation, result)
    }
}

/// Action to trigger after a successful configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    WriteBuildTargets,
}

#[derive(Debug, Clone)]
pub struct ConfigureReport {
    pub command_line: String,
    pub outcome: ExecOutcome,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when build targets were written to the project.
    pub build_systems: Option<Vec<BuildSystem>>,
}

pub struct ConfigureCommand {
    settings: Settings,
    platform: Platform,
}

impl ConfigureCommand {
    pub fn new(settings: Settings, platform: Platform) -> Self {
        Self { settings, platform }
    }

    pub fn description() -> &'static str {
        "Configure"
    }

    pub fn is_enabled(project: &dyn ProjectStore) -> bool {
        project.project_data().is_some() && project.project_file_name().is_some()
    }

    /// Resolve the project and build the command without running anything.
    pub fn prepare(&self, project: &mut dyn ProjectStore) -> Result<Invocation> {
        let config = ConfigResolver::new(self.platform).resolve(project)?;
        let generator: Generator = config.generator.parse()?;
        file_api::write_query(&config.build_folder)?;

        let cmd = Cmd::from_config(&config, generator, &self.settings);
        let command_line = cmd.shell_line();
        let request = cmd.into_request(generator.env(self.platform));
        Ok(Invocation {
            config,
            generator,
            command_line,
            request,
        })
    }

    /// Start cmake. Errors are shown to the user and abort the invocation.
    pub fn run(
        &self,
        project: &mut dyn ProjectStore,
        runner: &dyn ProcessRunner,
        messenger: &dyn Messenger,
    ) -> Option<RunningConfigure> {
        if self.settings.always_clear_cache_before_configure {
            match cache::pending(project, self.platform) {
                Ok(Some(files)) => {
                    for failure in files.remove() {
                        messenger.error_message(&failure.to_string());
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("could not clear the cache before configuring: {e}"),
            }
        }

        let invocation = match self.prepare(project) {
            Ok(invocation) => invocation,
            Err(e) => {
                messenger.error_message(&e.to_string());
                return None;
            }
        };

        invocation.generator.on_pre_configure(&invocation.config.overrides);
        info!(command = %invocation.command_line, "configuring");
        let receiver = runner.spawn(invocation.request.clone());
        Some(RunningConfigure {
            invocation,
            receiver,
        })
    }

    /// React to the process result. A nonzero exit is reported as is.
    pub fn on_finished(
        &self,
        invocation: &Invocation,
        result: &ExecResult,
        messenger: &dyn Messenger,
    ) -> Option<FollowUp> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                messenger.error_message(&e.to_string());
                return None;
            }
        };
        invocation.generator.on_post_configure(outcome.exit_code);
        match outcome.exit_code {
            Some(0) => self
                .settings
                .write_build_targets_after_successful_configure
                .then_some(FollowUp::WriteBuildTargets),
            Some(code) => {
                messenger.status_message(&format!("cmake exited with code {code}"));
                None
            }
            None => {
                messenger.status_message("cmake was terminated by a signal");
                None
            }
        }
    }

    pub fn follow_up(
        &self,
        action: FollowUp,
        invocation: &Invocation,
        project: &mut dyn ProjectStore,
        messenger: &dyn Messenger,
    ) -> Option<Vec<BuildSystem>> {
        match action {
            FollowUp::WriteBuildTargets => match self.write_build_targets(invocation, project) {
                Ok(build_systems) => Some(build_systems),
                Err(e) => {
                    messenger.error_message(&format!("Error while configuring project: {e}"));
                    None
                }
            },
        }
    }

    fn write_build_targets(
        &self,
        invocation: &Invocation,
        project: &mut dyn ProjectStore,
    ) -> Result<Vec<BuildSystem>> {
        let reader = ReplyReader::new(
            &invocation.config.build_folder,
            &invocation.config.unexpanded_build_folder,
            invocation.generator,
            self.platform,
        );
        let build_systems = reader.build_systems()?;
        file_api::write_build_systems(project, &build_systems)?;
        info!(count = build_systems.len(), "wrote build systems");
        Ok(build_systems)
    }

    /// Run, wait, and handle the result in one go.
    pub fn configure(
        &self,
        project: &mut dyn ProjectStore,
        runner: &dyn ProcessRunner,
        messenger: &dyn Messenger,
    ) -> Option<ConfigureReport> {
        let (invocation, result) = self.run(project, runner, messenger)?.wait();
        let follow_up = self.on_finished(&invocation, &result, messenger);
        let outcome = result.ok()?;
        let build_systems =
            follow_up.and_then(|action| self.follow_up(action, &invocation, project, messenger));
        Some(ConfigureReport {
            diagnostics: OutputParser::configure().parse(&outcome.output),
            command_line: invocation.command_line,
            outcome,
            build_systems,
        })
    }
}
