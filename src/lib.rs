//! # cmake-builder
//!
//! Drive CMake from an editor project file.
//!
//! The project file carries a `cmake` dictionary (`build_folder`,
//! `generator`, `root_folder`, `command_line_overrides`). `cmake-builder`
//! fills in defaults, expands `$variables`, builds the `cmake` command
//! line, runs it through a [`ProcessRunner`] supplied by the host, and
//! turns the output into diagnostics the editor can navigate.
//!
//! Everything the host editor normally provides is a trait:
//! [`ProjectStore`] for the project descriptor, [`ProcessRunner`] for
//! running tools and [`Messenger`] for user-facing messages.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cmake_builder::{
//!     ConfigureCommand, ConsoleMessenger, Platform, ProjectFile, Settings, SystemRunner,
//! };
//!
//! let mut project = ProjectFile::open("app.sublime-project")?;
//! let command = ConfigureCommand::new(Settings::default(), Platform::current()?);
//!
//! if let Some(report) = command.configure(&mut project, &SystemRunner, &ConsoleMessenger) {
//!     for diagnostic in &report.diagnostics {
//!         println!("{diagnostic}");
//!     }
//! }
//! # Ok::<(), cmake_builder::Error>(())
//! ```
//!
//! ```
//! use cmake_builder::{Cmd, Generator};
//! use serde_json::json;
//!
//! let overrides = json!({ "BUILD_TESTING": true, "CMAKE_BUILD_TYPE": "Release" });
//! let cmd = Cmd::new("cmake")
//!     .set_path("/src/app")
//!     .set_binary_path("/src/app/build")
//!     .set_generator(Generator::Ninja)
//!     .add_overrides(overrides.as_object().unwrap());
//!
//! assert_eq!(
//!     cmd.shell_line(),
//!     r#"cmake -H"/src/app" -B"/src/app/build" -G "Ninja" -DBUILD_TESTING=ON -DCMAKE_BUILD_TYPE=Release"#
//! );
//! ```

pub mod cache;
pub mod capabilities;
pub mod cmd;
pub mod configure;
pub mod diagnose;
pub mod diagnostics;
pub mod error;
pub mod expand;
pub mod file_api;
pub mod generator;
pub mod platform;
pub mod process;
pub mod project;
pub mod resolve;
pub mod settings;
pub mod targets;
pub mod ui;
pub mod vcvars;

pub use cmd::Cmd;
pub use configure::{ConfigureCommand, ConfigureReport, FollowUp};
pub use diagnostics::{Diagnostic, OutputParser};
pub use error::{Error, Result};
pub use generator::Generator;
pub use platform::Platform;
pub use process::{ExecOutcome, ExecRequest, ProcessRunner, SystemRunner};
pub use project::{MemoryProject, ProjectFile, ProjectStore};
pub use resolve::{BuildLocation, ConfigResolver, ResolvedConfig};
pub use settings::Settings;
pub use ui::{ConsoleMessenger, Messenger};
