//! cmake-builder CLI: the editor commands, run from a terminal.

use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cmake_builder::cache;
use cmake_builder::capabilities::Capabilities;
use cmake_builder::diagnose::Diagnosis;
use cmake_builder::targets::BuildTree;
use cmake_builder::{
    ConfigResolver, ConfigureCommand, ConsoleMessenger, ExecOutcome, ExecRequest, Messenger,
    OutputParser, Platform, ProcessRunner, ProjectFile, ProjectStore, Settings,
    SystemRunner,
};

/// Configure, build and diagnose CMake projects described by a project file.
#[derive(Parser)]
#[command(name = "cmake-builder", version, about, long_about = None)]
struct Cli {
    /// Project file with a "cmake" dictionary. Defaults to the only
    /// *.sublime-project file in the current directory.
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Settings file.
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cmake for the project.
    Configure {
        /// Pass -Wno-dev to cmake.
        #[arg(long)]
        silence_dev_warnings: bool,

        /// Write build systems for every target into the project file.
        #[arg(long)]
        write_build_targets: bool,
    },

    /// Build a configured project.
    Build {
        #[arg(short, long, default_value = "Debug")]
        config: String,

        #[arg(short, long)]
        target: Option<String>,
    },

    /// Run ctest in the build folder.
    Test {
        #[arg(short, long, default_value = "Debug")]
        config: String,
    },

    /// Build a target and run its executable.
    Run {
        target: String,

        /// Path of the executable relative to the build folder.
        artifact: String,

        #[arg(short, long, default_value = "Debug")]
        config: String,

        /// Run under gdb (Linux) or lldb.
        #[arg(long)]
        debug: bool,
    },

    /// Remove CMakeCache.txt and the CMakeFiles directory.
    ClearCache {
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Check the cmake installation and the project setup.
    Diagnose,

    /// Print the diagnostics found in cmake or build output.
    ParseOutput {
        /// Output to parse; stdin when omitted.
        file: Option<PathBuf>,

        /// Parse build output of this generator instead of configure output.
        #[arg(short, long)]
        generator: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let platform = Platform::current()?;

    let project = match (&cli.command, &cli.project) {
        (Commands::ParseOutput { .. }, _) => None,
        (_, Some(path)) => Some(ProjectFile::open(path)?),
        (_, None) => find_project(Path::new("."))?.map(ProjectFile::open).transpose()?,
    };
    let mut settings = Settings::discover(cli.settings.as_deref())?;
    if let Some(data) = project.as_ref().and_then(|p| p.project_data()) {
        settings = settings.with_project_overrides(&data)?;
    }

    let filter = match (cli.verbose, settings.cmake_debug) {
        (0, false) => "info",
        (0, true) | (1, _) => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let code = match cli.command {
        Commands::Configure {
            silence_dev_warnings,
            write_build_targets,
        } => {
            settings.silence_developer_warnings |= silence_dev_warnings;
            settings.write_build_targets_after_successful_configure |= write_build_targets;
            cmd_configure(require(project)?, settings, platform)?
        }
        Commands::Build { config, target } => {
            let tree = build_tree(&require(project)?, config, platform)?;
            let parser = OutputParser::build(tree.generator, platform)?;
            execute(tree.build(&settings, target.as_deref()), Some(&parser))?
        }
        Commands::Test { config } => {
            let tree = build_tree(&require(project)?, config, platform)?;
            execute(tree.ctest(&settings), None)?
        }
        Commands::Run {
            target,
            artifact,
            config,
            debug,
        } => {
            let tree = build_tree(&require(project)?, config, platform)?;
            execute(tree.run(&settings, &target, &artifact, debug), None)?
        }
        Commands::ClearCache { yes } => cmd_clear_cache(&require(project)?, platform, yes)?,
        Commands::Diagnose => {
            let diagnosis = Diagnosis::run(
                &settings,
                project.as_ref().map(|p| p as &dyn ProjectStore),
                platform,
            );
            println!("{}", diagnosis.render());
            0
        }
        Commands::ParseOutput { file, generator } => cmd_parse_output(file, generator, platform)?,
    };

    std::process::exit(code)
}

fn require(project: Option<ProjectFile>) -> Result<ProjectFile> {
    project.ok_or_else(|| anyhow!("no project file given and none found in the current directory"))
}

fn find_project(dir: &Path) -> Result<Option<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "sublime-project") {
            found.push(path);
        }
    }
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        _ => bail!("more than one project file in {}, pick one with --project", dir.display()),
    }
}

fn cmd_configure(mut project: ProjectFile, settings: Settings, platform: Platform) -> Result<i32> {
    if settings.write_build_targets_after_successful_configure {
        Capabilities::query(&settings.cmake_binary)?.require_file_api()?;
    }
    let command = ConfigureCommand::new(settings, platform);
    let Some(report) = command.configure(&mut project, &SystemRunner, &ConsoleMessenger) else {
        return Ok(1);
    };
    info!(command = %report.command_line, "configured");
    print!("{}", report.outcome.output);
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    if let Some(build_systems) = &report.build_systems {
        ConsoleMessenger.status_message(&format!(
            "Wrote {} build system(s) to the project file",
            build_systems.len()
        ));
    }
    Ok(report.outcome.exit_code.unwrap_or(1))
}

fn build_tree(project: &ProjectFile, config: String, platform: Platform) -> Result<BuildTree> {
    let location = ConfigResolver::new(platform)
        .locate(project)?
        .ok_or_else(|| anyhow!("the project has no build_folder yet, run configure first"))?;
    Ok(BuildTree {
        working_dir: location.build_folder,
        generator: location.generator.parse()?,
        config,
        platform,
    })
}

fn execute(request: ExecRequest, parser: Option<&OutputParser>) -> Result<i32> {
    debug!(program = %request.program, args = ?request.args, "executing");
    let outcome: ExecOutcome = SystemRunner
        .spawn(request)
        .recv()
        .context("process runner exited without a result")??;
    print!("{}", outcome.output);
    if let Some(parser) = parser {
        for diagnostic in parser.parse(&outcome.output) {
            println!("{diagnostic}");
        }
    }
    Ok(outcome.exit_code.unwrap_or(1))
}

fn cmd_clear_cache(project: &ProjectFile, platform: Platform, yes: bool) -> Result<i32> {
    let Some(files) = cache::pending(project, platform)? else {
        ConsoleMessenger.status_message("Nothing to clear: no CMakeCache.txt in the build folder");
        return Ok(0);
    };

    if !yes {
        println!("Files to remove:");
        for path in files.iter() {
            println!("{}", path.display());
        }
        print!("Do it? [y/N] ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            return Ok(0);
        }
    }

    let failures = files.remove();
    for failure in &failures {
        ConsoleMessenger.error_message(&failure.to_string());
    }
    if failures.is_empty() {
        ConsoleMessenger.status_message("Cleared CMake cache files!");
        Ok(0)
    } else {
        Ok(1)
    }
}

fn cmd_parse_output(
    file: Option<PathBuf>,
    generator: Option<String>,
    platform: Platform,
) -> Result<i32> {
    let output = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let parser = match generator {
        Some(name) => OutputParser::build(name.parse()?, platform)?,
        None => OutputParser::configure(),
    };
    let diagnostics = parser.parse(&output);
    for diagnostic in &diagnostics {
        println!("{diagnostic}");
    }
    Ok(if diagnostics.is_empty() { 0 } else { 1 })
}
