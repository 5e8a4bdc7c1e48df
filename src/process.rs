//! Running external tools on behalf of the host.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::{debug, info};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Added on top of the inherited environment.
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Standard output followed by standard error.
    pub output: String,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

pub type ExecResult = Result<ExecOutcome>;

/// Runs a request in the background. The receiver yields exactly one
/// result once the process has finished.
pub trait ProcessRunner {
    fn spawn(&self, request: ExecRequest) -> Receiver<ExecResult>;
}

/// Runs requests as child processes on a worker thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn spawn(&self, request: ExecRequest) -> Receiver<ExecResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _ = tx.send(execute(&request));
        });

        rx
    }
}

/// Run `request` to completion on the current thread.
pub fn execute(request: &ExecRequest) -> ExecResult {
    let program =
        which::which(&request.program).map_err(|_| Error::ToolNotFound(request.program.clone()))?;

    info!(
        program = %program.display(),
        args = ?request.args,
        cwd = %request.working_dir.display(),
        "running"
    );
    let output = Command::new(&program)
        .args(&request.args)
        .current_dir(&request.working_dir)
        .envs(&request.env)
        .output()?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let exit_code = output.status.code();
    debug!(program = %program.display(), ?exit_code, "finished");

    Ok(ExecOutcome {
        exit_code,
        output: text,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_reported() {
        let rx = SystemRunner.spawn(ExecRequest {
            program: "definitely-not-a-real-cmake-binary".to_string(),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            env: BTreeMap::new(),
        });
        let result = rx.recv().unwrap();
        assert!(matches!(result, Err(Error::ToolNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = execute(&ExecRequest {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo \"$GREETING\"; pwd; exit 3".to_string()],
            working_dir: dir.path().to_path_buf(),
            env: BTreeMap::from([("GREETING".to_string(), "hello".to_string())]),
        })
        .unwrap();
        assert_eq!(outcome.exit_code, Some(3));
        assert!(!outcome.success());
        assert!(outcome.output.starts_with("hello\n"));
    }
}
