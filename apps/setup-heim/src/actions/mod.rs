//! Communication with the CI runner.
//!
//! [`ActionEnvironment`] is the seam the installer writes through. The
//! production [`WorkflowRunner`] uses the runner's file commands when their
//! paths are configured and falls back to stdout workflow commands otherwise.

pub mod command;
pub mod file_command;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::errors::{Result, SetupError};

/// Environment mutations and outputs visible to later workflow steps.
pub trait ActionEnvironment: Send + Sync {
    /// Prepends `dir` to `PATH` for subsequent steps.
    fn add_path(&self, dir: &Path) -> Result<()>;

    /// Exports an environment variable to subsequent steps.
    fn export_variable(&self, name: &str, value: &str) -> Result<()>;

    /// Sets step outputs in order. Either all of them are written or none.
    fn set_outputs(&self, outputs: &[(&str, &str)]) -> Result<()>;

    /// Reports a failure annotation.
    fn set_failed(&self, message: &str);
}

/// Paths of the runner's command files. `None` means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandFiles {
    pub path: Option<PathBuf>,
    pub env: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// [`ActionEnvironment`] talking to a GitHub-compatible runner.
#[derive(Debug)]
pub struct WorkflowRunner<W = io::Stdout> {
    files: CommandFiles,
    out: Mutex<W>,
}

impl WorkflowRunner {
    /// Creates a runner that falls back to the process stdout.
    #[must_use]
    pub fn new(files: CommandFiles) -> Self {
        Self::with_writer(files, io::stdout())
    }
}

impl<W: Write + Send> WorkflowRunner<W> {
    /// Creates a runner that writes workflow commands to `writer`.
    pub fn with_writer(files: CommandFiles, writer: W) -> Self {
        Self {
            files,
            out: Mutex::new(writer),
        }
    }

    /// Consumes the runner and returns its writer.
    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, line: &str) -> Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")
            .and_then(|()| out.flush())
            .map_err(|e| SetupError::io("failed to write workflow command", e))
    }
}

impl<W: Write + Send> ActionEnvironment for WorkflowRunner<W> {
    fn add_path(&self, dir: &Path) -> Result<()> {
        let dir = dir.to_string_lossy();
        match &self.files.path {
            Some(file) => file_command::issue(file, &dir),
            None => self.emit(&command::format_command("add-path", &[], &dir)),
        }
    }

    fn export_variable(&self, name: &str, value: &str) -> Result<()> {
        match &self.files.env {
            Some(file) => file_command::issue(file, &file_command::key_value_message(name, value)?),
            None => self.emit(&command::format_command("set-env", &[("name", name)], value)),
        }
    }

    fn set_outputs(&self, outputs: &[(&str, &str)]) -> Result<()> {
        match &self.files.output {
            Some(file) => file_command::issue_key_values(file, outputs),
            None => {
                let lines: Vec<String> = outputs
                    .iter()
                    .map(|&(name, value)| {
                        command::format_command("set-output", &[("name", name)], value)
                    })
                    .collect();
                self.emit(&lines.join("\n"))
            }
        }
    }

    fn set_failed(&self, message: &str) {
        let _ = self.emit(&command::format_command("error", &[], message));
    }
}
