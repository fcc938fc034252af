//! Command descriptions and their outcomes.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    /// Program name or path
    pub program: OsString,

    /// Arguments, in order
    pub args: Vec<OsString>,

    /// Working directory (inherits the current one when unset)
    pub cwd: Option<PathBuf>,

    /// Capture stdout instead of inheriting it
    pub capture_stdout: bool,
}

impl ProcessCommand {
    /// Create a command for the given program with no arguments.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
            capture_stdout: false,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run the program in `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Capture stdout so the caller can read it.
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// The program's file name, used in log and error messages.
    pub fn program_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .unwrap_or(&self.program)
            .to_string_lossy()
            .into_owned()
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How a finished process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Exited with status 0
    Success,

    /// Exited unsuccessfully; `code` is `None` when killed by a signal
    Failed { code: Option<i32> },

    /// The user interrupted the run while the process was executing
    Interrupted,
}

/// The result of running a [`ProcessCommand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: ProcessStatus,

    /// Captured stdout, empty unless the command asked for capture
    pub stdout: String,
}

impl ProcessOutput {
    pub fn success() -> Self {
        Self::with_status(ProcessStatus::Success)
    }

    pub fn failed(code: i32) -> Self {
        Self::with_status(ProcessStatus::Failed { code: Some(code) })
    }

    pub fn interrupted() -> Self {
        Self::with_status(ProcessStatus::Interrupted)
    }

    pub fn with_status(status: ProcessStatus) -> Self {
        Self {
            status,
            stdout: String::new(),
        }
    }

    /// Attach captured stdout.
    pub fn stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Turn an unsuccessful status into an error.
    pub fn check(self, command: &ProcessCommand) -> Result<Self, ProcessError> {
        match self.status {
            ProcessStatus::Success => Ok(self),
            ProcessStatus::Failed { code } => Err(ProcessError::Failed {
                command: command.to_string(),
                code,
            }),
            ProcessStatus::Interrupted => Err(ProcessError::Interrupted),
        }
    }
}

/// Errors from running an external program.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("missing executable {program}")]
    NotFound { program: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{command}` failed with {}", describe_code(*.code))]
    Failed { command: String, code: Option<i32> },

    #[error("interrupted")]
    Interrupted,
}

impl ProcessError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

/// Render an exit code for messages.
pub fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}
