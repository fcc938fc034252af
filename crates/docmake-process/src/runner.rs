//! Running commands on the host.

use std::future::Future;
use std::io;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::command::{ProcessCommand, ProcessError, ProcessOutput, ProcessStatus};

/// Something that can run a [`ProcessCommand`] to completion.
pub trait Runner: Send + Sync {
    /// Run the command and wait for it to finish.
    ///
    /// A non-zero exit is reported through [`ProcessOutput::status`], not as
    /// an error; only failing to launch the program is an `Err`.
    fn run(
        &self,
        command: &ProcessCommand,
    ) -> impl Future<Output = Result<ProcessOutput, ProcessError>> + Send;
}

/// Runs commands as real child processes.
///
/// stdin and stderr are inherited, and stdout too unless the command asks for
/// capture. A Ctrl-C while the child runs kills it and resolves to
/// [`ProcessStatus::Interrupted`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Runner for SystemRunner {
    async fn run(&self, command: &ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        run_until(command, ctrl_c()).await
    }
}

/// Resolves on the first Ctrl-C, or never if the handler cannot be installed.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Run `command` until it exits or `interrupt` resolves, whichever is first.
///
/// An interrupted child is killed, so nothing keeps writing into the
/// environment or checkout after we return.
async fn run_until<F>(command: &ProcessCommand, interrupt: F) -> Result<ProcessOutput, ProcessError>
where
    F: Future<Output = ()>,
{
    debug!(command = %command, cwd = ?command.cwd, "spawning process");

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    if command.capture_stdout {
        cmd.stdout(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
    }
    if let Some(ref cwd) = command.cwd {
        cmd.current_dir(cwd);
    }

    let child = cmd.spawn().map_err(|e| spawn_error(command, e))?;

    // Checked first so a child that exits because of the interrupt is still
    // reported as interrupted.
    tokio::select! {
        biased;

        () = interrupt => {
            debug!(program = %command.program_name(), "interrupted");
            Ok(ProcessOutput::interrupted())
        }
        output = child.wait_with_output() => {
            let output = output.map_err(|e| spawn_error(command, e))?;
            let status = if output.status.success() {
                ProcessStatus::Success
            } else {
                ProcessStatus::Failed { code: output.status.code() }
            };
            debug!(program = %command.program_name(), ?status, "process finished");

            Ok(ProcessOutput {
                status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            })
        }
    }
}

fn spawn_error(command: &ProcessCommand, source: io::Error) -> ProcessError {
    if source.kind() == io::ErrorKind::NotFound {
        ProcessError::NotFound {
            program: command.program_name(),
        }
    } else {
        ProcessError::Spawn {
            program: command.program_name(),
            source,
        }
    }
}
