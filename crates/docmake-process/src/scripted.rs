//! A recording [`Runner`] for tests.

use std::sync::{Arc, Mutex};

use crate::command::{ProcessCommand, ProcessError, ProcessOutput};
use crate::runner::Runner;

type Responder = dyn Fn(&ProcessCommand) -> Result<ProcessOutput, ProcessError> + Send + Sync;

/// Records every command and answers from a responder closure.
///
/// Without a responder every command succeeds with empty stdout.
#[derive(Clone)]
pub struct ScriptedRunner {
    calls: Arc<Mutex<Vec<ProcessCommand>>>,
    responder: Arc<Responder>,
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::responding(|_| Ok(ProcessOutput::success()))
    }

    pub fn responding<F>(responder: F) -> Self
    where
        F: Fn(&ProcessCommand) -> Result<ProcessOutput, ProcessError> + Send + Sync + 'static,
    {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responder: Arc::new(responder),
        }
    }

    /// Commands run so far, in order.
    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Program names of the commands run so far.
    pub fn programs(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.program_name()).collect()
    }

    /// Rendered command lines (program name plus arguments).
    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| {
                let mut line = c.program_name();
                for arg in &c.args {
                    line.push(' ');
                    line.push_str(&arg.to_string_lossy());
                }
                line
            })
            .collect()
    }
}

impl Runner for ScriptedRunner {
    async fn run(&self, command: &ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.calls.lock().unwrap().push(command.clone());
        (self.responder)(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ProcessStatus;

    #[tokio::test]
    async fn records_calls_and_responds() {
        let runner = ScriptedRunner::responding(|cmd| {
            if cmd.program_name() == "git" {
                Ok(ProcessOutput::success().stdout("abc123\n"))
            } else {
                Ok(ProcessOutput::failed(2))
            }
        });

        let git = runner
            .run(&ProcessCommand::new("git").args(["rev-parse", "HEAD"]))
            .await
            .unwrap();
        let other = runner
            .run(&ProcessCommand::new("/opt/bin/sphinx-build"))
            .await
            .unwrap();

        assert_eq!(git.stdout, "abc123\n");
        assert_eq!(other.status, ProcessStatus::Failed { code: Some(2) });
        assert_eq!(runner.programs(), vec!["git", "sphinx-build"]);
        assert_eq!(runner.command_lines()[0], "git rev-parse HEAD");
    }
}
