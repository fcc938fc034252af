//! Looking up the git commit to stamp on rendered pages.

use std::path::Path;

use docmake_process::{describe_code, ProcessCommand, ProcessError, ProcessStatus, Runner};

/// Outcome of asking git for the current revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitLookup {
    /// The trimmed output of `git rev-parse HEAD`
    Found(String),

    /// git is not installed
    ToolMissing,

    /// git ran but could not produce a revision
    QueryFailed { reason: String },
}

impl CommitLookup {
    /// The commit id, if one was found.
    pub fn commit(&self) -> Option<&str> {
        match self {
            Self::Found(commit) => Some(commit),
            _ => None,
        }
    }
}

/// Ask git for the revision checked out at `root`.
///
/// Lookup failures are logged and returned as values; only an interrupt is
/// an error.
pub async fn resolve_commit<R: Runner>(
    runner: &R,
    root: &Path,
) -> Result<CommitLookup, ProcessError> {
    let cmd = ProcessCommand::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(root)
        .capture_stdout();

    let lookup = match runner.run(&cmd).await {
        Ok(output) => match output.status {
            ProcessStatus::Success => {
                let commit = output.stdout.trim();
                if commit.is_empty() {
                    CommitLookup::QueryFailed {
                        reason: "git printed no revision".to_string(),
                    }
                } else {
                    CommitLookup::Found(commit.to_string())
                }
            }
            ProcessStatus::Failed { code } => CommitLookup::QueryFailed {
                reason: format!("git returned an error ({})", describe_code(code)),
            },
            ProcessStatus::Interrupted => return Err(ProcessError::Interrupted),
        },
        Err(ProcessError::NotFound { .. }) => CommitLookup::ToolMissing,
        Err(ProcessError::Interrupted) => return Err(ProcessError::Interrupted),
        Err(e) => CommitLookup::QueryFailed {
            reason: e.to_string(),
        },
    };

    match &lookup {
        CommitLookup::Found(commit) => tracing::debug!("Stamping build with commit {}", commit),
        CommitLookup::ToolMissing => {
            tracing::warn!("failed to detect git commit: missing executable git")
        }
        CommitLookup::QueryFailed { reason } => {
            tracing::warn!("failed to detect git commit: {}", reason)
        }
    }

    Ok(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmake_process::{ProcessOutput, ScriptedRunner};

    #[tokio::test]
    async fn trims_revision() {
        let runner =
            ScriptedRunner::responding(|_| Ok(ProcessOutput::success().stdout("abc123\n")));

        let lookup = resolve_commit(&runner, Path::new("/book")).await.unwrap();

        assert_eq!(lookup, CommitLookup::Found("abc123".to_string()));
        assert_eq!(lookup.commit(), Some("abc123"));

        let call = &runner.calls()[0];
        assert_eq!(runner.command_lines()[0], "git rev-parse HEAD");
        assert_eq!(call.cwd.as_deref(), Some(Path::new("/book")));
        assert!(call.capture_stdout);
    }

    #[tokio::test]
    async fn missing_git_is_distinguished() {
        let runner = ScriptedRunner::responding(|_| {
            Err(ProcessError::NotFound {
                program: "git".to_string(),
            })
        });

        let lookup = resolve_commit(&runner, Path::new("/book")).await.unwrap();

        assert_eq!(lookup, CommitLookup::ToolMissing);
        assert_eq!(lookup.commit(), None);
    }

    #[tokio::test]
    async fn outside_a_repository_falls_back() {
        let runner = ScriptedRunner::responding(|_| Ok(ProcessOutput::failed(128)));

        let lookup = resolve_commit(&runner, Path::new("/tmp")).await.unwrap();

        assert!(matches!(lookup, CommitLookup::QueryFailed { ref reason } if reason.contains("128")));
        assert_eq!(lookup.commit(), None);
    }

    #[tokio::test]
    async fn empty_output_is_not_a_commit() {
        let runner = ScriptedRunner::responding(|_| Ok(ProcessOutput::success().stdout("  \n")));

        let lookup = resolve_commit(&runner, Path::new("/book")).await.unwrap();

        assert_eq!(lookup.commit(), None);
    }

    #[tokio::test]
    async fn interrupt_propagates() {
        let runner = ScriptedRunner::responding(|_| Ok(ProcessOutput::interrupted()));

        let err = resolve_commit(&runner, Path::new("/book")).await.unwrap_err();

        assert!(err.is_interrupted());
    }
}
