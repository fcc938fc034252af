//! Running sphinx-build (or sphinx-autobuild) inside the environment.

use std::path::PathBuf;
use std::time::Instant;

use docmake_env::VirtualEnv;
use docmake_process::{describe_code, ProcessCommand, ProcessError, ProcessStatus, Runner};

use crate::commit::resolve_commit;
use crate::invocation::{compose_args, BuildOptions, Layout};

/// Shown after the builder fails.
pub const DEBUG_HINT: &str = "if you see an exception, pass --debug to see the full traceback";

/// Errors that can occur during a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{program} failed with {}", describe_code(*.code))]
    BuilderFailed { program: String, code: Option<i32> },

    #[error("Failed to run the document builder")]
    Process(#[from] ProcessError),
}

impl BuildError {
    /// Extra guidance to print alongside the error.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::BuilderFailed { .. } => Some(DEBUG_HINT),
            Self::Process(_) => None,
        }
    }
}

/// Render the book and return the output directory.
///
/// In serve mode this only returns once the live-reload server exits.
pub async fn build_docs<R: Runner>(
    runner: &R,
    env: &VirtualEnv,
    layout: &Layout,
    options: &BuildOptions,
) -> Result<PathBuf, BuildError> {
    let start = Instant::now();

    let lookup = resolve_commit(runner, &layout.root).await?;
    let args = compose_args(layout, options, lookup.commit());

    let program = options.program();
    let cmd = ProcessCommand::new(env.bin(program)).args(args);

    if options.serve {
        tracing::info!("Starting live-reload server, press Ctrl-C to stop");
    } else {
        tracing::info!("Building {} output...", options.format);
    }

    let output = runner.run(&cmd).await?;
    match output.status {
        ProcessStatus::Success => {}
        ProcessStatus::Failed { code } => {
            return Err(BuildError::BuilderFailed {
                program: program.to_string(),
                code,
            })
        }
        ProcessStatus::Interrupted => return Err(ProcessError::Interrupted.into()),
    }

    let output_dir = layout.output_dir(options.format);
    tracing::info!(
        "Rendered {} in {}ms",
        output_dir.display(),
        start.elapsed().as_millis()
    );

    Ok(output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmake_process::{ProcessOutput, ScriptedRunner};
    use std::path::Path;

    fn env() -> VirtualEnv {
        VirtualEnv::for_root(Path::new("/book"))
    }

    fn sphinx_responds(status: ProcessOutput) -> ScriptedRunner {
        ScriptedRunner::responding(move |cmd| {
            if cmd.program_name() == "git" {
                Ok(ProcessOutput::success().stdout("abc123\n"))
            } else {
                Ok(status.clone())
            }
        })
    }

    #[tokio::test]
    async fn builds_with_commit_stamp() {
        let runner = sphinx_responds(ProcessOutput::success());
        let layout = Layout::for_root(Path::new("/book"));

        let out = build_docs(&runner, &env(), &layout, &BuildOptions::default())
            .await
            .unwrap();

        assert_eq!(out, Path::new("/book/build/html"));
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].program, env().bin("sphinx-build").into_os_string());
        assert!(calls[1]
            .args
            .iter()
            .any(|a| a == "html_theme_options.commit=abc123"));
    }

    #[tokio::test]
    async fn serve_runs_autobuild() {
        let runner = sphinx_responds(ProcessOutput::success());
        let layout = Layout::for_root(Path::new("/book"));
        let options = BuildOptions {
            serve: true,
            ..Default::default()
        };

        build_docs(&runner, &env(), &layout, &options).await.unwrap();

        assert_eq!(
            runner.calls()[1].program,
            env().bin("sphinx-autobuild").into_os_string()
        );
    }

    #[tokio::test]
    async fn builder_failure_carries_hint() {
        let runner = sphinx_responds(ProcessOutput::failed(2));
        let layout = Layout::for_root(Path::new("/book"));

        let err = build_docs(&runner, &env(), &layout, &BuildOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::BuilderFailed { code: Some(2), .. }));
        assert_eq!(err.hint(), Some(DEBUG_HINT));
    }

    #[tokio::test]
    async fn interrupt_has_no_hint() {
        let runner = sphinx_responds(ProcessOutput::interrupted());
        let layout = Layout::for_root(Path::new("/book"));

        let err = build_docs(&runner, &env(), &layout, &BuildOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, BuildError::Process(ProcessError::Interrupted)));
        assert_eq!(err.hint(), None);
    }

    #[tokio::test]
    async fn missing_git_still_builds() {
        let runner = ScriptedRunner::responding(|cmd| {
            if cmd.program_name() == "git" {
                Err(ProcessError::NotFound {
                    program: "git".to_string(),
                })
            } else {
                Ok(ProcessOutput::success())
            }
        });
        let layout = Layout::for_root(Path::new("/book"));

        build_docs(&runner, &env(), &layout, &BuildOptions::default())
            .await
            .unwrap();

        assert!(!runner.calls()[1].args.iter().any(|a| a == "-D"));
    }
}
