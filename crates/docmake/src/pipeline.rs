//! Provision, build, and optionally check links.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use docmake_linkcheck::{bootstrap, check_links};
use docmake_process::{ProcessError, Runner};
use docmake_sphinx::{build_docs, BuildError, BuildOptions};

use crate::config::ConfigFile;

/// What the user asked for on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeOptions {
    pub build: BuildOptions,
    pub check_links: bool,
}

/// Run the whole pipeline for the book at `root`.
pub async fn run<R: Runner>(
    runner: &R,
    root: &Path,
    config: &ConfigFile,
    options: &MakeOptions,
) -> Result<()> {
    let env = config.virtual_env(root);
    env.ensure(runner, &config.python.interpreter)
        .await
        .context("Failed to prepare the Python environment")?;

    let rendered = build_docs(runner, &env, &config.layout(root), &options.build).await?;

    if options.check_links {
        let linkchecker = bootstrap(runner, &config.linkchecker(root)).await?;
        check_links(runner, &linkchecker, &rendered).await?;
    }

    Ok(())
}

/// Whether the run stopped because the user pressed Ctrl-C.
pub fn interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<ProcessError>()
            .map(ProcessError::is_interrupted)
            .unwrap_or(false)
    })
}

/// Extra guidance for a failed run, if any applies.
pub fn hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BuildError>())
        .and_then(BuildError::hint)
}

/// What to tell the user about a failed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FailureReport {
    /// The error chain, absent for a Ctrl-C
    pub error: Option<String>,
    pub hint: Option<&'static str>,
}

impl FailureReport {
    pub fn new(err: &anyhow::Error) -> Self {
        if interrupted(err) {
            return Self::default();
        }
        Self {
            error: Some(format!("{:#}", err)),
            hint: hint(err),
        }
    }

    /// Log the report and return the process exit code.
    pub fn emit(&self) -> ExitCode {
        if let Some(ref error) = self.error {
            tracing::error!("{}", error);
        }
        if let Some(hint) = self.hint {
            tracing::info!("hint: {}", hint);
        }
        ExitCode::FAILURE
    }
}
