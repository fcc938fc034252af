//! Fetching, building and running the linkchecker.

use std::fs;
use std::path::{Path, PathBuf};

use docmake_process::{describe_code, ProcessCommand, ProcessError, ProcessStatus, Runner};

/// Errors that can occur while preparing or running the linkchecker.
#[derive(Debug, thiserror::Error)]
pub enum LinkCheckError {
    #[error("Failed to fetch the linkchecker sources")]
    Fetch(#[source] ProcessError),

    #[error("Failed to build the linkchecker")]
    Compile(#[source] ProcessError),

    #[error("Failed to run the linkchecker")]
    Run(#[source] ProcessError),

    #[error("Failed to prepare checkout {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("linkchecker failed with {}", describe_code(*.code))]
    BrokenLinks { code: Option<i32> },
}

/// Where the linkchecker comes from and where it is checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheckerSource {
    /// Remote to fetch from
    pub repository: String,

    /// Branch to check out
    pub branch: String,

    /// Path of the tool's crate inside the repository
    pub subtree: PathBuf,

    /// Local checkout directory
    pub checkout: PathBuf,

    /// Cargo executable used to build the tool
    pub cargo: String,
}

impl LinkCheckerSource {
    /// The upstream rustc linkchecker checked out at `<root>/.linkchecker`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            repository: "https://github.com/rust-lang/rust".to_string(),
            branch: "master".to_string(),
            subtree: PathBuf::from("src/tools/linkchecker"),
            checkout: root.join(".linkchecker"),
            cargo: "cargo".to_string(),
        }
    }

    /// The tool's crate directory inside the checkout.
    pub fn crate_dir(&self) -> PathBuf {
        self.checkout.join(&self.subtree)
    }

    /// The release binary cargo produces.
    pub fn binary(&self) -> PathBuf {
        let name = self
            .subtree
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "linkchecker".to_string());
        self.crate_dir()
            .join("target")
            .join("release")
            .join(format!("{}{}", name, std::env::consts::EXE_SUFFIX))
    }

    /// The sparse-checkout pattern selecting only the subtree.
    pub fn sparse_pattern(&self) -> String {
        let subtree = self
            .subtree
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("/{}/", subtree)
    }

    /// Inspect the checkout on disk.
    pub fn state(&self) -> CheckoutState {
        if !self.crate_dir().is_dir() {
            CheckoutState::Absent
        } else if !self.binary().is_file() {
            CheckoutState::Unbuilt
        } else {
            CheckoutState::Ready
        }
    }
}

/// Progress of the local linkchecker checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Nothing checked out yet
    Absent,

    /// Sources present, binary not built
    Unbuilt,

    /// Binary built and ready to run
    Ready,
}

/// Make sure the linkchecker binary exists, fetching and building it as
/// needed, and return its path.
///
/// An existing binary is reused as is; it is never refreshed from upstream.
pub async fn bootstrap<R: Runner>(
    runner: &R,
    source: &LinkCheckerSource,
) -> Result<PathBuf, LinkCheckError> {
    let mut state = source.state();
    tracing::debug!("linkchecker checkout is {:?}", state);

    if state == CheckoutState::Absent {
        fetch(runner, source).await?;
        state = CheckoutState::Unbuilt;
    }

    let binary = source.binary();
    if state == CheckoutState::Unbuilt {
        tracing::info!("Building linkchecker...");
        let build = ProcessCommand::new(&source.cargo)
            .args(["build", "--release"])
            .current_dir(source.crate_dir());
        run_checked(runner, &build)
            .await
            .map_err(LinkCheckError::Compile)?;
    }

    Ok(binary)
}

async fn fetch<R: Runner>(runner: &R, source: &LinkCheckerSource) -> Result<(), LinkCheckError> {
    tracing::info!(
        "Fetching linkchecker from {} into {}",
        source.repository,
        source.checkout.display()
    );

    // A previous fetch may have stopped halfway.
    if source.checkout.exists() {
        fs::remove_dir_all(&source.checkout).map_err(|e| io_error(&source.checkout, e))?;
    }

    let init = ProcessCommand::new("git").arg("init").arg(&source.checkout);
    run_checked(runner, &init)
        .await
        .map_err(LinkCheckError::Fetch)?;

    let git = |args: &[&str]| {
        ProcessCommand::new("git")
            .args(args)
            .current_dir(&source.checkout)
    };

    // Only fetch blobs the sparse checkout actually needs.
    let setup = [
        git(&["remote", "add", "origin", source.repository.as_str()]),
        git(&["config", "remote.origin.promisor", "true"]),
        git(&["config", "remote.origin.partialCloneFilter", "blob:none"]),
        git(&["config", "core.sparsecheckout", "true"]),
    ];
    for cmd in &setup {
        run_checked(runner, cmd)
            .await
            .map_err(LinkCheckError::Fetch)?;
    }

    let info = source.checkout.join(".git").join("info");
    let sparse = info.join("sparse-checkout");
    fs::create_dir_all(&info)
        .and_then(|()| fs::write(&sparse, source.sparse_pattern()))
        .map_err(|e| io_error(&sparse, e))?;

    let checkout = [
        git(&["fetch", "--depth=1", "origin", source.branch.as_str()]),
        git(&["checkout", source.branch.as_str()]),
    ];
    for cmd in &checkout {
        run_checked(runner, cmd)
            .await
            .map_err(LinkCheckError::Fetch)?;
    }

    Ok(())
}

/// Run the linkchecker over a rendered output directory.
pub async fn check_links<R: Runner>(
    runner: &R,
    binary: &Path,
    rendered: &Path,
) -> Result<(), LinkCheckError> {
    tracing::info!("Checking links in {}", rendered.display());

    let cmd = ProcessCommand::new(binary).arg(rendered);
    let output = runner.run(&cmd).await.map_err(LinkCheckError::Run)?;
    match output.status {
        ProcessStatus::Success => {
            tracing::info!("All links are valid");
            Ok(())
        }
        ProcessStatus::Failed { code } => Err(LinkCheckError::BrokenLinks { code }),
        ProcessStatus::Interrupted => Err(LinkCheckError::Run(ProcessError::Interrupted)),
    }
}

async fn run_checked<R: Runner>(runner: &R, cmd: &ProcessCommand) -> Result<(), ProcessError> {
    runner.run(cmd).await?.check(cmd)?;
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> LinkCheckError {
    LinkCheckError::Io {
        path: path.to_path_buf(),
        source,
    }
}
