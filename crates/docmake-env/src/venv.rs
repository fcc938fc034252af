//! The provisioned virtualenv.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use docmake_process::{ProcessCommand, ProcessError, Runner};

/// File inside the environment holding a copy of the installed manifest.
pub const INSTALLED_MARKER: &str = "installed-requirements.txt";

/// Errors that can occur while provisioning.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("Failed to read requirements {}: {source}", path.display())]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove stale environment {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteMarker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create virtual environment")]
    Create(#[source] ProcessError),

    #[error("Failed to install requirements")]
    Install(#[source] ProcessError),
}

/// Name of the executables directory inside a virtualenv.
pub fn bin_dir_name(windows: bool) -> &'static str {
    if windows {
        "Scripts"
    } else {
        "bin"
    }
}

/// A virtualenv at a fixed path, tied to a requirements manifest.
#[derive(Debug, Clone)]
pub struct VirtualEnv {
    path: PathBuf,
    requirements: PathBuf,
    installed_requirements: PathBuf,
}

impl VirtualEnv {
    /// Describe the environment at `path`, pinned to `requirements`.
    ///
    /// Nothing is touched on disk until [`VirtualEnv::ensure`] runs.
    pub fn new(path: impl Into<PathBuf>, requirements: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let installed_requirements = path.join(INSTALLED_MARKER);
        Self {
            path,
            requirements: requirements.into(),
            installed_requirements,
        }
    }

    /// The conventional layout: `<root>/.venv` pinned to
    /// `<root>/shared/requirements.txt`.
    pub fn for_root(root: &Path) -> Self {
        Self::new(
            root.join(".venv"),
            root.join("shared").join("requirements.txt"),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn requirements(&self) -> &Path {
        &self.requirements
    }

    /// Path to an executable installed in the environment.
    pub fn bin(&self, name: &str) -> PathBuf {
        let dir = self.path.join(bin_dir_name(cfg!(windows)));
        if Path::new(name).extension().is_none() {
            dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX))
        } else {
            dir.join(name)
        }
    }

    /// Whether the installed marker matches the manifest byte for byte.
    pub fn is_up_to_date(&self) -> Result<bool, EnvError> {
        let expected = self.read_manifest()?;
        match fs::read(&self.installed_requirements) {
            Ok(installed) => Ok(installed == expected),
            Err(_) => Ok(false),
        }
    }

    /// Make sure the environment exists and matches the manifest, recreating
    /// it with `python` when it does not.
    pub async fn ensure<R: Runner>(&self, runner: &R, python: &str) -> Result<(), EnvError> {
        if self.is_up_to_date()? {
            tracing::debug!("Virtual environment {} is up to date", self.path.display());
            return Ok(());
        }

        self.create(runner, python).await
    }

    async fn create<R: Runner>(&self, runner: &R, python: &str) -> Result<(), EnvError> {
        let start = Instant::now();
        tracing::info!("Provisioning virtual environment in {}", self.path.display());

        if self.path.exists() {
            fs::remove_dir_all(&self.path).map_err(|source| EnvError::Remove {
                path: self.path.clone(),
                source,
            })?;
        }

        let mut create = ProcessCommand::new(python).args(["-m", "venv"]);
        if !cfg!(windows) {
            create = create.arg("--symlinks");
        }
        let create = create.arg(&self.path);
        runner
            .run(&create)
            .await
            .and_then(|output| output.check(&create))
            .map_err(EnvError::Create)?;

        let install = ProcessCommand::new(self.bin("pip"))
            .args(["install", "-r"])
            .arg(&self.requirements)
            .arg("--require-hashes");
        runner
            .run(&install)
            .await
            .and_then(|output| output.check(&install))
            .map_err(EnvError::Install)?;

        // Written last: a marker only exists for a fully installed environment.
        let manifest = self.read_manifest()?;
        fs::create_dir_all(&self.path)
            .and_then(|()| fs::write(&self.installed_requirements, manifest))
            .map_err(|source| EnvError::WriteMarker {
                path: self.installed_requirements.clone(),
                source,
            })?;

        tracing::info!(
            "Virtual environment ready in {}ms",
            start.elapsed().as_millis()
        );
        Ok(())
    }

    fn read_manifest(&self) -> Result<Vec<u8>, EnvError> {
        fs::read(&self.requirements).map_err(|source| EnvError::ReadManifest {
            path: self.requirements.clone(),
            source,
        })
    }
}
