//! Optional per-book configuration (docmake.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use docmake_env::VirtualEnv;
use docmake_linkcheck::LinkCheckerSource;
use docmake_sphinx::Layout;

/// Configuration file structure.
///
/// Relative paths are resolved against the book root.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub python: PythonConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub sphinx: SphinxConfig,
    #[serde(default)]
    pub linkchecker: LinkCheckerConfig,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PythonConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    #[serde(default = "default_venv")]
    pub path: PathBuf,
    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SphinxConfig {
    #[serde(default = "default_source")]
    pub source: PathBuf,
    #[serde(default = "default_build")]
    pub build: PathBuf,
    /// Directories watched in serve mode, besides the sources
    #[serde(default = "default_watch")]
    pub watch: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LinkCheckerConfig {
    #[serde(default = "default_repository")]
    pub repository: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_subtree")]
    pub subtree: PathBuf,
    #[serde(default = "default_checkout")]
    pub checkout: PathBuf,
    #[serde(default = "default_cargo")]
    pub cargo: String,
}

fn default_interpreter() -> String {
    let interpreter = if cfg!(windows) { "python" } else { "python3" };
    interpreter.to_string()
}
fn default_venv() -> PathBuf {
    PathBuf::from(".venv")
}
fn default_requirements() -> PathBuf {
    PathBuf::from("shared/requirements.txt")
}
fn default_source() -> PathBuf {
    PathBuf::from("src")
}
fn default_build() -> PathBuf {
    PathBuf::from("build")
}
fn default_watch() -> Vec<PathBuf> {
    vec![PathBuf::from("exts"), PathBuf::from("themes")]
}
fn default_repository() -> String {
    "https://github.com/rust-lang/rust".to_string()
}
fn default_branch() -> String {
    "master".to_string()
}
fn default_subtree() -> PathBuf {
    PathBuf::from("src/tools/linkchecker")
}
fn default_checkout() -> PathBuf {
    PathBuf::from(".linkchecker")
}
fn default_cargo() -> String {
    "cargo".to_string()
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            path: default_venv(),
            requirements: default_requirements(),
        }
    }
}

impl Default for SphinxConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            build: default_build(),
            watch: default_watch(),
        }
    }
}

impl Default for LinkCheckerConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            branch: default_branch(),
            subtree: default_subtree(),
            checkout: default_checkout(),
            cargo: default_cargo(),
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

impl ConfigFile {
    pub fn virtual_env(&self, root: &Path) -> VirtualEnv {
        VirtualEnv::new(
            root.join(&self.environment.path),
            root.join(&self.environment.requirements),
        )
    }

    pub fn layout(&self, root: &Path) -> Layout {
        Layout {
            root: root.to_path_buf(),
            source_dir: root.join(&self.sphinx.source),
            build_dir: root.join(&self.sphinx.build),
            watch_dirs: self.sphinx.watch.iter().map(|d| root.join(d)).collect(),
        }
    }

    pub fn linkchecker(&self, root: &Path) -> LinkCheckerSource {
        LinkCheckerSource {
            repository: self.linkchecker.repository.clone(),
            branch: self.linkchecker.branch.clone(),
            subtree: self.linkchecker.subtree.clone(),
            checkout: root.join(&self.linkchecker.checkout),
            cargo: self.linkchecker.cargo.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = load_config(&temp.path().join("docmake.toml")).unwrap();

        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn defaults_match_conventional_layout() {
        let root = Path::new("/book");
        let config = ConfigFile::default();

        assert_eq!(config.layout(root), Layout::for_root(root));
        assert_eq!(config.linkchecker(root), LinkCheckerSource::for_root(root));

        let env = config.virtual_env(root);
        let conventional = VirtualEnv::for_root(root);
        assert_eq!(env.path(), conventional.path());
        assert_eq!(env.requirements(), conventional.requirements());
    }

    #[test]
    fn partial_file_overrides_selected_fields() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("docmake.toml");
        fs::write(
            &path,
            r#"
[sphinx]
source = "book"

[linkchecker]
branch = "main"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.sphinx.source, PathBuf::from("book"));
        assert_eq!(config.sphinx.build, PathBuf::from("build"));
        assert_eq!(config.linkchecker.branch, "main");
        assert_eq!(config.linkchecker.repository, default_repository());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("docmake.toml");
        fs::write(&path, "[sphinx\nsource = 1").unwrap();

        let err = load_config(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn misspelt_key_inside_section_is_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("docmake.toml");
        fs::write(&path, "[sphinx]\nsorce = \"book\"\n").unwrap();

        let err = load_config(&path).unwrap_err();

        assert!(format!("{:#}", err).contains("sorce"));
    }

    #[test]
    fn unknown_key_in_every_section_is_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("docmake.toml");

        for section in ["python", "environment", "sphinx", "linkchecker"] {
            fs::write(&path, format!("[{}]\nbogus = \"x\"\n", section)).unwrap();
            assert!(load_config(&path).is_err(), "[{}] accepted an unknown key", section);
        }
    }
}
