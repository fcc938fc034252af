//! Composing sphinx-build command lines.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Sphinx builder to render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Xml,
}

impl OutputFormat {
    /// The builder name passed to `-b`, also used as the output directory name.
    pub fn builder_name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.builder_name())
    }
}

/// Where a book's sources and outputs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Book root
    pub root: PathBuf,

    /// Document sources
    pub source_dir: PathBuf,

    /// Parent of the doctree cache and every rendered format
    pub build_dir: PathBuf,

    /// Extra directories watched by the live-reload server
    pub watch_dirs: Vec<PathBuf>,
}

impl Layout {
    /// The conventional layout under `root`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            source_dir: root.join("src"),
            build_dir: root.join("build"),
            watch_dirs: vec![root.join("exts"), root.join("themes")],
        }
    }

    pub fn doctree_dir(&self) -> PathBuf {
        self.build_dir.join("doctrees")
    }

    /// Rendered output for `format`.
    pub fn output_dir(&self, format: OutputFormat) -> PathBuf {
        self.build_dir.join(format.builder_name())
    }
}

/// Modes selected for a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    pub format: OutputFormat,

    /// Discard the doctree cache and rebuild everything
    pub clear: bool,

    /// Run the live-reload server instead of a one-shot build
    pub serve: bool,

    /// Serial build with full tracebacks
    pub debug: bool,
}

impl BuildOptions {
    /// Executable to run from the environment.
    pub fn program(&self) -> &'static str {
        if self.serve {
            "sphinx-autobuild"
        } else {
            "sphinx-build"
        }
    }
}

/// Theme option carrying the commit id into rendered pages.
pub const COMMIT_OVERRIDE: &str = "html_theme_options.commit";

/// Build the full argument list for the builder.
pub fn compose_args(layout: &Layout, options: &BuildOptions, commit: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-b".into(),
        options.format.builder_name().into(),
        "-d".into(),
        layout.doctree_dir().into(),
    ];

    if options.debug {
        // Exceptions are swallowed by worker processes, so tracebacks need a
        // serial build.
        args.extend(["-j", "1", "-T"].map(OsString::from));
    } else {
        args.extend(["-j", "auto"].map(OsString::from));
    }

    if options.clear {
        args.push("-E".into());
    }

    if options.serve {
        for dir in &layout.watch_dirs {
            args.push("--watch".into());
            args.push(dir.clone().into());
        }
    } else {
        // Fail on warnings, but only once the whole build has reported them.
        args.extend(["-W", "--keep-going"].map(OsString::from));
    }

    if let Some(commit) = commit {
        args.push("-D".into());
        args.push(format!("{}={}", COMMIT_OVERRIDE, commit).into());
    }

    args.push(layout.source_dir.clone().into());
    args.push(layout.output_dir(options.format).into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout() -> Layout {
        Layout::for_root(Path::new("/book"))
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn default_one_shot_html_build() {
        let args = strings(&compose_args(&layout(), &BuildOptions::default(), None));

        assert_eq!(
            args,
            vec![
                "-b",
                "html",
                "-d",
                "/book/build/doctrees",
                "-j",
                "auto",
                "-W",
                "--keep-going",
                "/book/src",
                "/book/build/html",
            ]
        );
    }

    #[test]
    fn debug_forces_serial_builds() {
        for debug in [true, false] {
            let options = BuildOptions {
                debug,
                ..Default::default()
            };
            let args = strings(&compose_args(&layout(), &options, None));

            assert_eq!(has_pair(&args, "-j", "1"), debug);
            assert_eq!(has_pair(&args, "-j", "auto"), !debug);
            assert_eq!(args.iter().any(|a| a == "-T"), debug);
        }
    }

    #[test]
    fn warnings_are_fatal_only_outside_serve() {
        for serve in [true, false] {
            let options = BuildOptions {
                serve,
                ..Default::default()
            };
            let args = strings(&compose_args(&layout(), &options, None));

            assert_eq!(args.iter().any(|a| a == "-W"), !serve);
            assert_eq!(args.iter().any(|a| a == "--keep-going"), !serve);
            assert_eq!(has_pair(&args, "--watch", "/book/exts"), serve);
            assert_eq!(has_pair(&args, "--watch", "/book/themes"), serve);
        }
    }

    #[test]
    fn commit_becomes_theme_override() {
        let options = BuildOptions::default();

        let with = strings(&compose_args(&layout(), &options, Some("abc123")));
        assert!(has_pair(&with, "-D", "html_theme_options.commit=abc123"));

        let without = strings(&compose_args(&layout(), &options, None));
        assert!(!without.iter().any(|a| a == "-D"));
    }

    #[test]
    fn clear_and_xml_combine() {
        let options = BuildOptions {
            format: OutputFormat::Xml,
            clear: true,
            ..Default::default()
        };
        let args = strings(&compose_args(&layout(), &options, None));

        assert!(has_pair(&args, "-b", "xml"));
        assert!(args.iter().any(|a| a == "-E"));
        assert_eq!(args.last().unwrap(), "/book/build/xml");
    }

    #[test]
    fn serve_uses_autobuild() {
        let serve = BuildOptions {
            serve: true,
            ..Default::default()
        };
        assert_eq!(serve.program(), "sphinx-autobuild");
        assert_eq!(BuildOptions::default().program(), "sphinx-build");
    }
}
