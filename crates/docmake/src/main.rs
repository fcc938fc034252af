//! docmake CLI - build Sphinx books in a managed virtualenv.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use tracing_subscriber::{fmt, EnvFilter};

use docmake_process::SystemRunner;
use docmake_sphinx::{BuildOptions, OutputFormat};

mod config;
mod pipeline;

use pipeline::{FailureReport, MakeOptions};

#[derive(Parser, Debug)]
#[command(name = "docmake")]
#[command(about = "Build a Sphinx book, provisioning its Python environment on demand")]
#[command(version)]
#[command(group(
    ArgGroup::new("mode")
        .args(["serve", "check_links", "xml", "debug"])
        .multiple(false)
))]
pub struct Cli {
    /// Disable incremental builds
    #[arg(short, long)]
    clear: bool,

    /// Start a local server with live reload
    #[arg(short, long)]
    serve: bool,

    /// Check whether all links are valid
    #[arg(long)]
    check_links: bool,

    /// Generate Sphinx XML rather than HTML
    #[arg(long)]
    xml: bool,

    /// Debug mode for the extensions, showing exceptions
    #[arg(long)]
    debug: bool,

    /// Root directory of the book
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Path to the config file, relative to the root
    #[arg(long, default_value = "docmake.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn make_options(&self) -> MakeOptions {
        MakeOptions {
            build: BuildOptions {
                format: if self.xml {
                    OutputFormat::Xml
                } else {
                    OutputFormat::Html
                },
                clear: self.clear,
                serve: self.serve,
                debug: self.debug,
            },
            check_links: self.check_links,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => FailureReport::new(&err).emit(),
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = config::load_config(&cli.root.join(&cli.config))?;
    pipeline::run(&SystemRunner::new(), &cli.root, &config, &cli.make_options()).await
}
