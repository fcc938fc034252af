//! Sphinx builds for docmake.
//!
//! Composes the sphinx-build flags for the selected modes, stamps the build
//! with the current git commit when one is available, and runs the builder
//! from the provisioned virtualenv.

pub mod builder;
pub mod commit;
pub mod invocation;

pub use builder::{build_docs, BuildError, DEBUG_HINT};
pub use commit::{resolve_commit, CommitLookup};
pub use invocation::{compose_args, BuildOptions, Layout, OutputFormat, COMMIT_OVERRIDE};
