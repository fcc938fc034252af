//! Subprocess plumbing for docmake.
//!
//! Every external tool (python, pip, sphinx, git, cargo, linkchecker) is run
//! through the [`Runner`] trait so the orchestration above it can be driven
//! by a scripted runner in tests.

pub mod command;
pub mod runner;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use command::{describe_code, ProcessCommand, ProcessError, ProcessOutput, ProcessStatus};
pub use runner::{Runner, SystemRunner};
#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedRunner;
