//! Python virtual environment provisioning.
//!
//! Keeps a virtualenv in sync with a pinned, hash-locked requirements file,
//! recreating it from scratch whenever the requirements change.

pub mod venv;

pub use venv::{bin_dir_name, EnvError, VirtualEnv, INSTALLED_MARKER};
