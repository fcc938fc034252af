//! Link checking for rendered books.
//!
//! Fetches the rustc `linkchecker` tool through a shallow, blob-less, sparse
//! checkout of its upstream repository, builds it once with cargo, and runs
//! it against rendered HTML.

pub mod bootstrap;

pub use bootstrap::{bootstrap, check_links, CheckoutState, LinkCheckError, LinkCheckerSource};
