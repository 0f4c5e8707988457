//! Bundlesnap library — pull a site's framework build bundles into a ZIP.
//!
//! The pipeline has three cooperating parts: the *detector* classifies the
//! page's front-end framework from a snapshot, the *collector* gathers and
//! sequentially downloads bundle asset paths, and the *packager* turns the
//! downloaded map into a single ZIP payload. They communicate through the
//! agent layer in [`agent`].

pub mod agent;
pub mod archive;
pub mod cli;
pub mod collect;
pub mod detect;
pub mod error;
pub mod http;
pub mod progress;
pub mod snapshot;
