//! torrc reconciliation.
//!
//! [`ConfigStore`] owns the on-disk file and its cached snapshot;
//! [`ConfigDocument`] is the line model it edits.

mod document;
mod store;

pub use document::{ConfigDocument, DirectiveKey, TorrcSnapshot};
pub use store::ConfigStore;
