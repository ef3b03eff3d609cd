//! Shared utility functions.
//!
//! - `fs`: atomic whole-file replacement
//! - `privilege`: `sudo` prefixing for commands that need root

mod fs;
mod privilege;

pub use fs::{replace_file, replace_file_with_mode};
pub use privilege::{is_root, privileged_command};
