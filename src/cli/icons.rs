//! Styled status markers for CLI output.

use console::{style, StyledObject};

/// Green ✓.
pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

/// Yellow !.
pub fn warn() -> StyledObject<&'static str> {
    style("!").yellow()
}

/// Red ✗.
pub fn error() -> StyledObject<&'static str> {
    style("✗").red()
}

/// Dim arrow for secondary lines.
pub fn dim_arrow() -> StyledObject<&'static str> {
    style("→").dim()
}
