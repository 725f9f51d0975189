//! Path utilities for shell-like path expansion.

use std::path::PathBuf;

/// Expands shell-like paths (tilde) to absolute paths.
///
/// - Absolute (starts with `/`): returned as-is
/// - Home-relative (starts with `~`): expanded to the user's home directory
/// - Relative: returned as-is
///
/// Surrounding whitespace is trimmed; an empty input yields an empty path.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}
