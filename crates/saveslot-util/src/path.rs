//! Path utilities.

use std::path::PathBuf;

/// Name of the save root when none is configured.
pub const DEFAULT_SAVE_ROOT: &str = "saves";

/// Get the saveslot data directory.
///
/// This follows XDG conventions:
/// - `$XDG_DATA_HOME/saveslot` if set
/// - `~/.local/share/saveslot` otherwise
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("saveslot"))
}

/// Per-user save root, used by the CLI when no root is given.
pub fn user_save_root() -> Option<PathBuf> {
    data_dir().map(|p| p.join(DEFAULT_SAVE_ROOT))
}

/// Check that `name` is usable as a single path component.
///
/// Rejects empty names, `.`/`..`, and anything containing a separator,
/// so joining it onto a base directory can never escape that directory.
pub fn is_safe_component(name: &str) -> bool {
    !(name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0'))
}
