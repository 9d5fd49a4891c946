//! Startup lookup of the assistant CLI binary.
//!
//! Resolving the executable up front turns a missing or non-executable CLI
//! into a clear startup error instead of a spawn failure on the first prompt.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Resolves `executable` to a runnable file, searching `PATH` for bare names.
///
/// Relative paths such as `bin/claude` are anchored to the current directory,
/// so the returned path stays valid when the CLI is spawned from another cwd.
pub fn resolve_executable(executable: &str) -> Option<PathBuf> {
    let base_dir = std::env::current_dir().ok()?;
    resolve_executable_in(executable, std::env::var_os("PATH").as_deref(), &base_dir)
}

fn resolve_executable_in(
    executable: &str,
    search_path: Option<&OsStr>,
    base_dir: &Path,
) -> Option<PathBuf> {
    let trimmed = executable.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = Path::new(trimmed);
    if candidate.is_absolute() {
        return is_executable_file(candidate).then(|| candidate.to_path_buf());
    }
    if trimmed.contains(std::path::MAIN_SEPARATOR) {
        let anchored = base_dir.join(candidate);
        return is_executable_file(&anchored).then_some(anchored);
    }

    std::env::split_paths(search_path?)
        .map(|dir| dir.join(trimmed))
        .find(|path| is_executable_file(path))
}
