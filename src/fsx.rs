//! Platform shims for file metadata.
//!
//! The archive is staged in a temporary file, which is created owner-only.
//! Before it is renamed into place its mode is widened to what a plainly
//! created file would get.

use std::io;
use std::path::Path;

#[cfg(unix)]
/// Set POSIX permission bits on Unix.
pub fn set_unix_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
/// No-op elsewhere: POSIX permission bits do not apply.
pub fn set_unix_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
