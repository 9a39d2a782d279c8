//! Platform adapter.
//!
//! Home-directory and well-known-directory resolution, an OS tag used by
//! the path providers to pick per-OS subtrees, and executable
//! probing used by the lock handler to decide whether a browser
//! binary is even available to relaunch.

use std::path::PathBuf;

/// Coarse OS family, used to pick between the per-OS subtrees in §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsTag {
    MacOs,
    Windows,
    Linux,
    OtherUnix,
}

pub fn current_os() -> OsTag {
    if cfg!(target_os = "macos") {
        OsTag::MacOs
    } else if cfg!(windows) {
        OsTag::Windows
    } else if cfg!(target_os = "linux") {
        OsTag::Linux
    } else {
        OsTag::OtherUnix
    }
}

/// The current user's home directory.
///
/// Returns `None` rather than panicking — callers use this to
/// fast-path an empty profile list instead of failing the whole query.
pub fn home_dir() -> Option<PathBuf> {
    dirs_next::home_dir()
}

/// `%LOCALAPPDATA%` on Windows, used for the Chromium family's default
/// user-data root.
pub fn local_app_data_dir() -> Option<PathBuf> {
    dirs_next::data_local_dir()
}

/// `%APPDATA%` on Windows, used for Firefox's default profile root.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::config_dir()
}

/// `%PROGRAMFILES%` / `%PROGRAMFILES(X86)%`, consulted only for
/// diagnostics (whether a browser is even installed) and never required
/// for a successful read.
pub fn program_files_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(p) = std::env::var("PROGRAMFILES") {
        dirs.push(PathBuf::from(p));
    }
    if let Ok(p) = std::env::var("PROGRAMFILES(X86)") {
        dirs.push(PathBuf::from(p));
    }
    dirs
}

/// Finds an executable by name on `PATH`, for the lock handler's
/// "is this browser even installed" check before attempting a relaunch.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Whether a process with an executable name matching `process_name`
/// currently appears to be running, on a best-effort basis.
///
/// This is advisory only (the lock handler's `INSPECT` state): a `false` here
/// never blocks recovery, it only skips an unnecessary close/relaunch
/// cycle when nothing is actually holding the file.
#[cfg(unix)]
pub fn process_running(process_name: &str) -> bool {
    use std::process::Command;

    Command::new("pgrep")
        .arg("-x")
        .arg(process_name)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[cfg(windows)]
pub fn process_running(process_name: &str) -> bool {
    use std::process::Command;

    let image = if process_name.ends_with(".exe") {
        process_name.to_string()
    } else {
        format!("{process_name}.exe")
    };

    Command::new("tasklist")
        .arg("/FI")
        .arg(format!("IMAGENAME eq {image}"))
        .output()
        .map(|out| {
            String::from_utf8_lossy(&out.stdout)
                .to_lowercase()
                .contains(&image.to_lowercase())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_os_is_one_of_the_known_tags() {
        matches!(
            current_os(),
            OsTag::MacOs | OsTag::Windows | OsTag::Linux | OsTag::OtherUnix
        );
    }

    #[test]
    fn find_executable_returns_none_for_nonsense_name() {
        assert!(find_executable("definitely-not-a-real-binary-xyz123").is_none());
    }
}
