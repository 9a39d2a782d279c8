//! Firefox profile and cookie database path resolution.

use std::path::{Path, PathBuf};

use crate::platform::{self, OsTag};

/// Resolves the cookie database path for one profile directory.
pub struct PathProvider {
    profile_dir: PathBuf,
}

impl PathProvider {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self { profile_dir }
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    pub fn cookies_database(&self) -> PathBuf {
        self.profile_dir.join("cookies.sqlite")
    }
}

/// Firefox's base directory — `~/Library/Application Support/Firefox`
/// on macOS, `%APPDATA%\Mozilla\Firefox` on Windows, `~/.mozilla/firefox`
/// on Linux.
pub fn base_dir() -> Option<PathBuf> {
    match platform::current_os() {
        OsTag::MacOs => Some(platform::home_dir()?.join("Library/Application Support/Firefox")),
        OsTag::Windows => Some(platform::app_data_dir()?.join("Mozilla").join("Firefox")),
        OsTag::Linux | OsTag::OtherUnix => Some(platform::home_dir()?.join(".mozilla/firefox")),
    }
}

/// Resolves the single profile `profiles.ini` names as the OS default,
/// preferring the profile named by the first `Install*` section (the
/// modern Firefox selector), falling back to the first `Profile*`
/// section with `Default=1`.
pub fn default_profile_relative_path(profiles: &tini::Ini) -> Option<String> {
    if let Some(section) = profiles
        .iter()
        .filter(|(name, _)| name.starts_with("Install"))
        .map(|(_, section)| section)
        .next()
    {
        return section.get("Default");
    }

    profiles
        .iter()
        .filter(|(name, _)| name.starts_with("Profile"))
        .filter(|(_, section)| section.get::<String>("Default").as_deref() == Some("1"))
        .map(|(_, section)| section)
        .next()
        .and_then(|section| section.get("Path"))
}

/// Resolves the default Firefox profile by parsing `profiles.ini`. Any
/// failure (missing base directory, missing file, unparseable INI, no
/// matching section) yields `None` rather than panicking — the caller
/// falls back to directory-name globbing via
/// [`crate::locate::firefox_default_like_profile_dirs`].
pub fn default_provider() -> Option<PathProvider> {
    let base_dir = base_dir()?;
    let profiles = tini::Ini::from_file(&base_dir.join("profiles.ini")).ok()?;
    let relative = default_profile_relative_path(&profiles)?;
    Some(PathProvider::new(base_dir.join(relative)))
}
