//! Per-profile path resolution for the Chromium-family strategy.

use std::path::{Path, PathBuf};

/// Resolves the cookie database and `Local State` paths for one
/// profile directory.
pub struct PathProvider {
    base_dir: PathBuf,
    profile_dir: PathBuf,
}

impl PathProvider {
    pub fn new(base_dir: PathBuf, profile_dir: PathBuf) -> Self {
        Self { base_dir, profile_dir }
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// The cookie database is stored under a `Network` subfolder in
    /// newer Chromium versions; older profiles keep it directly under
    /// the profile directory. Prefer the new location when present.
    pub fn cookies_database(&self) -> PathBuf {
        let new_path = self.profile_dir.join("Network").join("Cookies");
        if new_path.is_file() {
            new_path
        } else {
            self.profile_dir.join("Cookies")
        }
    }

    /// `Local State` lives at the browser's base directory, one level
    /// above any individual profile.
    pub fn local_state(&self) -> PathBuf {
        self.base_dir.join("Local State")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_legacy_cookies_path_when_network_folder_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_dir = tmp.path().join("Default");
        std::fs::create_dir_all(&profile_dir).unwrap();

        let provider = PathProvider::new(tmp.path().to_path_buf(), profile_dir.clone());
        assert_eq!(provider.cookies_database(), profile_dir.join("Cookies"));
    }

    #[test]
    fn prefers_network_subfolder_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_dir = tmp.path().join("Default");
        std::fs::create_dir_all(profile_dir.join("Network")).unwrap();
        std::fs::write(profile_dir.join("Network").join("Cookies"), b"").unwrap();

        let provider = PathProvider::new(tmp.path().to_path_buf(), profile_dir.clone());
        assert_eq!(
            provider.cookies_database(),
            profile_dir.join("Network").join("Cookies")
        );
    }
}
