//! Profile locator.
//!
//! Enumerates the filesystem paths that could hold cookies for a given
//! browser, given the current user and OS. Every helper here is a pure
//! fast-path: if the top-level browser directory doesn't exist, an empty
//! list is returned without any further globbing.

use std::path::{Path, PathBuf};

pub mod chrome;
pub mod safari;

/// Chromium-family profile directory names, in discovery order.
/// `Default` first, then `Profile 1` through `Profile 10` — globbing is
/// bounded to these fixed names rather than an unbounded directory scan,
/// keeping the walk at depth 2 from `root`.
pub fn chrome_profile_names() -> Vec<String> {
    let mut names = vec!["Default".to_string()];
    names.extend((1..=10).map(|n| format!("Profile {n}")));
    names
}

/// Enumerates Chromium-family profile directories under `root` that
/// actually exist. Returns an empty vector immediately if `root` itself
/// doesn't exist.
pub fn existing_chrome_profile_dirs(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    chrome_profile_names()
        .into_iter()
        .map(|name| root.join(name))
        .filter(|dir| dir.is_dir())
        .collect()
}

/// Enumerates Firefox profile directories under `root` whose name
/// contains `default` (case-insensitive), bounded to the direct children
/// of `root` (depth 2 from the Firefox base directory).
pub fn firefox_default_like_profile_dirs(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };

    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_lowercase().contains("default"))
                .unwrap_or(false)
        })
        .collect()
}
