//! Safari's single, fixed container path.

use std::path::PathBuf;

use crate::platform;

/// Candidate paths to `Cookies.binarycookies`, tried in order. Safari is
/// macOS-only and has no "profiles" — just this one container, with a
/// sandboxed fallback location used on newer macOS releases.
pub fn candidate_paths() -> Vec<PathBuf> {
    let Some(home) = platform::home_dir() else {
        return Vec::new();
    };

    vec![
        home.join("Library/Cookies/Cookies.binarycookies"),
        home.join(
            "Library/Containers/com.apple.Safari/Data/Library/Cookies/Cookies.binarycookies",
        ),
    ]
}

/// The first candidate path that actually exists, if any.
pub fn resolve() -> Option<PathBuf> {
    candidate_paths().into_iter().find(|p| p.is_file())
}
