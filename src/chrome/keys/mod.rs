//! Master-key providers.
//!
//! Retrieves and caches the byte key used to decrypt Chromium
//! `encrypted_value` blobs. Retrieval is platform-gated (a Keychain
//! lookup only makes sense on macOS); the cache itself, and the scheme
//! tag used to key it, are not.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::browser::ChromeVariant;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod mac;
#[cfg(target_os = "linux")]
mod posix;
#[cfg(windows)]
mod windows;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("keychain/secret-service lookup failed: {0}")]
    Keychain(String),

    #[error("failed to derive key from password: {0}")]
    Derive(String),

    #[error("Local State unreadable or malformed: {0}")]
    LocalState(String),

    #[error("DPAPI unwrap failed: {0}")]
    Dpapi(String),

    #[error("no key provider is available for this scheme on this platform")]
    NoProvider,
}

/// Which stored key a cookie's ciphertext prefix calls for. Kept
/// separate from `browser::ChromeVariant` since it's what actually
/// determines the cache slot and the derivation path, not the browser
/// identity alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScheme {
    V10,
    V11,
}

type CacheKey = (ChromeVariant, PathBuf, KeyScheme);

static KEY_CACHE: Lazy<Mutex<HashMap<CacheKey, Vec<u8>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the master key for `(variant, profile_dir, scheme)`, fetching
/// and caching it on first use. `local_state_path` is only consulted by
/// the Windows v10 provider.
pub fn master_key(
    variant: ChromeVariant,
    profile_dir: &Path,
    local_state_path: &Path,
    scheme: KeyScheme,
) -> Result<Vec<u8>, KeyError> {
    let cache_key = (variant, profile_dir.to_path_buf(), scheme);

    if let Some(key) = KEY_CACHE.lock().expect("key cache poisoned").get(&cache_key) {
        return Ok(key.clone());
    }

    let key = fetch(variant, local_state_path, scheme)?;
    KEY_CACHE
        .lock()
        .expect("key cache poisoned")
        .insert(cache_key, key.clone());
    Ok(key)
}

#[cfg(target_os = "macos")]
fn fetch(variant: ChromeVariant, _local_state_path: &Path, scheme: KeyScheme) -> Result<Vec<u8>, KeyError> {
    match scheme {
        KeyScheme::V10 => mac::fetch_v10_key(variant),
        KeyScheme::V11 => Err(KeyError::NoProvider),
    }
}

#[cfg(target_os = "linux")]
fn fetch(variant: ChromeVariant, _local_state_path: &Path, scheme: KeyScheme) -> Result<Vec<u8>, KeyError> {
    match scheme {
        KeyScheme::V10 => Ok(posix::CHROME_V10_KEY.to_vec()),
        KeyScheme::V11 => linux::fetch_v11_key(variant),
    }
}

#[cfg(windows)]
fn fetch(_variant: ChromeVariant, local_state_path: &Path, scheme: KeyScheme) -> Result<Vec<u8>, KeyError> {
    match scheme {
        KeyScheme::V10 => windows::fetch_v10_key(local_state_path),
        KeyScheme::V11 => Err(KeyError::NoProvider),
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux", windows)))]
fn fetch(_variant: ChromeVariant, _local_state_path: &Path, _scheme: KeyScheme) -> Result<Vec<u8>, KeyError> {
    Err(KeyError::NoProvider)
}
