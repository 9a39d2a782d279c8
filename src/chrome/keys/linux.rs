//! Linux v11 key retrieval: Secret Service + PBKDF2.

use std::collections::HashMap;

use keyring::credential::{LinuxCredential, PlatformCredential};
use keyring::Entry;
use pbkdf2::password_hash::{PasswordHasher, SaltString};
use pbkdf2::{Algorithm, Params, Pbkdf2};

use crate::browser::ChromeVariant;

use super::{posix, KeyError};

const SYMMETRIC_SALT: &[u8] = b"saltysalt";
const HASH_ROUNDS: u32 = 1;
const DERIVED_KEY_LENGTH: usize = 16;

fn password(variant: ChromeVariant) -> Result<String, KeyError> {
    let credential = PlatformCredential::Linux(LinuxCredential {
        collection: String::from("default"),
        attributes: HashMap::from([(
            String::from("application"),
            variant.linux_application_attribute().to_string(),
        )]),
        label: String::new(),
    });

    let entry = Entry::new_with_credential(&credential)
        .map_err(|e| KeyError::Keychain(e.to_string()))?;

    entry.get_password().map_err(|e| KeyError::Keychain(e.to_string()))
}

fn derive_key_from_password(password: &str) -> Result<Vec<u8>, KeyError> {
    let salt = SaltString::encode_b64(SYMMETRIC_SALT).map_err(|e| KeyError::Derive(e.to_string()))?;

    let key = Pbkdf2
        .hash_password_customized(
            password.as_bytes(),
            Some(Algorithm::Pbkdf2Sha1.ident()),
            None,
            Params {
                rounds: HASH_ROUNDS,
                output_length: DERIVED_KEY_LENGTH,
            },
            &salt,
        )
        .map_err(|e| KeyError::Derive(e.to_string()))?;

    Ok(key.hash.ok_or_else(|| KeyError::Derive("empty hash output".into()))?.as_bytes().to_vec())
}

/// Attempts the Secret Service schema lookup first; if libsecret is
/// unavailable or the schema isn't registered, falls back to the same
/// documented constant `"peanuts"` password the v10 scheme uses.
///
/// This fallback predates recent Chromium changes and is not guaranteed
/// to succeed against every store — the caller treats any `Err` here
/// exactly like a v10 `KeyUnavailable` and degrades the cookie value to
/// opaque bytes rather than propagating (spec.md §7, §9).
pub fn fetch_v11_key(variant: ChromeVariant) -> Result<Vec<u8>, KeyError> {
    match password(variant) {
        Ok(password) => derive_key_from_password(&password),
        Err(err) => {
            tracing::warn!(%err, browser = %variant, "libsecret unavailable, falling back to the constant v10 password");
            Ok(posix::CHROME_V10_KEY.to_vec())
        }
    }
}
