//! macOS v10 key retrieval: login Keychain + PBKDF2.

use keyring::credential::{MacCredential, MacKeychainDomain, PlatformCredential};
use keyring::Entry;
use pbkdf2::password_hash::{PasswordHasher, SaltString};
use pbkdf2::{Algorithm, Params, Pbkdf2};

use crate::browser::ChromeVariant;

use super::KeyError;

const SYMMETRIC_SALT: &[u8] = b"saltysalt";
const HASH_ROUNDS: u32 = 1003;
const DERIVED_KEY_LENGTH: usize = 16;

fn password(variant: ChromeVariant) -> Result<String, KeyError> {
    let credential = PlatformCredential::Mac(MacCredential {
        service: variant.safe_storage_service().to_string(),
        account: variant.safe_storage_account().to_string(),
        domain: MacKeychainDomain::User,
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

pub fn fetch_v10_key(variant: ChromeVariant) -> Result<Vec<u8>, KeyError> {
    let password = password(variant)?;
    derive_key_from_password(&password)
}
