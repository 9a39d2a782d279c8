//! The cookie-value decryptor.
//!
//! Classification takes an explicit [`OsTag`] rather than being
//! `#[cfg(target_os)]`-gated: the `v10` prefix means AES-128-CBC on
//! macOS/Linux but AES-256-GCM on Windows, and both primitives are
//! compiled in on every target so the classification logic (and its
//! tests) run the same way regardless of host.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit};
use thiserror::Error;

use crate::platform::OsTag;

use super::keys::KeyScheme;

const HEADER_LEN: usize = 3;
const CBC_IV: [u8; 16] = [b' '; 16];
const GCM_NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("ciphertext too short for its scheme")]
    InvalidInputLength,

    #[error("decryption failed (wrong key, bad padding, or GCM tag mismatch)")]
    InvalidInput,

    #[error("decrypted bytes are not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Cbc128FixedIv,
    Gcm256,
}

/// What a raw `encrypted_value` blob needs: nothing (legacy plaintext
/// row), or a specific key scheme plus decrypt scheme pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Plaintext,
    Encrypted { key_scheme: KeyScheme, scheme: Scheme },
}

/// Classifies `value` by its three-byte prefix and the host OS the
/// bytes were read on (§4.5's table is keyed on both).
pub fn classify(value: &[u8], os: OsTag) -> Classification {
    match (value.get(..HEADER_LEN), os) {
        (Some(b"v10"), OsTag::Windows) => Classification::Encrypted {
            key_scheme: KeyScheme::V10,
            scheme: Scheme::Gcm256,
        },
        (Some(b"v10"), _) => Classification::Encrypted {
            key_scheme: KeyScheme::V10,
            scheme: Scheme::Cbc128FixedIv,
        },
        (Some(b"v11"), _) => Classification::Encrypted {
            key_scheme: KeyScheme::V11,
            scheme: Scheme::Cbc128FixedIv,
        },
        _ => Classification::Plaintext,
    }
}

/// Strips the scheme prefix, if any, from a classified ciphertext.
pub fn strip_header(value: &[u8], classification: Classification) -> &[u8] {
    match classification {
        Classification::Plaintext => value,
        Classification::Encrypted { .. } => value.get(HEADER_LEN..).unwrap_or(&[]),
    }
}

/// Decrypts `ciphertext` (header already stripped) with `key` under
/// `scheme`, returning the raw plaintext bytes.
pub fn decrypt(ciphertext: &[u8], key: &[u8], scheme: Scheme) -> Result<Vec<u8>, DecryptError> {
    match scheme {
        Scheme::Cbc128FixedIv => decrypt_cbc(ciphertext, key),
        Scheme::Gcm256 => decrypt_gcm(ciphertext, key),
    }
}

fn decrypt_cbc(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, DecryptError> {
    type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

    if key.len() != 16 || ciphertext.is_empty() {
        return Err(DecryptError::InvalidInputLength);
    }

    let mut buffer = vec![0u8; ciphertext.len()];
    let plaintext = Aes128CbcDec::new(key.into(), &CBC_IV.into())
        .decrypt_padded_b2b_mut::<Pkcs7>(ciphertext, &mut buffer)
        .map_err(|_| DecryptError::InvalidInputLength)?;

    Ok(plaintext.to_vec())
}

fn decrypt_gcm(ciphertext: &[u8], key: &[u8]) -> Result<Vec<u8>, DecryptError> {
    if key.len() != 32 || ciphertext.len() <= GCM_NONCE_LEN {
        return Err(DecryptError::InvalidInputLength);
    }

    let cipher = Aes256Gcm::new(key.into());
    let (nonce, sealed) = ciphertext.split_at(GCM_NONCE_LEN);

    cipher
        .decrypt(nonce.into(), sealed)
        .map_err(|_| DecryptError::InvalidInput)
}

/// Decrypts a raw `encrypted_value` blob end to end, given a key
/// looked up by the caller for the classification's `key_scheme`.
pub fn decrypt_value(raw: &[u8], key: &[u8], os: OsTag) -> Result<String, DecryptError> {
    let classification = classify(raw, os);
    match classification {
        Classification::Plaintext => Ok(String::from_utf8(raw.to_vec())?),
        Classification::Encrypted { scheme, .. } => {
            let ciphertext = strip_header(raw, classification);
            let plaintext = decrypt(ciphertext, key, scheme)?;
            Ok(String::from_utf8(plaintext)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_v10_as_cbc_on_mac_and_linux() {
        assert_eq!(
            classify(b"v10...", OsTag::MacOs),
            Classification::Encrypted {
                key_scheme: KeyScheme::V10,
                scheme: Scheme::Cbc128FixedIv
            }
        );
        assert_eq!(
            classify(b"v10...", OsTag::Linux),
            Classification::Encrypted {
                key_scheme: KeyScheme::V10,
                scheme: Scheme::Cbc128FixedIv
            }
        );
    }

    #[test]
    fn classifies_v10_as_gcm_on_windows() {
        assert_eq!(
            classify(b"v10...", OsTag::Windows),
            Classification::Encrypted {
                key_scheme: KeyScheme::V10,
                scheme: Scheme::Gcm256
            }
        );
    }

    #[test]
    fn classifies_v11_as_cbc_regardless_of_os() {
        assert_eq!(
            classify(b"v11...", OsTag::Linux),
            Classification::Encrypted {
                key_scheme: KeyScheme::V11,
                scheme: Scheme::Cbc128FixedIv
            }
        );
    }

    #[test]
    fn unrecognised_prefix_is_plaintext() {
        assert_eq!(classify(b"raw-value", OsTag::Linux), Classification::Plaintext);
    }

    #[test]
    fn round_trips_cbc_with_fixed_iv() {
        use aes::cipher::BlockEncryptMut;

        type Enc = cbc::Encryptor<aes::Aes128>;
        let key = [7u8; 16];
        let plaintext = b"hello cookie";
        let mut buffer = vec![0u8; plaintext.len() + 16];
        let encrypted = Enc::new(&key.into(), &CBC_IV.into())
            .encrypt_padded_b2b_mut::<Pkcs7>(plaintext, &mut buffer)
            .unwrap();

        let decrypted = decrypt(encrypted, &key, Scheme::Cbc128FixedIv).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn gcm_rejects_truncated_ciphertext() {
        let key = [1u8; 32];
        let result = decrypt(&[0u8; 4], &key, Scheme::Gcm256);
        assert!(matches!(result, Err(DecryptError::InvalidInputLength)));
    }
}
