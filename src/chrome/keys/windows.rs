//! Windows v10 key retrieval: `Local State` JSON + DPAPI unwrap.

use std::path::Path;

use base64ct::{Base64, Encoding};
use windows::Win32::Foundation::{LocalFree, HLOCAL};
use windows::Win32::Security::Cryptography::{CryptUnprotectData, CRYPT_INTEGER_BLOB};

use super::KeyError;

const DPAPI_PREFIX: &[u8] = b"DPAPI";

/// Decrypts a buffer wrapped with the current user's DPAPI master key.
///
/// # Safety
/// `CryptUnprotectData` is an FFI call; `encrypted_value` must stay valid
/// for the call's duration, which the borrow checker already guarantees.
fn decrypt_dpapi(encrypted_value: &mut [u8]) -> Result<Vec<u8>, KeyError> {
    let data_in = CRYPT_INTEGER_BLOB {
        cbData: u32::try_from(encrypted_value.len())
            .map_err(|e| KeyError::Dpapi(e.to_string()))?,
        pbData: encrypted_value.as_mut_ptr(),
    };

    let mut data_out = CRYPT_INTEGER_BLOB::default();

    unsafe {
        CryptUnprotectData(&data_in, None, None, None, None, 0, &mut data_out)
            .map_err(|e| KeyError::Dpapi(e.to_string()))?;

        if data_out.pbData.is_null() {
            return Err(KeyError::Dpapi("CryptUnprotectData returned a null buffer".into()));
        }

        let data = std::slice::from_raw_parts(data_out.pbData, data_out.cbData as usize).to_vec();
        LocalFree(HLOCAL(data_out.pbData.cast()));

        Ok(data)
    }
}

fn encrypted_key_from_local_state(local_state_path: &Path) -> Result<String, KeyError> {
    let contents = std::fs::read_to_string(local_state_path)
        .map_err(|e| KeyError::LocalState(e.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(&contents).map_err(|e| KeyError::LocalState(e.to_string()))?;

    value
        .get("os_crypt")
        .and_then(|v| v.get("encrypted_key"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| KeyError::LocalState("os_crypt.encrypted_key missing".into()))
}

pub fn fetch_v10_key(local_state_path: &Path) -> Result<Vec<u8>, KeyError> {
    let encoded = encrypted_key_from_local_state(local_state_path)?;
    let mut encrypted_key =
        Base64::decode_vec(&encoded).map_err(|e| KeyError::Dpapi(e.to_string()))?;

    if !encrypted_key.starts_with(DPAPI_PREFIX) {
        return Err(KeyError::Dpapi("encrypted key missing DPAPI prefix".into()));
    }

    let stripped = &mut encrypted_key[DPAPI_PREFIX.len()..];
    decrypt_dpapi(stripped)
}
