//! The Linux v10 fallback key.
//!
//! Pre-derived from Chromium's documented constant password `"peanuts"`
//! (PBKDF2-HMAC-SHA1, salt `"saltysalt"`, 1 iteration, 16 bytes) so it
//! doesn't need to be recomputed on every decrypt.

pub const CHROME_V10_KEY: [u8; 16] = [
    253, 98, 31, 229, 162, 180, 2, 83, 157, 250, 20, 124, 169, 39, 39, 120,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrome::decrypt::{decrypt, Scheme};

    #[test]
    fn decrypts_a_known_v10_sample() {
        const ENCRYPTED: &[u8] = &[
            0xe9, 0xbf, 0x20, 0xc4, 0xcf, 0xaa, 0xa2, 0xfa, 0x8d, 0xf3, 0x3a, 0x42, 0x60, 0x42,
            0x4e, 0x5b,
        ];
        let value = decrypt(ENCRYPTED, &CHROME_V10_KEY, Scheme::Cbc128FixedIv).unwrap();
        assert_eq!(value, b"PENDING+400");
    }
}
