//! Kasa "autokey" XOR cipher and TCP framing.
//!
//! Every byte is XORed with the previous ciphertext byte, starting from a
//! fixed key. Over TCP each message is prefixed with its length as a 32-bit
//! big-endian integer.

const INITIAL_KEY: u8 = 171;

/// Encrypt a plaintext payload.
#[must_use]
pub fn encrypt(plain: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    plain
        .iter()
        .map(|byte| {
            key ^= byte;
            key
        })
        .collect()
}

/// Decrypt a ciphertext payload.
#[must_use]
pub fn decrypt(cipher: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    cipher
        .iter()
        .map(|&byte| {
            let plain = key ^ byte;
            key = byte;
            plain
        })
        .collect()
}

/// Encrypt `plain` and prepend the length header.
///
/// Returns `None` if the payload does not fit a 32-bit length.
#[must_use]
pub fn frame(plain: &[u8]) -> Option<Vec<u8>> {
    let len = u32::try_from(plain.len()).ok()?;
    let mut out = Vec::with_capacity(plain.len() + 4);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend(encrypt(plain));
    Some(out)
}
