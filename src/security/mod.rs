pub mod auth;
pub mod csrf;

use rand::RngCore;

/// Number of random bytes behind every session and CSRF token.
pub const TOKEN_BYTES: usize = 32;

/// A fresh random token, hex encoded (64 characters, 256 bits).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Byte equality whose running time depends only on the lengths, never on
/// where the inputs first differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
