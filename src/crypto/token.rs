use rand::{rngs::OsRng, RngCore};

/// Entropy of a session token in bytes
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Generate an opaque session token: 32 random bytes, URL-safe base64 without padding
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    base64_simd::URL_SAFE_NO_PAD.encode_to_string(&bytes)
}
