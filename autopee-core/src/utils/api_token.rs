//! Internal API tokens.
//!
//! Tokens look like `autopee_` followed by 40 base32 characters. Only the
//! hex SHA-256 of the full token is stored, so a leaked database cannot be
//! replayed against the API.

use autopee_sdk::auth::{API_TOKEN_PREFIX, API_TOKEN_RANDOM_LEN};
use rand::RngCore;

/// 25 random bytes encode to exactly 40 unpadded base32 characters.
const RANDOM_BYTES: usize = API_TOKEN_RANDOM_LEN * 5 / 8;

/// Generate a fresh plaintext token.
pub fn generate() -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let encoded = fast32::base32::RFC4648_NOPAD.encode(&bytes);
    format!("{API_TOKEN_PREFIX}{encoded}")
}

/// Hex-encoded SHA-256 of the token, the value kept in `api_tokens.token_hash`.
pub fn hash(token: &str) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, token.as_bytes());
    digest
        .as_ref()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Cheap shape check before hitting the database.
pub fn is_well_formed(token: &str) -> bool {
    token
        .strip_prefix(API_TOKEN_PREFIX)
        .is_some_and(|rest| {
            rest.len() == API_TOKEN_RANDOM_LEN
                && rest
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_is_well_formed() {
        let token = generate();
        assert!(token.starts_with(API_TOKEN_PREFIX));
        assert_eq!(token.len(), API_TOKEN_PREFIX.len() + API_TOKEN_RANDOM_LEN);
        assert!(is_well_formed(&token));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(!is_well_formed("autopee_short"));
        assert!(!is_well_formed("someone_ABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFGH"));
        assert!(!is_well_formed(
            "autopee_abcdefghijklmnopqrstuvwxyz234567abcdefgh"
        ));
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let h = hash("autopee_ABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFGH");
        assert_eq!(h.len(), 64);
        assert!(h.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(h, hash("autopee_ABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFGH"));
        assert_ne!(h, hash("autopee_ABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFGI"));
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
