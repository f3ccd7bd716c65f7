//! Payment code generation.
//!
//! A payment code is what the user types into the bank transfer memo. It is
//! upper-case alphanumeric so banks do not mangle it, and long enough that
//! the whitespace-token matching strategy picks it up.

use crate::matcher::FUZZY_PREFIX_LEN;
use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of random characters after the prefix.
pub const RANDOM_LEN: usize = 12;

/// Random characters that must fall inside the fuzzy-prefix window, so a
/// memo carrying only the shared prefix never matches someone's request.
pub const MIN_RANDOM_IN_FUZZY_WINDOW: usize = 4;

/// Longest accepted prefix.
pub const MAX_PREFIX_LEN: usize = FUZZY_PREFIX_LEN - MIN_RANDOM_IN_FUZZY_WINDOW;

/// Generate `{prefix}{12 random characters}`.
///
/// Visually ambiguous characters (`0`, `O`, `1`, `I`) are excluded.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::rng();
    let mut code = String::with_capacity(prefix.len() + RANDOM_LEN);
    code.push_str(prefix);
    for _ in 0..RANDOM_LEN {
        let idx = rng.random_range(0..ALPHABET.len());
        code.push(ALPHABET[idx] as char);
    }
    code
}

/// A prefix must be short, upper-case ASCII alphanumeric.
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.len() <= MAX_PREFIX_LEN
        && prefix
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
