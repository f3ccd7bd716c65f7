//! Header names and token formats used by every Autopee API surface.
//!
//! ```text
//! Authorization: Bearer {firebase_id_token | autopee_xxx}
//! Authorization: Apikey {sepay_api_key}
//! Autopee-Admin-Authorization: {admin_secret}
//! ```

/// Header name for admin API authentication (plaintext secret).
pub const ADMIN_AUTH_HEADER: &str = "Autopee-Admin-Authorization";

/// Scheme used in the `Authorization` header by user-facing endpoints.
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme SePay uses in the `Authorization` header of webhook deliveries.
pub const SEPAY_APIKEY_SCHEME: &str = "Apikey";

/// Prefix of every internally issued API token.
pub const API_TOKEN_PREFIX: &str = "autopee_";

/// Number of random characters following [`API_TOKEN_PREFIX`].
pub const API_TOKEN_RANDOM_LEN: usize = 40;

/// Kind of credential carried by a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerKind {
    /// An internal `autopee_` API token.
    ApiToken,
    /// Anything else is treated as a Firebase ID token.
    FirebaseIdToken,
}

impl BearerKind {
    pub fn of(token: &str) -> Self {
        if token.starts_with(API_TOKEN_PREFIX) {
            BearerKind::ApiToken
        } else {
            BearerKind::FirebaseIdToken
        }
    }
}

/// Split an `Authorization` header value into its credential for `scheme`.
///
/// The scheme comparison is case-insensitive, the credential must be
/// non-empty.
pub fn strip_scheme<'a>(header_value: &'a str, scheme: &str) -> Option<&'a str> {
    let (given, credential) = header_value.trim().split_once(' ')?;
    if !given.eq_ignore_ascii_case(scheme) {
        return None;
    }
    let credential = credential.trim();
    (!credential.is_empty()).then_some(credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_kind() {
        assert_eq!(
            BearerKind::of("autopee_ABCDEFGHIJKLMNOPQRSTUVWXYZ234567ABCDEFGH"),
            BearerKind::ApiToken
        );
        assert_eq!(
            BearerKind::of("eyJhbGciOiJSUzI1NiJ9.e30.sig"),
            BearerKind::FirebaseIdToken
        );
    }

    #[test]
    fn test_strip_scheme() {
        assert_eq!(strip_scheme("Bearer abc", BEARER_SCHEME), Some("abc"));
        assert_eq!(strip_scheme("bearer   abc ", BEARER_SCHEME), Some("abc"));
        assert_eq!(strip_scheme("Apikey k-1", SEPAY_APIKEY_SCHEME), Some("k-1"));
        assert_eq!(strip_scheme("Basic abc", BEARER_SCHEME), None);
        assert_eq!(strip_scheme("Bearer", BEARER_SCHEME), None);
        assert_eq!(strip_scheme("Bearer  ", BEARER_SCHEME), None);
    }
}
