//! Firebase ID token verification.
//!
//! ID tokens are RS256 JWTs signed with one of Google's rotating keys. The
//! key set is fetched from the configured JWKS endpoint and cached for the
//! `max-age` the endpoint advertises; an unknown `kid` forces a refresh.

use autopee_core::config::FirebaseConfig;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

/// Clock skew tolerated on `exp` and `iat`.
const LEEWAY_SECS: u64 = 60;

/// Used when the JWKS response carries no usable `Cache-Control`.
const DEFAULT_KEYS_TTL: Duration = Duration::from_secs(3600);

/// Minimum gap between refreshes triggered by unknown key ids.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FirebaseError {
    #[error("malformed token: {0}")]
    Malformed(jsonwebtoken::errors::Error),

    #[error("unsupported signing algorithm {0:?}")]
    UnsupportedAlgorithm(Algorithm),

    #[error("token header has no key id")]
    MissingKeyId,

    #[error("unknown signing key {0}")]
    UnknownKey(String),

    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("token issued in the future")]
    IssuedInFuture,

    #[error("token subject is empty")]
    EmptySubject,

    #[error("failed to fetch signing keys: {0}")]
    Fetch(#[from] reqwest::Error),
}

impl FirebaseError {
    /// Whether the failure is ours (key endpoint unreachable) rather than the
    /// token's.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FirebaseError::Fetch(_))
    }
}

/// The verified identity carried by an ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseIdentity {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    iat: i64,
    #[serde(default)]
    email: Option<String>,
}

struct CachedKeys {
    source: Url,
    keys: JwkSet,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedKeys {
    fn is_fresh(&self, source: &Url) -> bool {
        &self.source == source && self.fetched_at.elapsed() < self.ttl
    }
}

pub struct FirebaseVerifier {
    http: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            cache: RwLock::new(None),
        }
    }

    /// Verify an ID token against the project in `config`.
    pub async fn verify(
        &self,
        token: &str,
        config: &FirebaseConfig,
    ) -> Result<FirebaseIdentity, FirebaseError> {
        let header = decode_header(token).map_err(FirebaseError::Malformed)?;
        if header.alg != Algorithm::RS256 {
            return Err(FirebaseError::UnsupportedAlgorithm(header.alg));
        }
        let kid = header.kid.ok_or(FirebaseError::MissingKeyId)?;
        let key = self.decoding_key(&kid, &config.jwks_url).await?;

        let claims = decode::<IdTokenClaims>(token, &key, &validation(config))
            .map_err(FirebaseError::Invalid)?
            .claims;
        check_claims(&claims, time::OffsetDateTime::now_utc().unix_timestamp())?;

        Ok(FirebaseIdentity {
            uid: claims.sub,
            email: claims.email,
        })
    }

    async fn decoding_key(&self, kid: &str, source: &Url) -> Result<DecodingKey, FirebaseError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(source)) {
                if let Some(jwk) = cached.keys.find(kid) {
                    return DecodingKey::from_jwk(jwk).map_err(FirebaseError::Invalid);
                }
                if cached.fetched_at.elapsed() < MIN_REFRESH_INTERVAL {
                    return Err(FirebaseError::UnknownKey(kid.to_string()));
                }
            }
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        let refreshed_elsewhere = cache
            .as_ref()
            .is_some_and(|c| c.is_fresh(source) && c.keys.find(kid).is_some());
        if !refreshed_elsewhere {
            *cache = Some(self.fetch_keys(source).await?);
        }

        let jwk = cache
            .as_ref()
            .and_then(|c| c.keys.find(kid))
            .ok_or_else(|| FirebaseError::UnknownKey(kid.to_string()))?;
        DecodingKey::from_jwk(jwk).map_err(FirebaseError::Invalid)
    }

    async fn fetch_keys(&self, source: &Url) -> Result<CachedKeys, FirebaseError> {
        tracing::info!(url = %source, "Fetching Firebase signing keys");
        let response = self
            .http
            .get(source.clone())
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_KEYS_TTL);
        let keys: JwkSet = response.json().await?;
        tracing::debug!(count = keys.keys.len(), ttl_secs = ttl.as_secs(), "Signing keys cached");

        Ok(CachedKeys {
            source: source.clone(),
            keys,
            fetched_at: Instant::now(),
            ttl,
        })
    }
}

fn validation(config: &FirebaseConfig) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = LEEWAY_SECS;
    validation.set_audience(&[config.project_id.as_str()]);
    validation.set_issuer(&[config.issuer()]);
    validation.set_required_spec_claims(&["exp", "iat", "sub", "aud", "iss"]);
    validation
}

fn check_claims(claims: &IdTokenClaims, now: i64) -> Result<(), FirebaseError> {
    if claims.iat > now + LEEWAY_SECS as i64 {
        return Err(FirebaseError::IssuedInFuture);
    }
    if claims.sub.trim().is_empty() {
        return Err(FirebaseError::EmptySubject);
    }
    Ok(())
}

/// Extract `max-age` from a `Cache-Control` header value.
fn parse_max_age(value: &str) -> Option<Duration> {
    value.split(',').find_map(|directive| {
        let (name, secs) = directive.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn config() -> FirebaseConfig {
        FirebaseConfig {
            project_id: "autopee-dev".to_string(),
            // Never contacted: every token below is rejected before key lookup.
            jwks_url: Url::parse("http://127.0.0.1:9/jwks").unwrap(),
        }
    }

    #[test]
    fn test_parse_max_age() {
        assert_eq!(
            parse_max_age("public, max-age=19930, must-revalidate, no-transform"),
            Some(Duration::from_secs(19930))
        );
        assert_eq!(parse_max_age("no-store"), None);
        assert_eq!(parse_max_age("max-age=abc"), None);
    }

    #[test]
    fn test_claims_checks() {
        let now = 1_700_000_000;
        let ok = IdTokenClaims {
            sub: "uid-alice".to_string(),
            iat: now - 10,
            email: None,
        };
        assert!(check_claims(&ok, now).is_ok());

        let future = IdTokenClaims {
            sub: "uid-alice".to_string(),
            iat: now + 3600,
            email: None,
        };
        assert!(matches!(
            check_claims(&future, now),
            Err(FirebaseError::IssuedInFuture)
        ));

        let anonymous = IdTokenClaims {
            sub: "  ".to_string(),
            iat: now,
            email: None,
        };
        assert!(matches!(
            check_claims(&anonymous, now),
            Err(FirebaseError::EmptySubject)
        ));
    }

    #[test]
    fn test_validation_pins_project() {
        let validation = validation(&config());
        assert_eq!(validation.algorithms, vec![Algorithm::RS256]);
        assert!(
            validation
                .aud
                .as_ref()
                .is_some_and(|aud| aud.contains("autopee-dev"))
        );
        assert!(
            validation
                .iss
                .as_ref()
                .is_some_and(|iss| iss.contains("https://securetoken.google.com/autopee-dev"))
        );
    }

    #[tokio::test]
    async fn test_rejects_malformed_token() {
        let verifier = FirebaseVerifier::new(reqwest::Client::new());
        let result = verifier.verify("not-a-jwt", &config()).await;
        assert!(matches!(result, Err(FirebaseError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_rejects_symmetric_token() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "uid-alice", "iat": 0, "exp": 4_000_000_000_i64 }),
            &EncodingKey::from_secret(b"guessable"),
        )
        .unwrap();

        let verifier = FirebaseVerifier::new(reqwest::Client::new());
        let result = verifier.verify(&token, &config()).await;
        assert!(matches!(
            result,
            Err(FirebaseError::UnsupportedAlgorithm(Algorithm::HS256))
        ));
    }

    #[tokio::test]
    async fn test_rejects_token_without_kid() {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = None;
        // Unsigned token with an RS256 header; rejected before the signature matters.
        let header_b64 =
            fast32::base64::RFC4648_URL_NOPAD.encode(&serde_json::to_vec(&header).unwrap());
        let token = format!("{header_b64}.e30.c2ln");

        let verifier = FirebaseVerifier::new(reqwest::Client::new());
        let result = verifier.verify(&token, &config()).await;
        assert!(matches!(result, Err(FirebaseError::MissingKeyId)));
    }
}
