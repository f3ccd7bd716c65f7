use url::Url;

/// Firebase Authentication settings used to verify ID tokens.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    /// JWKS endpoint publishing the token signing keys.
    pub jwks_url: Url,
}

impl FirebaseConfig {
    /// Value the `iss` claim must carry.
    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }
}
