//! Admin dashboard credentials.

use argon2::password_hash::{self, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// The argon2 PHC string of the secret sent in `Autopee-Admin-Authorization`.
///
/// The string is parsed once on construction; a corrupt hash in the config
/// file is a load error rather than a dashboard that rejects every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    secret_hash: String,
}

impl AdminConfig {
    pub fn from_hash(secret_hash: String) -> Result<Self, password_hash::Error> {
        PasswordHash::new(&secret_hash)?;
        Ok(Self { secret_hash })
    }

    /// Hash a plaintext secret with a fresh salt.
    pub fn hash_secret(plaintext: &str) -> Result<String, password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(plaintext.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    pub fn secret_hash(&self) -> &str {
        &self.secret_hash
    }

    /// Whether `presented` is the admin secret.
    pub fn accepts(&self, presented: &str) -> bool {
        if presented.is_empty() {
            return false;
        }
        PasswordHash::new(&self.secret_hash)
            .and_then(|hash| Argon2::default().verify_password(presented.as_bytes(), &hash))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_only_the_hashed_secret() {
        let hash = AdminConfig::hash_secret("reconcile-me").unwrap();
        let admin = AdminConfig::from_hash(hash).unwrap();

        assert!(admin.accepts("reconcile-me"));
        assert!(!admin.accepts("reconcile-you"));
        assert!(!admin.accepts(""));
    }

    #[test]
    fn test_fresh_salt_per_hash() {
        let a = AdminConfig::hash_secret("same").unwrap();
        let b = AdminConfig::hash_secret("same").unwrap();
        assert_ne!(a, b);
        assert!(AdminConfig::from_hash(b).unwrap().accepts("same"));
    }

    #[test]
    fn test_corrupt_hash_is_refused() {
        assert!(AdminConfig::from_hash("not-a-phc-string".to_string()).is_err());
        assert!(AdminConfig::from_hash(String::new()).is_err());
    }
}
