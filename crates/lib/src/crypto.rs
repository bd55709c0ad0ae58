//! Pluggable collaborators: credential hashing and opaque token generation.
//!
//! The stores consume these behind traits and only ever handle the
//! resulting strings; the algorithms themselves are swappable. Defaults are
//! provided: Argon2id password hashing (PHC string format) and random
//! alphanumeric security stamps and token values.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core,
    },
};
use rand::{Rng, distributions::Alphanumeric};
use thiserror::Error;

use crate::Result;

/// Length of generated security stamps and token values.
const TOKEN_LENGTH: usize = 32;

/// Errors from the credential-hashing collaborator.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Password hashing failed.
    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },

    /// A stored password hash could not be parsed.
    #[error("Stored password hash is malformed")]
    MalformedHash,
}

// Conversion from CryptoError to the main Error type
impl From<CryptoError> for crate::Error {
    fn from(err: CryptoError) -> Self {
        crate::Error::Crypto(err)
    }
}

/// Credential-hashing collaborator.
///
/// The core stores and compares the resulting strings; what they contain is
/// opaque to it.
pub trait CredentialHasher: Send + Sync {
    /// Hashes a plaintext password into a storable string.
    fn hash(&self, password: &str) -> Result<String>;

    /// Verifies a plaintext password against a stored hash.
    ///
    /// # Returns
    /// `Ok(false)` when the password simply does not match; an error only
    /// when the stored hash itself is unusable.
    fn verify(&self, hash: &str, password: &str) -> Result<bool>;
}

/// Default hasher using Argon2id with a random per-password salt.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand_core::OsRng);

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CryptoError::HashingFailed {
                reason: e.to_string(),
            })?
            .to_string();

        Ok(hash)
    }

    fn verify(&self, hash: &str, password: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|_| CryptoError::MalformedHash)?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(CryptoError::MalformedHash.into()),
        }
    }
}

/// Token-generation collaborator producing opaque security-stamp and token
/// values.
pub trait TokenSource: Send + Sync {
    /// A fresh security stamp, changed whenever credentials change.
    fn security_stamp(&self) -> String;

    /// A fresh opaque token value.
    fn token(&self) -> String;
}

/// Default token source drawing random alphanumeric strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokens;

impl RandomTokens {
    fn random_string(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }
}

impl TokenSource for RandomTokens {
    fn security_stamp(&self) -> String {
        self.random_string()
    }

    fn token(&self) -> String {
        self.random_string()
    }
}
