//! Session tokens
//!
//! A session is an HS256 JWT whose claims are the user profile plus `iat`
//! and `exp`. There is no server-side session table: anything that verifies
//! against the signing secret and has not expired is a valid session.
//!
//! Expiry is checked here rather than by `jsonwebtoken` so that a token is
//! rejected at exactly `exp` with no leeway, and so tests can pin the clock.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use common::Secret;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::constants::SESSION_TTL_SECS;
use crate::error::{Error, Result};
use crate::profile::UserProfile;

/// JWT claims: the flattened profile plus issue and expiry times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub profile: UserProfile,
    /// Issued at, unix seconds
    pub iat: u64,
    /// Expires at, unix seconds
    pub exp: u64,
}

/// Signs and verifies session tokens with the process signing secret.
#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl SessionSigner {
    pub fn new(secret: &Secret<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.expose_bytes()),
            decoding: DecodingKey::from_secret(secret.expose_bytes()),
            validation,
            ttl_secs: SESSION_TTL_SECS,
        }
    }

    /// Token lifetime in seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Sign `profile` into a token expiring `SESSION_TTL_SECS` from now.
    pub fn sign(&self, profile: &UserProfile) -> Result<String> {
        self.sign_at(profile, unix_now())
    }

    pub fn sign_at(&self, profile: &UserProfile, issued_at: u64) -> Result<String> {
        let mut profile = profile.clone();
        // iat/exp belong to the session, not to whatever the provider sent
        profile.remove("iat");
        profile.remove("exp");

        let claims = SessionClaims {
            profile,
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the signed profile.
    pub fn verify(&self, token: &str) -> Result<UserProfile> {
        self.verify_at(token, unix_now())
    }

    pub fn verify_at(&self, token: &str, now: u64) -> Result<UserProfile> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => Error::SessionExpired,
                _ => Error::InvalidSession(e.to_string()),
            }
        })?;

        if data.claims.exp <= now {
            return Err(Error::SessionExpired);
        }

        Ok(data.claims.profile)
    }
}

impl fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSigner")
            .field("key", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
