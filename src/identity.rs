//! Caller identity from an access token.
//!
//! Tokens are HS256 JWTs whose claims carry a `userId`. Reading endpoints
//! resolve leniently (a bad token is just an anonymous caller); endpoints
//! that act on the caller's behalf use [`IdentityResolver::require`].

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::error::SongError;

/// Cookie the web client stores its access token in
pub const ACCESS_TOKEN_COOKIE: &str = "x-access-token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated { user_id: String },
}

impl Identity {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { user_id } => Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Expiry as seconds since the epoch; tokens without one never expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Token rejected: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Token has no user id")]
    EmptySubject,
}

#[derive(Clone)]
pub struct IdentityResolver {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl IdentityResolver {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked when present but not demanded
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Check a token's signature and expiry and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, IdentityError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        if data.claims.user_id.trim().is_empty() {
            return Err(IdentityError::EmptySubject);
        }
        Ok(data.claims)
    }

    /// Lenient resolution: any failure means an anonymous caller
    pub fn resolve(&self, credential: Option<&str>) -> Identity {
        let Some(token) = credential.map(str::trim).filter(|t| !t.is_empty()) else {
            return Identity::Anonymous;
        };

        match self.verify(token) {
            Ok(claims) => Identity::Authenticated {
                user_id: claims.user_id,
            },
            Err(e) => {
                tracing::debug!("Ignoring unusable credential: {}", e);
                Identity::Anonymous
            }
        }
    }

    /// Strict resolution for endpoints that need a known caller
    pub fn require(&self, credential: Option<&str>) -> Result<String, SongError> {
        let token = credential
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SongError::InvalidCredential("No credential supplied".to_string()))?;

        self.verify(token)
            .map(|claims| claims.user_id)
            .map_err(|e| SongError::InvalidCredential(e.to_string()))
    }

    /// Sign a token for `user_id`, optionally expiring after `ttl`
    pub fn issue(&self, user_id: &str, ttl: Option<Duration>) -> Result<String, IdentityError> {
        if user_id.trim().is_empty() {
            return Err(IdentityError::EmptySubject);
        }
        let claims = Claims {
            user_id: user_id.to_string(),
            exp: ttl.map(|ttl| jsonwebtoken::get_current_timestamp() + ttl.as_secs()),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }
}
