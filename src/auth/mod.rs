pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{SecurityConfig, MAX_JWT_EXPIRY_HOURS};
use crate::database::models::DbId;

/// Which account table a token subject lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Kid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: DbId,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Authenticated identity, one variant per role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Parent(DbId),
    Kid(DbId),
}

impl From<&Claims> for Identity {
    fn from(claims: &Claims) -> Self {
        match claims.role {
            Role::Parent => Identity::Parent(claims.sub),
            Role::Kid => Identity::Kid(claims.sub),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid JWT token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Signs and verifies session tokens with a shared HS256 secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        let hours = config.jwt_expiry_hours.min(MAX_JWT_EXPIRY_HOURS) as i64;
        Self::new(&config.jwt_secret, Duration::hours(hours))
    }

    pub fn issue(&self, identity: Identity) -> Result<String, TokenError> {
        let now = Utc::now();
        let (sub, role) = match identity {
            Identity::Parent(id) => (id, Role::Parent),
            Identity::Kid(id) => (id, Role::Kid),
        };
        let claims = Claims {
            sub,
            role,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Generation)
    }

    /// Validates signature and expiry and returns the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

const PARENT_CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const PARENT_CODE_LEN: usize = 6;

/// Random invite code a parent shares with their kid. Uniqueness is not checked.
pub fn generate_parent_code() -> String {
    let mut rng = rand::thread_rng();
    (0..PARENT_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..PARENT_CODE_ALPHABET.len());
            char::from(PARENT_CODE_ALPHABET[idx])
        })
        .collect()
}
