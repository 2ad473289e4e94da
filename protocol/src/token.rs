//! Session token codec.
//!
//! A token is `base64url(payload) "." base64url(tag)`, where the payload is a
//! JSON object holding the player identity and the issue time, and the tag is
//! a BLAKE2b keyed MAC (`orion::auth`) over the encoded payload text.
//! Nothing about a token is stored on the server.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use orion::auth::{SecretKey, Tag};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};

use crate::player::{GameMode, PlayerId, PlayerIdentity};

/// Separates the encoded payload from the encoded tag.
/// Not part of the url-safe base64 alphabet.
const DELIMITER: char = '.';

/// Why a presented token was not accepted.
///
/// The variants exist for logging. Clients should be shown the same outcome
/// for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no session cookie")]
    Missing,
    #[error("session signature mismatch")]
    BadSignature,
    #[error("session payload is malformed")]
    Malformed,
    #[error("session expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    #[error("session secret must not be empty")]
    Empty,
    #[error("unable to derive a signing key from the session secret")]
    Derivation,
}

/// Server-wide signing key.
///
/// Every instance of a deployment must be built from the same passphrase,
/// otherwise tokens minted by one are rejected by the others.
pub struct SessionSecret(SecretKey);

impl SessionSecret {
    /// Derive a 256-bit key from an operator-supplied passphrase.
    /// Surrounding whitespace is ignored, so a trailing newline in a secret
    /// file does not change the key.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, SecretError> {
        let passphrase = passphrase.trim();
        if passphrase.is_empty() {
            return Err(SecretError::Empty);
        }
        let digest =
            orion::hash::digest(passphrase.as_bytes()).map_err(|_| SecretError::Derivation)?;
        SecretKey::from_slice(digest.as_ref())
            .map(Self)
            .map_err(|_| SecretError::Derivation)
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(***)")
    }
}

/// Opaque cookie value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signed part of the token. Field names are short to keep the cookie small.
#[serde_as]
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Claims {
    pid: PlayerId,
    name: String,
    mode: GameMode,
    #[serde_as(as = "TimestampSeconds<i64>")]
    iat: SystemTime,
}

/// Whole seconds since the unix epoch, clamped at zero
fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Mints and verifies session tokens. Holds no mutable state.
#[derive(Debug)]
pub struct TokenCodec {
    secret: SessionSecret,
}

impl TokenCodec {
    pub fn new(secret: SessionSecret) -> Self {
        Self { secret }
    }

    pub fn mint(&self, identity: &PlayerIdentity, issued_at: SystemTime) -> SessionToken {
        debug_assert!(!identity.player_id.is_nil(), "Minting for a nil player id");

        let claims = Claims {
            pid: identity.player_id,
            name: identity.player_name.clone(),
            mode: identity.game_mode,
            iat: UNIX_EPOCH + Duration::from_secs(unix_seconds(issued_at)),
        };
        let payload = serde_json::to_vec(&claims).expect("Claims are always serializable");
        self.seal(&payload)
    }

    pub fn mint_now(&self, identity: &PlayerIdentity) -> SessionToken {
        self.mint(identity, SystemTime::now())
    }

    /// Sign an already serialized payload
    fn seal(&self, payload: &[u8]) -> SessionToken {
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let tag = orion::auth::authenticate(&self.secret.0, encoded.as_bytes())
            .expect("Unable to sign session token");

        let mut token = encoded;
        token.push(DELIMITER);
        token.push_str(&URL_SAFE_NO_PAD.encode(tag.unprotected_as_bytes()));
        SessionToken(token)
    }

    pub fn decode(
        &self,
        token: &str,
        now: SystemTime,
        max_age: Duration,
    ) -> Result<PlayerIdentity, AuthError> {
        let (encoded, tag) = token
            .split_once(DELIMITER)
            .ok_or(AuthError::BadSignature)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .ok()
            .and_then(|bytes| Tag::from_slice(&bytes).ok())
            .ok_or(AuthError::BadSignature)?;
        orion::auth::authenticate_verify(&tag, &self.secret.0, encoded.as_bytes())
            .map_err(|_| AuthError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;
        if claims.pid.is_nil() {
            return Err(AuthError::Malformed);
        }

        // Issue times ahead of `now` (clock skew between instances) count as age zero
        let age = unix_seconds(now).saturating_sub(unix_seconds(claims.iat));
        if age > max_age.as_secs() {
            return Err(AuthError::Expired);
        }

        Ok(PlayerIdentity {
            player_id: claims.pid,
            player_name: claims.name,
            game_mode: claims.mode,
        })
    }

    pub fn decode_now(&self, token: &str, max_age: Duration) -> Result<PlayerIdentity, AuthError> {
        self.decode(token, SystemTime::now(), max_age)
    }
}
