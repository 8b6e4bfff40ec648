//! Signed claim tokens for bearer authentication.
//!
//! Layout: `base64url(json claims) "." base64url(HMAC-SHA256(secret, payload))`
//! where `payload` is the first segment as sent. No padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use super::CryptoError;
use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

pub const SECRET_LENGTH: usize = 32;

/// Claims carried by every token. Times are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role_id: i64,
    pub role_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// HMAC key, zeroed on drop
#[derive(Zeroize)]
#[zeroize(drop)]
struct SigningKey(Vec<u8>);

pub struct TokenSigner {
    key: SigningKey,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl_hours: u32) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        Ok(Self {
            key: SigningKey(secret.to_vec()),
            ttl_secs: i64::from(ttl_hours) * 3600,
        })
    }

    /// Signer with a fresh random secret. Tokens do not survive a restart.
    pub fn random(ttl_hours: u32) -> Self {
        let secret: [u8; SECRET_LENGTH] = rand::random();
        Self {
            key: SigningKey(secret.to_vec()),
            ttl_secs: i64::from(ttl_hours) * 3600,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    fn mac(&self) -> Result<HmacSha256, CryptoError> {
        HmacSha256::new_from_slice(&self.key.0).map_err(|_| CryptoError::EmptySecret)
    }

    /// Issue a token for `user`, valid from `now` for the configured TTL.
    pub fn issue(&self, user: &User, now: i64) -> Result<String, CryptoError> {
        let claims = Claims {
            user_id: user.id,
            role_id: user.role_id,
            role_name: user.role_name.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify signature and expiry. Signature first, so unsigned input is
    /// never parsed as claims.
    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, CryptoError> {
        let (payload, signature) = token.split_once('.').ok_or(CryptoError::MalformedToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CryptoError::MalformedToken)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CryptoError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| CryptoError::MalformedToken)?;
        let claims: Claims = serde_json::from_slice(&json)?;
        if now >= claims.exp {
            return Err(CryptoError::Expired);
        }
        Ok(claims)
    }
}
