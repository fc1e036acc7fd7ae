//! Session token issuance.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};

use emporium_core::UserId;

use super::AccountError;

/// Lifetime of an access token, in hours.
pub const ACCESS_TOKEN_TTL_HOURS: i64 = 24;

/// Lifetime of a refresh token, in days.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

const TOKEN_BYTES: usize = 32;

/// Who a token pair is issued to.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// An access/refresh token pair.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues session tokens for a newly registered user.
pub trait TokenIssuer: Send + Sync {
    /// Issue a token pair for `claims`, valid from `now`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::TokenIssue` if no token can be produced.
    fn issue(&self, claims: &TokenClaims, now: DateTime<Utc>) -> Result<IssuedTokens, AccountError>;
}

/// Random opaque tokens, base64url encoded.
///
/// The tokens carry no claims; whoever validates them looks them up on the
/// user document.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueTokenIssuer;

fn random_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

impl TokenIssuer for OpaqueTokenIssuer {
    fn issue(&self, _claims: &TokenClaims, now: DateTime<Utc>) -> Result<IssuedTokens, AccountError> {
        Ok(IssuedTokens {
            token: random_token(),
            refresh_token: random_token(),
            expires_at: now + Duration::hours(ACCESS_TOKEN_TTL_HOURS),
            refresh_expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
        })
    }
}
