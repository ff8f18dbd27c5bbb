//! Session token codec.
//!
//! Tokens are compact HS256 JWTs (`header.payload.signature`). Verification
//! runs in a fixed order: parse, signature, claim shape, expiry.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, decode_header, encode,
    errors::ErrorKind,
};

use super::{errors::TokenError, models::SessionClaims};

/// Outcome of [`TokenCodec::inspect`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<C> {
    pub claims: C,
    /// `false` when the token is authentic but past its expiry
    pub is_valid: bool,
}

/// Signs and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by hand so an expired token can still be inspected.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a claim set into a compact token string
    pub fn sign<C: SessionClaims>(&self, claims: &C) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            log::error!("Failed to sign session token: {}", e);
            TokenError::SigningFailed
        })
    }

    /// Verify a token into claim shape `C`, rejecting expired tokens
    pub fn verify<C: SessionClaims + Clone>(&self, token: &str) -> Result<C, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// [`verify`](Self::verify) against an explicit clock
    pub fn verify_at<C: SessionClaims + Clone>(
        &self,
        token: &str,
        now: i64,
    ) -> Result<C, TokenError> {
        let verified = self.inspect_at::<C>(token, now)?;
        if verified.is_valid {
            Ok(verified.claims)
        } else {
            Err(TokenError::Expired)
        }
    }

    /// Verify parse and signature, reporting expiry as `is_valid = false`
    pub fn inspect<C: SessionClaims + Clone>(&self, token: &str) -> Result<Verified<C>, TokenError> {
        self.inspect_at(token, Utc::now().timestamp())
    }

    /// [`inspect`](Self::inspect) against an explicit clock
    pub fn inspect_at<C: SessionClaims + Clone>(
        &self,
        token: &str,
        now: i64,
    ) -> Result<Verified<C>, TokenError> {
        check_structure(token)?;

        // Header and payload are known to decode here, so a base64 failure
        // can only come from the signature segment.
        let data = decode::<C>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::Base64(_) => {
                    TokenError::SignatureInvalid
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims;
        let is_valid = now <= claims.base().exp;
        Ok(Verified { claims, is_valid })
    }
}

/// Reject tokens whose header or payload segment cannot be decoded
fn check_structure(token: &str) -> Result<(), TokenError> {
    let mut segments = token.split('.');
    let (Some(_), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    decode_header(token).map_err(|_| TokenError::Malformed)?;
    URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    Ok(())
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
///
/// The scheme is matched case-insensitively and must be followed by exactly
/// one space and a three-part token of URL-safe base64 segments.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let segments: Vec<&str> = token.split('.').collect();
    let well_formed = segments.len() == 3
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        });

    well_formed.then_some(token)
}
