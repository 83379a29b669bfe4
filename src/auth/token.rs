//! Bearer token issuance and verification.
//!
//! Tokens are JSON-shaped, symmetrically signed with HMAC-SHA-256 over a
//! secret loaded from configuration.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{claims::Claims, errors::AuthError};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issue a signed bearer token for the given identity, expiring at `expires_at`.
///
/// # Errors
///
/// Returns [`AuthError::Unauthorized`] if the token cannot be encoded (the
/// underlying library rejects a malformed key or header; this never happens
/// with the fixed `HS256` algorithm used here, but the error is still
/// surfaced rather than assumed away).
pub fn issue_token(
    secret: &str,
    user_id: i32,
    username: &str,
    device_id: &str,
    plan_type: &str,
    expires_at: DateTime<Utc>,
) -> Result<String, AuthError> {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "Unix timestamps fit in usize until year 292277026596"
    )]
    #[expect(clippy::cast_sign_loss, reason = "token expiry is always in the future")]
    let exp = expires_at.timestamp() as usize;
    let claims = Claims {
        user_id,
        username: username.to_owned(),
        device_id: device_id.to_owned(),
        plan_type: plan_type.to_owned(),
        exp,
    };
    encode(
        &Header::new(ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::Unauthorized)
}

/// Verify a bearer token against the configured secret.
///
/// Rejects tokens with the wrong signing algorithm, expired tokens, tokens
/// with a missing claim, or tokens not signed with the current secret,
/// collapsing every failure mode to a single opaque [`AuthError::Unauthorized`].
///
/// # Errors
///
/// Returns [`AuthError::Unauthorized`] for any verification failure.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(ALGORITHM);
    validation.algorithms = vec![ALGORITHM];
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn issued_token_verifies_with_same_secret() {
        let expires_at = Utc::now() + Duration::hours(24);
        let token = issue_token("secret", 7, "alice", "device-1", "free", expires_at)
            .expect("issue token");

        let claims = verify_token(&token, "secret").expect("verify token");

        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.device_id, "device-1");
        assert_eq!(claims.plan_type, "free");
    }

    #[rstest]
    fn wrong_secret_is_rejected() {
        let expires_at = Utc::now() + Duration::hours(24);
        let token = issue_token("secret", 7, "alice", "device-1", "free", expires_at)
            .expect("issue token");

        let err = verify_token(&token, "other-secret").expect_err("must fail");

        assert_eq!(err, AuthError::Unauthorized);
    }

    #[rstest]
    fn expired_token_is_rejected() {
        let expires_at = Utc::now() - Duration::hours(1);
        let token = issue_token("secret", 7, "alice", "device-1", "free", expires_at)
            .expect("issue token");

        let err = verify_token(&token, "secret").expect_err("must fail");

        assert_eq!(err, AuthError::Unauthorized);
    }
}
