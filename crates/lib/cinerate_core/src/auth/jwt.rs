//! JWT token generation and verification.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};

use super::{AuthError, Role};
use crate::models::auth::TokenClaims;

/// Default access token lifetime: 30 minutes.
pub const DEFAULT_TOKEN_VALIDITY_MINS: i64 = 30;

/// Length of the random `jti` claim.
const TOKEN_ID_LEN: usize = 24;

/// Signs and verifies HS256 access tokens with a process-wide secret.
///
/// Verification needs no shared state, so a codec can be cloned freely and
/// used from any number of request tasks. Expiry is checked against an
/// explicit clock (`decode_at`) after the signature, which means a tampered
/// token is always reported as tampered even when it is also stale.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    validity: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], validity: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against the caller's clock in `decode_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            validity,
        }
    }

    /// Lifetime of newly issued tokens.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a signed token for `subject` valid from `now` for the configured window.
    ///
    /// Each call carries a fresh `jti`, so logging out one session never
    /// revokes another issued in the same second.
    pub fn encode(
        &self,
        subject: &str,
        roles: &BTreeSet<Role>,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = TokenClaims {
            sub: subject.to_string(),
            roles: roles.clone(),
            iat: now.timestamp(),
            exp: (now + self.validity).timestamp(),
            jti: random_alphanumeric(TOKEN_ID_LEN),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify a token against the current time.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify a token's structure and signature, then its expiry relative to `now`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let claims = decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::BadSignature,
                _ => AuthError::MalformedToken,
            })?
            .claims;
        if now.timestamp() > claims.exp {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

fn random_alphanumeric(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Signing secret for this deployment.
///
/// `JWT_SECRET` wins when set. Otherwise the secret lives in
/// `<data dir>/cinerate/jwt-secret`, created on first start, so tokens
/// issued before a restart keep verifying. If the file cannot be written the
/// generated secret only lasts for this process.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    load_or_create_secret(&jwt_secret_path())
}

/// Read the secret stored at `path`, or generate one and try to store it there.
fn load_or_create_secret(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret = random_alphanumeric(64);
    let persisted = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|()| std::fs::write(path, &secret));
    match persisted {
        Ok(()) => info!(path = %path.display(), "generated signing secret"),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "could not persist signing secret; tokens will not survive a restart"
        ),
    }
    secret
}

fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cinerate")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret", Duration::minutes(DEFAULT_TOKEN_VALIDITY_MINS))
    }

    fn roles(list: &[Role]) -> BTreeSet<Role> {
        list.iter().copied().collect()
    }

    #[test]
    fn decode_returns_encoded_subject_and_roles() {
        let codec = codec();
        let now = Utc::now();
        for (subject, granted) in [
            ("user", roles(&[Role::User])),
            ("admin", roles(&[Role::Admin, Role::User])),
            ("nobody", roles(&[])),
            ("ünïcödé name", roles(&[Role::Admin])),
        ] {
            let token = codec.encode(subject, &granted, now).unwrap();
            let claims = codec.decode_at(&token, now).unwrap();
            assert_eq!(claims.sub, subject);
            assert_eq!(claims.roles, granted);
            assert_eq!(claims.iat, now.timestamp());
            assert_eq!(claims.exp, (now + Duration::minutes(30)).timestamp());
        }
    }

    #[test]
    fn tokens_issued_in_the_same_second_differ() {
        let codec = codec();
        let now = Utc::now();
        let granted = roles(&[Role::User]);
        let first = codec.encode("user", &granted, now).unwrap();
        let second = codec.encode("user", &granted, now).unwrap();
        assert_ne!(first, second);

        let (a, b) = (
            codec.decode_at(&first, now).unwrap(),
            codec.decode_at(&second, now).unwrap(),
        );
        assert_eq!((a.iat, a.exp), (b.iat, b.exp));
        assert_ne!(a.jti, b.jti);
        assert_eq!(a.jti.len(), TOKEN_ID_LEN);
    }

    #[test]
    fn token_is_valid_until_expiry_inclusive() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.encode("user", &roles(&[Role::User]), now).unwrap();
        let expires_at = now + codec.validity();
        assert!(codec.decode_at(&token, expires_at).is_ok());
        assert!(matches!(
            codec.decode_at(&token, expires_at + Duration::seconds(1)),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn stale_token_is_expired_against_wall_clock() {
        let codec = codec();
        let issued = Utc::now() - Duration::minutes(31);
        let token = codec.encode("user", &roles(&[Role::User]), issued).unwrap();
        assert!(matches!(codec.decode(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn any_single_character_change_is_rejected() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.encode("user", &roles(&[Role::User]), now).unwrap();
        for (i, c) in token.char_indices() {
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + c.len_utf8(), &replacement.to_string());
            match codec.decode_at(&tampered, now) {
                Err(AuthError::BadSignature | AuthError::MalformedToken) => {}
                other => panic!("tampering at {i} produced {other:?}"),
            }
        }
    }

    #[test]
    fn foreign_secret_is_bad_signature() {
        let now = Utc::now();
        let other = TokenCodec::new(b"other-secret", Duration::minutes(30));
        let token = other.encode("user", &roles(&[Role::User]), now).unwrap();
        assert!(matches!(
            codec().decode_at(&token, now),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn tampered_and_expired_reports_signature_first() {
        let codec = codec();
        let issued = Utc::now() - Duration::hours(2);
        let other = TokenCodec::new(b"other-secret", Duration::minutes(30));
        let token = other.encode("user", &roles(&[Role::User]), issued).unwrap();
        assert!(matches!(codec.decode(&token), Err(AuthError::BadSignature)));
    }

    #[test]
    fn generated_secret_is_reused_after_restart() {
        let dir = std::env::temp_dir().join(format!("cinerate-secret-{}", random_alphanumeric(12)));
        let path = dir.join("nested").join("jwt-secret");

        let first = load_or_create_secret(&path);
        assert_eq!(first.len(), 64);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
        assert_eq!(load_or_create_secret(&path), first);

        std::fs::write(&path, "  operator-chosen  \n").unwrap();
        assert_eq!(load_or_create_secret(&path), "operator-chosen");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        for token in ["", "not-a-jwt", "a.b", "a.b.c", "....."] {
            assert!(
                matches!(codec.decode(token), Err(AuthError::MalformedToken)),
                "{token:?} should be malformed"
            );
        }
    }
}
