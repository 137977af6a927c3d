//! Bearer token issuance and verification (HS256 JWT).
//!
//! Every token embeds the subject's role at issuance time, so role checks
//! never need a user lookup. A role change takes effect once the old token
//! expires.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storerate_core::{Role, UserId};

use crate::models::{Principal, User};

/// Errors from signing or verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token's `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// Bad signature, malformed token or unusable claims.
    #[error("invalid token")]
    Invalid,

    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// JWT claims carried by every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID as a decimal string.
    pub sub: String,
    /// Role at issuance.
    pub role: Role,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

/// Signs and verifies bearer tokens with a shared HS256 secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from the signing secret and token lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl,
        }
    }

    /// Issue a token for `user` carrying their id and role.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn sign(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);

        self.encode(&Claims {
            sub: user.id.to_string(),
            role: user.role,
            iat: now,
            exp: now.saturating_add(ttl),
        })
    }

    /// Verify a token and return the principal it names.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for expired tokens and
    /// `TokenError::Invalid` for anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        let user_id: UserId = data.claims.sub.parse().map_err(|_| TokenError::Invalid)?;

        Ok(Principal {
            user_id,
            role: data.claims.role,
        })
    }

    fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(TokenError::Signing)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use storerate_core::Email;

    fn service(secret: &str) -> TokenService {
        TokenService::new(
            &SecretString::from(secret.to_owned()),
            Duration::from_secs(3600),
        )
    }

    fn user(role: Role) -> User {
        User {
            id: UserId::new(42),
            name: "Token Holder".to_owned(),
            email: Email::parse("holder@example.com").unwrap(),
            address: "1 Key Street".to_owned(),
            role,
            store_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sign_then_verify_yields_principal() {
        let tokens = service("k9$Lm2#Qw8!Zx4@Vb7&Np1*Rt5^Yh3%Gd");
        let token = tokens.sign(&user(Role::StoreOwner)).unwrap();

        let principal = tokens.verify(&token).unwrap();
        assert_eq!(principal.user_id, UserId::new(42));
        assert_eq!(principal.role, Role::StoreOwner);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = service("k9$Lm2#Qw8!Zx4@Vb7&Np1*Rt5^Yh3%Gd")
            .sign(&user(Role::User))
            .unwrap();

        let err = service("Pz7!Wq3@Ek8#Rm1$Tn6%Yb2^Uc9&Id4*Of")
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service("k9$Lm2#Qw8!Zx4@Vb7&Np1*Rt5^Yh3%Gd");
        let issued = Utc::now().timestamp() - 7200;
        let token = tokens
            .encode(&Claims {
                sub: "42".to_owned(),
                role: Role::User,
                iat: issued,
                exp: issued + 60,
            })
            .unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let tokens = service("k9$Lm2#Qw8!Zx4@Vb7&Np1*Rt5^Yh3%Gd");
        assert!(matches!(
            tokens.verify("not.a.token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_non_numeric_subject_is_invalid() {
        let tokens = service("k9$Lm2#Qw8!Zx4@Vb7&Np1*Rt5^Yh3%Gd");
        let now = Utc::now().timestamp();
        let token = tokens
            .encode(&Claims {
                sub: "admin".to_owned(),
                role: Role::Admin,
                iat: now,
                exp: now + 600,
            })
            .unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
    }
}
