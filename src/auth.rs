//! # Authentication
//!
//! JWT bearer tokens for the staff API plus Argon2 password hashing.
//! Stored passwords are Argon2id hashes; rows imported from the legacy
//! system may still hold plaintext, which is accepted once and upgraded to
//! a hash by the login handler.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{unauthorized, ApiError};
use crate::models::technicien::Model as TechnicienModel;
use crate::server::AppState;

/// JWT claims carried by every staff token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Technician ID
    pub id: Uuid,
    /// Login name
    pub nom: String,
    /// Role: admin, teleop or technicien
    pub role: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),
    #[error("Invalid or expired token")]
    InvalidToken,
}

/// Hash a password with Argon2id and a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::HashingFailed(err.to_string()))
}

/// Outcome of checking a candidate password against the stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// Matched the stored Argon2 hash
    Hashed,
    /// Matched a legacy plaintext row; the caller should rehash
    LegacyPlaintext,
    Mismatch,
}

/// Check a candidate password against the stored column, which is either an
/// Argon2 hash or legacy plaintext.
pub fn check_password(candidate: &str, stored: &str) -> PasswordCheck {
    if stored.starts_with("$argon2") {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return PasswordCheck::Mismatch;
        };
        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => PasswordCheck::Hashed,
            Err(_) => PasswordCheck::Mismatch,
        }
    } else if stored == candidate {
        PasswordCheck::LegacyPlaintext
    } else {
        PasswordCheck::Mismatch
    }
}

/// Issue a signed bearer token for a technician
pub fn issue_token(
    tech: &TechnicienModel,
    secret: &str,
    ttl_days: i64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        id: tech.id,
        nom: tech.nom.clone(),
        role: tech.role.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| AuthError::EncodingFailed(err.to_string()))
}

/// Validate a bearer token and return its claims
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

/// Authenticated staff identity, extracted from the Authorization header
#[derive(Debug, Clone)]
pub struct AuthTech {
    pub id: Uuid,
    pub nom: String,
    pub role: String,
}

impl AuthTech {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

impl FromRequestParts<AppState> for AuthTech {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized(Some("Expected a Bearer token")))?;

        let claims = decode_token(token, &state.config.jwt_secret)
            .map_err(|_| unauthorized(Some("Invalid or expired token")))?;

        Ok(AuthTech {
            id: claims.id,
            nom: claims.nom,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_tech() -> TechnicienModel {
        let now = Utc::now();
        TechnicienModel {
            id: Uuid::new_v4(),
            nom: "karim".to_string(),
            prenom: None,
            email: None,
            telephone: None,
            mdp: "irrelevant".to_string(),
            role: "technicien".to_string(),
            departements: None,
            pourcentage_tech: 50.0,
            en_ligne: false,
            en_pause: false,
            actif: true,
            latitude: None,
            longitude: None,
            derniere_connexion: None,
            derniere_position: None,
            push_token: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(hash.starts_with("$argon2"));

        assert_eq!(check_password("s3cret!", &hash), PasswordCheck::Hashed);
        assert_eq!(check_password("wrong", &hash), PasswordCheck::Mismatch);
    }

    #[test]
    fn legacy_plaintext_is_flagged_for_upgrade() {
        assert_eq!(
            check_password("motdepasse", "motdepasse"),
            PasswordCheck::LegacyPlaintext
        );
        assert_eq!(
            check_password("autre", "motdepasse"),
            PasswordCheck::Mismatch
        );
    }

    #[test]
    fn token_roundtrip_carries_identity() {
        let tech = sample_tech();
        let token = issue_token(&tech, "test-secret", 30).unwrap();

        let claims = decode_token(&token, "test-secret").unwrap();
        assert_eq!(claims.id, tech.id);
        assert_eq!(claims.nom, "karim");
        assert_eq!(claims.role, "technicien");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let tech = sample_tech();
        let token = issue_token(&tech, "test-secret", 30).unwrap();

        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let tech = sample_tech();
        let token = issue_token(&tech, "test-secret", -1).unwrap();

        assert!(decode_token(&token, "test-secret").is_err());
    }
}
