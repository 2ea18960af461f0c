use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::user::{User, UserRole};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

pub fn create_access_token(user: &User, secret: &str, expire_minutes: i64) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        exp: (now + Duration::minutes(expire_minutes)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(token)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| anyhow!("Invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Credentials for bulk-created accounts are derived from the institutional
/// identifier so that a re-run of the same upload produces the same values.
pub fn derive_credentials(identifier: &str) -> (String, String) {
    let username = identifier.trim().to_lowercase();
    let password = format!("{username}#rp");
    (username, password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 42,
            email: "student@example.com".to_string(),
            hashed_password: String::new(),
            name: "John Student".to_string(),
            role: UserRole::Student,
        }
    }

    #[test]
    fn token_round_trip_preserves_identity_and_role() {
        let token = create_access_token(&test_user(), "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, UserRole::Student);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = create_access_token(&test_user(), "secret", 60).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_access_token(&test_user(), "secret", -5).unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn derived_credentials_are_deterministic() {
        let (user_a, pass_a) = derive_credentials("S2024001");
        let (user_b, pass_b) = derive_credentials(" S2024001 ");
        assert_eq!(user_a, "s2024001");
        assert_eq!(user_a, user_b);
        assert_eq!(pass_a, pass_b);
    }

    #[test]
    fn blank_identifier_derives_empty_username() {
        let (username, password) = derive_credentials("   ");
        assert!(username.is_empty());
        assert_eq!(password, "#rp");
    }
}
