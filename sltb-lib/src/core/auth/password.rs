use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::ApplicationError;

/// Well-formed hash with the default parameters, checked against when no
/// account matches so both sign-in failures cost one verification.
pub const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$fKUo7D3ZbbL/cn/q3exESg$gPA0AoEpdy9JtYJvYRkNT/0sJPpJOflg/p5UzkaXy4Y";

/// Argon2id hash in PHC format, salt and parameters included.
pub fn hash_password(password: &str) -> Result<String, ApplicationError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApplicationError::Internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApplicationError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ApplicationError::Internal(format!("Invalid password hash format: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

async fn run_blocking<T, F>(work: F) -> Result<T, ApplicationError>
where
    F: FnOnce() -> Result<T, ApplicationError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApplicationError::Internal(format!("Password task failed: {}", e)))?
}

/// `hash_password` on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, ApplicationError> {
    run_blocking(move || hash_password(&password)).await
}

/// `verify_password` on the blocking pool.
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, ApplicationError> {
    run_blocking(move || verify_password(&password, &hash)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("tea-leaf-2024").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("tea-leaf-2024", &hash).unwrap());
        assert!(!verify_password("tea-leaf-2025", &hash).unwrap());
    }

    #[test]
    fn salts_differ() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("secret", "plain-text").is_err());
    }

    #[test]
    fn dummy_hash_matches_default_parameters() {
        let parsed = PasswordHash::new(DUMMY_HASH).unwrap();
        let fresh = hash_password("secret").unwrap();
        let fresh = PasswordHash::new(&fresh).unwrap();
        assert_eq!(parsed.algorithm, fresh.algorithm);
        assert_eq!(parsed.params, fresh.params);
        assert!(!verify_password("secret", DUMMY_HASH).unwrap());
    }

    #[tokio::test]
    async fn blocking_variants_agree() {
        let hash = hash_password_blocking("tea-leaf-2024".to_string()).await.unwrap();
        assert!(verify_password_blocking("tea-leaf-2024".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("tea-leaf-2025".to_string(), hash)
            .await
            .unwrap());
    }
}
