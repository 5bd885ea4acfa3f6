use argon2::password_hash::rand_core::OsRng;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};

use super::error::AuthError;

const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with Argon2 after checking it against the strength rule
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    validate_password_strength(password)?;

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHashError(e.to_string()))
}

/// Constant-time check of `password` against a stored PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AuthError::PasswordHashError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// At least 8 characters with one letter and one digit
pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        Err(AuthError::WeakPassword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("popcorn42").unwrap();

        assert!(verify_password("popcorn42", &hash).unwrap());
        assert!(!verify_password("popcorn43", &hash).unwrap());
    }

    #[test]
    fn test_weak_passwords_are_rejected() {
        assert!(validate_password_strength("matinee1").is_ok());

        assert!(matches!(
            validate_password_strength("short1"),
            Err(AuthError::WeakPassword)
        ));
        assert!(validate_password_strength("nodigitshere").is_err());
        assert!(validate_password_strength("1234567890").is_err());
        assert!(hash_password("weak").is_err());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(matches!(
            verify_password("popcorn42", "not-a-phc-string"),
            Err(AuthError::PasswordHashError(_))
        ));
    }
}
