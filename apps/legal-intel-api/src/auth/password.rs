//! Argon2id password hashing and credential validation

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

pub const MIN_PASSWORD_CHARS: usize = 8;

/// Character classes a password must contain, with the name used in errors
const REQUIRED_CLASSES: [(fn(&char) -> bool, &str); 3] = [
    (char::is_ascii_uppercase, "an uppercase letter"),
    (char::is_ascii_lowercase, "a lowercase letter"),
    (char::is_ascii_digit, "a digit"),
];

/// PHC-format Argon2id hash with a fresh random salt
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Argon2 hashing failed: {}", e))?;
    Ok(phc.to_string())
}

/// False on mismatch and on an unparseable stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(format!(
            "Password needs at least {} characters",
            MIN_PASSWORD_CHARS
        ));
    }

    let missing: Vec<&str> = REQUIRED_CLASSES
        .iter()
        .filter(|(matches, _)| !password.chars().any(|c| matches(&c)))
        .map(|(_, name)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("Password needs {}", missing.join(", ")))
    }
}

/// Trim and lowercase an email, rejecting obviously malformed addresses
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim().to_lowercase();
    let invalid = || Err(format!("'{}' is not a valid email address", email));

    if email.chars().any(char::is_whitespace) {
        return invalid();
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.contains('@') => {
            match domain.split_once('.') {
                Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(email.clone()),
                _ => invalid(),
            }
        }
        _ => invalid(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hash_is_argon2id_and_verifies() {
        let hash = hash_password("Counsel2024").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Counsel2024", &hash));
        assert!(!verify_password("counsel2024", &hash));
    }

    #[test]
    fn test_unparseable_hash_never_verifies() {
        assert!(!verify_password("Counsel2024", "plaintext"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        let first = hash_password("Retainer9x").unwrap();
        let second = hash_password("Retainer9x").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("Retainer9x", &first));
        assert!(verify_password("Retainer9x", &second));
    }

    #[test]
    fn test_strength_reports_missing_classes() {
        assert!(validate_password_strength("Retainer9x").is_ok());
        assert_eq!(
            validate_password_strength("Ab1"),
            Err("Password needs at least 8 characters".to_string())
        );
        assert_eq!(
            validate_password_strength("retainer99"),
            Err("Password needs an uppercase letter".to_string())
        );
        assert_eq!(
            validate_password_strength("longpassword"),
            Err("Password needs an uppercase letter, a digit".to_string())
        );
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Counsel@Firm.Example ").unwrap(),
            "counsel@firm.example"
        );
        for bad in ["invalid", "@firm.example", "user@", "user@firm", "a@b@c.com", "user@.com", "a b@c.com"] {
            assert!(normalize_email(bad).is_err(), "{} should be rejected", bad);
        }
    }
}
