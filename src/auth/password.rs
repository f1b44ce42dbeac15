use bcrypt::{hash, verify};
use crate::errors::{AppError, Result};

const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// bcrypt hashing with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    cost: u32,
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, self.cost)
            .map_err(|e| AppError::Auth(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        verify(password, hash)
            .map_err(|e| AppError::Auth(format!("Failed to verify password: {}", e)))
    }

    /// At least eight characters mixing upper case, lower case, digits and symbols.
    /// Every missing class is reported in one message.
    pub fn validate_password_strength(password: &str) -> Result<()> {
        if password.chars().count() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters long".to_string(),
            ));
        }

        let requirements = [
            (password.chars().any(char::is_uppercase), "an uppercase letter"),
            (password.chars().any(char::is_lowercase), "a lowercase letter"),
            (password.chars().any(|c| c.is_ascii_digit()), "a digit"),
            (
                password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
                "a special character",
            ),
        ];
        let missing: Vec<&str> = requirements
            .iter()
            .filter(|(present, _)| !present)
            .map(|(_, label)| *label)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Password must contain {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing_and_verification() {
        let service = PasswordService::new(4);
        let hash = service.hash_password("Creeper#2011").unwrap();

        assert!(PasswordService::verify_password("Creeper#2011", &hash).unwrap());
        assert!(!PasswordService::verify_password("creeper#2011", &hash).unwrap());
    }

    #[test]
    fn test_password_strength_validation() {
        assert!(PasswordService::validate_password_strength("Creeper#2011").is_ok());
        assert!(PasswordService::validate_password_strength("Sh0rt!").is_err());

        match PasswordService::validate_password_strength("nouppercase123") {
            Err(AppError::Validation(message)) => {
                assert!(message.contains("an uppercase letter"));
                assert!(message.contains("a special character"));
                assert!(!message.contains("a digit"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
