//! Password policy enforcement for new passwords.

use visitdesk_core::config::auth::AuthConfig;
use visitdesk_core::error::AppError;

/// Checks new passwords against length, character-class, and strength rules.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validate `password` for the account `username`.
    ///
    /// Returns the first violated rule as a validation error.
    pub fn validate(&self, password: &str, username: &str) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        let rules: [(fn(char) -> bool, &str); 4] = [
            (char::is_uppercase, "an uppercase letter"),
            (char::is_lowercase, "a lowercase letter"),
            (|c| c.is_ascii_digit(), "a digit"),
            (|c| !c.is_alphanumeric(), "a special character"),
        ];
        for (rule, what) in rules {
            if !password.chars().any(rule) {
                return Err(AppError::validation(format!(
                    "Password must contain at least {what}"
                )));
            }
        }

        if !username.is_empty() && password.to_lowercase().contains(&username.to_lowercase()) {
            return Err(AppError::validation(
                "Password must not contain the username",
            ));
        }

        let estimate = zxcvbn::zxcvbn(password, &[username, "visitdesk"]);
        if estimate.score() < zxcvbn::Score::Three {
            return Err(AppError::validation(
                "Password is too easy to guess; use a longer or less predictable one",
            ));
        }

        Ok(())
    }

    /// Reject a new password identical to the current one.
    pub fn validate_not_same(&self, current: &str, new: &str) -> Result<(), AppError> {
        if current == new {
            return Err(AppError::validation(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> PasswordValidator {
        PasswordValidator::new(&AuthConfig::default())
    }

    #[test]
    fn accepts_strong_password() {
        assert!(validator().validate("Visit0r!Desk#2026xq", "desk1").is_ok());
    }

    #[test]
    fn rejects_missing_classes() {
        let v = validator();
        assert!(v.validate("short1!A", "desk1").is_err());
        assert!(v.validate("alllowercase123!", "desk1").is_err());
        assert!(v.validate("NoDigitsHere!!xx", "desk1").is_err());
        assert!(v.validate("NoSpecials12345x", "desk1").is_err());
    }

    #[test]
    fn rejects_username_inside_password() {
        let err = validator()
            .validate("Frontdesk!2026#Zq", "frontdesk")
            .unwrap_err();
        assert!(err.message.contains("username"));
    }
}
