//! Master password policy, applied when a vault is first set up.

use std::fmt;

use serde::Serialize;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A password policy rule that was not satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    Special,
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordRule::MinLength => {
                write!(f, "must be at least {} characters long", MIN_PASSWORD_LENGTH)
            }
            PasswordRule::Uppercase => write!(f, "must contain an uppercase letter"),
            PasswordRule::Lowercase => write!(f, "must contain a lowercase letter"),
            PasswordRule::Digit => write!(f, "must contain a number"),
            PasswordRule::Special => write!(f, "must contain a special character"),
        }
    }
}

/// Check a candidate master password against the policy.
///
/// Returns every rule that fails, in a stable order. An empty list means the
/// password is acceptable.
///
/// Letter and digit classes are ASCII. Any other character, including a
/// space or a non-ASCII letter, counts as special.
pub fn validate_password(password: &str) -> Vec<PasswordRule> {
    let mut failed = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        failed.push(PasswordRule::MinLength);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        failed.push(PasswordRule::Uppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        failed.push(PasswordRule::Lowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        failed.push(PasswordRule::Digit);
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        failed.push(PasswordRule::Special);
    }

    failed
}
