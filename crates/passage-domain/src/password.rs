//! Password policy applied on sign-up, login and reset.

/// First rule a candidate password breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PasswordRule {
    #[error("password must be provided")]
    Required,
    #[error("password must be between 6 and 16 characters")]
    Length,
    #[error("password must contain a number")]
    Digit,
    #[error("password must contain a capital letter")]
    Uppercase,
    #[error("password must contain a lowercase letter")]
    Lowercase,
}

impl PasswordRule {
    /// Stable machine-readable id.
    pub fn id(self) -> &'static str {
        match self {
            Self::Required => "password-pv",
            Self::Length => "password-btw-6-16",
            Self::Digit => "password-mst-number",
            Self::Uppercase => "password-mst-capital",
            Self::Lowercase => "password-mst-n-capital",
        }
    }
}

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 16;

/// Check `password` against the policy, reporting the first rule it breaks.
pub fn validate_password(password: &str) -> Result<(), PasswordRule> {
    if password.is_empty() {
        return Err(PasswordRule::Required);
    }

    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(PasswordRule::Length);
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordRule::Digit);
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(PasswordRule::Uppercase);
    }

    if !password.chars().any(char::is_lowercase) {
        return Err(PasswordRule::Lowercase);
    }

    Ok(())
}
