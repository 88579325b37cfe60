//! User credential validation
//!
//! Usernames are case-insensitively unique and must never look like a
//! date or days token in a search path, so they cannot start with a digit,
//! `-` or `@`, and cannot contain `/`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

const MAX_USERNAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 250;
const MIN_PASSWORD_LEN: usize = 6;
/// bcrypt ignores input past 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+$").expect("invalid email regex")
});

/// Validated username
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username.
    ///
    /// # Example
    /// ```
    /// use postline_server::models::Username;
    ///
    /// assert!(Username::new("alice").is_ok());
    /// assert!(Username::new("1alice").is_err());  // digit start
    /// assert!(Username::new("al/ice").is_err());  // slash
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }

        if s.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }

        if s.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '@') {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "cannot start with a digit, '-' or '@'",
            });
        }

        if s.contains('/') || s.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "cannot contain '/' or whitespace",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated email address (stored as given, compared case-insensitively)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }

        if s.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }

        if !EMAIL_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like name@domain",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plain-text password, only ever held long enough to hash or verify
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }

        if s.len() > MAX_PASSWORD_BYTES {
            return Err(ValidationError::TooLong {
                field: "password",
                max: MAX_PASSWORD_BYTES,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}
