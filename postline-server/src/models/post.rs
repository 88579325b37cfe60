//! Post text and id validation

use super::ValidationError;

/// Maximum length for post text, in characters
const MAX_TEXT_LEN: usize = 10_000;

/// Validated post text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostText(String);

impl PostText {
    /// Create post text.
    ///
    /// # Rules
    /// - Must contain something other than whitespace
    /// - Max 10 000 characters (not bytes)
    ///
    /// # Example
    /// ```
    /// use postline_server::models::PostText;
    ///
    /// assert!(PostText::new("hello world").is_ok());
    /// assert!(PostText::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.trim().is_empty() {
            return Err(ValidationError::Empty { field: "text" });
        }

        if s.chars().count() > MAX_TEXT_LEN {
            return Err(ValidationError::TooLong {
                field: "text",
                max: MAX_TEXT_LEN,
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Post id taken from a request path (always >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostId(i64);

impl PostId {
    pub fn new(id: i64) -> Result<Self, ValidationError> {
        if id < 1 {
            return Err(ValidationError::InvalidFormat {
                field: "id",
                reason: "must be a positive integer",
            });
        }
        Ok(Self(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_text() {
        assert!(PostText::new("Hello world").is_ok());
        assert!(PostText::new("  padded  ").is_ok());
    }

    #[test]
    fn rejects_blank() {
        assert_eq!(
            PostText::new("").unwrap_err(),
            ValidationError::Empty { field: "text" }
        );
        assert!(PostText::new("\n\t ").is_err());
    }

    #[test]
    fn max_length_counts_chars() {
        let at_limit = "a".repeat(10_000);
        assert!(PostText::new(&at_limit).is_ok());

        // multi-byte chars count once each
        let wide = "é".repeat(10_000);
        assert!(PostText::new(&wide).is_ok());

        let over = "a".repeat(10_001);
        let err = PostText::new(&over).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 10_000, .. }));
    }

    #[test]
    fn post_id_must_be_positive() {
        assert_eq!(PostId::new(1).unwrap().get(), 1);
        assert!(PostId::new(0).is_err());
        assert!(PostId::new(-3).is_err());
    }
}
