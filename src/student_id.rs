use crate::error::StudentIdError;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    // `\d` would accept any Unicode digit; IDs are ASCII only.
    static ref STUDENT_ID_REGEX: Regex = Regex::new(r"^[0-9]{9}$").unwrap();
}

/// Check whether `input` is a well-formed student identifier
///
/// Surrounding whitespace is ignored; what remains must be exactly nine
/// ASCII digits.
///
/// # Examples
/// ```
/// use exam_results::student_id::is_valid_student_id;
///
/// assert!(is_valid_student_id("123456789"));
/// assert!(is_valid_student_id(" 123456789\n"));
/// assert!(!is_valid_student_id("12345678a"));
/// ```
pub fn is_valid_student_id(input: &str) -> bool {
    STUDENT_ID_REGEX.is_match(input.trim())
}

/// A validated, trimmed student identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentId(String);

impl StudentId {
    /// Parse raw form input, telling apart a blank field from a malformed one.
    pub fn parse(input: &str) -> Result<Self, StudentIdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(StudentIdError::Empty);
        }
        if !is_valid_student_id(trimmed) {
            return Err(StudentIdError::InvalidFormat);
        }
        Ok(StudentId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StudentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
