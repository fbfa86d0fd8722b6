//! Field validators
//!
//! Pure checks run before any mutation is allowed. None of these touch
//! the store.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// MIME types accepted for uploads: PDF, legacy Word, OOXML Word
pub const ALLOWED_MIME_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Default upload limit (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Minimum password length, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum username length, in characters
pub const MIN_USERNAME_LEN: usize = 3;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Result of a validator that always reports a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub message: String,
}

impl Validation {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Why a file was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileRejection {
    #[error("Please upload only PDF or Word documents")]
    UnsupportedType { mime_type: String },

    #[error("File size should not exceed {}", format_limit(.limit))]
    TooLarge { size: u64, limit: u64 },
}

/// `local@domain.tld` with no whitespace; deliberately loose
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Passwords only need to be long enough
pub fn validate_password(password: &str) -> Validation {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Validation::fail(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    Validation::ok("Password is valid")
}

/// Check an upload's type and size
///
/// The type check runs first, so an oversized file of the wrong type is
/// reported as the wrong type.
pub fn validate_file(mime_type: &str, size: u64, max_bytes: u64) -> Result<(), FileRejection> {
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(FileRejection::UnsupportedType {
            mime_type: mime_type.to_string(),
        });
    }
    if size > max_bytes {
        return Err(FileRejection::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Render a byte limit the way users read it ("5MB")
pub fn format_limit(bytes: &u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    match *bytes {
        b if b >= MIB && b % MIB == 0 => format!("{}MB", b / MIB),
        b if b >= KIB && b % KIB == 0 => format!("{}KB", b / KIB),
        b => format!("{} bytes", b),
    }
}
