//! Operation outcomes
//!
//! Expected failures (bad credentials, duplicates, invalid files) are not
//! errors. They come back as [`Outcome::Rejected`] carrying a
//! [`Rejection`] whose `Display` is the user-facing message. I/O faults
//! travel separately as `Err`.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

use crate::accounts::FormErrors;
use crate::models::Role;
use crate::validation::FileRejection;

/// Why an operation was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    /// Same message for unknown user, wrong password and wrong role
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    InvalidForm(FormErrors),

    #[error("Please log in to continue")]
    NotLoggedIn,

    #[error("Please log in as a {0} to continue")]
    NotAuthorized(Role),

    #[error("Please fill all fields and select a file")]
    MissingPaperFields,

    #[error("Please select a question paper and upload your answer sheet")]
    MissingAnswerFields,

    #[error("Question paper not found")]
    PaperNotFound,

    #[error("Answer sheet not found")]
    AnswerSheetNotFound,

    #[error("Question paper has submitted answer sheets")]
    PaperHasSubmissions,

    #[error("You have already submitted an answer sheet for this question paper")]
    AlreadySubmitted,

    #[error(transparent)]
    InvalidFile(#[from] FileRejection),

    #[error("Stored file '{0}' could not be decoded")]
    UnreadableFile(String),
}

/// Result of an operation that can be refused
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Accepted { message: String, value: T },
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn accepted(message: impl Into<String>, value: T) -> Self {
        Outcome::Accepted {
            message: message.into(),
            value,
        }
    }

    pub fn rejected(rejection: impl Into<Rejection>) -> Self {
        Outcome::Rejected(rejection.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    /// Human-readable message for either branch
    pub fn message(&self) -> String {
        match self {
            Outcome::Accepted { message, .. } => message.clone(),
            Outcome::Rejected(rejection) => rejection.to_string(),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Accepted { value, .. } => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Accepted { .. } => None,
            Outcome::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn into_result(self) -> Result<T, Rejection> {
        match self {
            Outcome::Accepted { value, .. } => Ok(value),
            Outcome::Rejected(rejection) => Err(rejection),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Accepted { message, value } => Outcome::Accepted {
                message,
                value: f(value),
            },
            Outcome::Rejected(rejection) => Outcome::Rejected(rejection),
        }
    }
}

/// Serializes as `{"success": bool, "message": str, "value"?: T}`
impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Accepted { message, value } => {
                let mut state = serializer.serialize_struct("Outcome", 3)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("message", message)?;
                state.serialize_field("value", value)?;
                state.end()
            }
            Outcome::Rejected(rejection) => {
                let mut state = serializer.serialize_struct("Outcome", 2)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("message", &rejection.to_string())?;
                state.end()
            }
        }
    }
}
