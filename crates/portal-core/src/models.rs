//! Data models for the portal
//!
//! Defines the stored records: Account, QuestionPaper and AnswerSheet.
//! Field names on disk are camelCase so existing stores stay readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::storage::{Collection, Record};

/// The two account kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            other => Err(format!(
                "Unknown role '{}'. Use 'student' or 'teacher'.",
                other
            )),
        }
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique login name
    pub username: String,
    /// Stored and compared as given
    pub password: String,
    /// Unique contact address
    pub email: String,
    pub full_name: String,
    #[serde(rename = "userType")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Record for Account {
    const COLLECTION: Collection = Collection::Users;
}

/// An account as submitted for registration, before it is stamped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl NewAccount {
    pub fn new(
        role: Role,
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            email: email.into(),
            full_name: full_name.into(),
            role,
        }
    }

    /// Stamp the account with its creation time
    pub fn into_account(self, created_at: DateTime<Utc>) -> Account {
        Account {
            username: self.username,
            password: self.password,
            email: self.email,
            full_name: self.full_name,
            role: self.role,
            created_at,
        }
    }
}

/// A question paper uploaded by a teacher
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPaper {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub file_name: String,
    /// Base64 data URL of the file content
    pub file_data: String,
    /// Username of the uploading teacher
    pub uploaded_by: String,
    pub upload_date: DateTime<Utc>,
}

impl Record for QuestionPaper {
    const COLLECTION: Collection = Collection::QuestionPapers;
}

/// A student's answer to one question paper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSheet {
    pub id: String,
    pub question_paper_id: String,
    /// Title of the paper when the answer was submitted
    pub question_paper_title: String,
    pub file_name: String,
    /// Base64 data URL of the file content
    pub file_data: String,
    pub submitted_by: String,
    pub submission_date: DateTime<Utc>,
}

impl Record for AnswerSheet {
    const COLLECTION: Collection = Collection::AnswerSheets;
}

/// Generate a record id from the creation time
///
/// The id is the Unix time in milliseconds. When that value is already
/// taken it is bumped until it is free.
pub fn generate_id<'a>(now: DateTime<Utc>, taken: impl IntoIterator<Item = &'a str>) -> String {
    let taken: std::collections::HashSet<&str> = taken.into_iter().collect();
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = millis.to_string();
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        millis += 1;
    }
}
