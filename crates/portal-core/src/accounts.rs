//! Account registration and login
//!
//! Uniqueness of usernames and emails is checked here, at registration
//! time, and nowhere else.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{Account, NewAccount, Role};
use crate::outcome::{Outcome, Rejection};
use crate::storage::{KeyValueStore, RecordStore, StorageResult};
use crate::validation::{is_valid_email, validate_password, MIN_USERNAME_LEN};

/// Register a new account
///
/// Usernames and emails are compared exactly (case-sensitive). The
/// username check runs first.
pub fn register<S: KeyValueStore>(
    records: &mut RecordStore<S>,
    candidate: NewAccount,
    now: DateTime<Utc>,
) -> StorageResult<Outcome<Account>> {
    let users = records.list::<Account>()?;

    if users.iter().any(|u| u.username == candidate.username) {
        return Ok(Outcome::rejected(Rejection::UsernameTaken));
    }
    if users.iter().any(|u| u.email == candidate.email) {
        return Ok(Outcome::rejected(Rejection::EmailTaken));
    }

    let account = candidate.into_account(now);
    records.append(account.clone())?;
    info!(username = %account.username, role = %account.role, "registered account");

    Ok(Outcome::accepted("Account created successfully", account))
}

/// Check credentials for a role
///
/// All three fields must match one account. A miss on any of them yields
/// the same rejection.
pub fn validate_login<S: KeyValueStore>(
    records: &RecordStore<S>,
    username: &str,
    password: &str,
    role: Role,
) -> StorageResult<Outcome<Account>> {
    let found = records.find::<Account>(|u| {
        u.username == username && u.password == password && u.role == role
    })?;

    Ok(match found {
        Some(account) => Outcome::accepted("Login successful", account),
        None => Outcome::rejected(Rejection::InvalidCredentials),
    })
}

/// One failing form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every failing field of a registration form, in form order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormErrors {
    pub errors: Vec<FieldError>,
}

impl FormErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message for a single field, if it failed
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Raw registration input as a user typed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationForm {
    pub role: Role,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Check every field, collecting one message per failing field
    pub fn validate(&self) -> Result<NewAccount, FormErrors> {
        let mut errors = FormErrors::default();

        if self.full_name.trim().is_empty() {
            errors.push("fullName", "Full name is required");
        }

        if self.username.trim().is_empty() {
            errors.push("username", "Username is required");
        } else if self.username.chars().count() < MIN_USERNAME_LEN {
            errors.push(
                "username",
                format!("Username must be at least {} characters", MIN_USERNAME_LEN),
            );
        }

        if self.email.trim().is_empty() {
            errors.push("email", "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.push("email", "Please enter a valid email address");
        }

        let password = validate_password(&self.password);
        if !password.valid {
            errors.push("password", password.message);
        }

        if self.password != self.confirm_password {
            errors.push("confirmPassword", "Passwords do not match");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewAccount::new(
            self.role,
            self.username.clone(),
            self.password.clone(),
            self.email.clone(),
            self.full_name.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> RecordStore<MemoryStore> {
        RecordStore::new(MemoryStore::new())
    }

    fn student(username: &str, email: &str) -> NewAccount {
        NewAccount::new(Role::Student, username, "secret1", email, "Some Student")
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            role: Role::Teacher,
            full_name: "Ada Teacher".to_string(),
            username: "ada".to_string(),
            email: "ada@school.org".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    #[test]
    fn test_register_success() {
        let mut records = store();
        let now = Utc::now();

        let outcome = register(&mut records, student("alice", "a@b.com"), now).unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.message(), "Account created successfully");

        let users = records.list::<Account>().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].created_at, now);
    }

    #[test]
    fn test_register_duplicate_username() {
        let mut records = store();
        register(&mut records, student("alice", "a@b.com"), Utc::now()).unwrap();

        let outcome = register(&mut records, student("alice", "other@b.com"), Utc::now()).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.rejection(), Some(&Rejection::UsernameTaken));
        assert_eq!(records.count::<Account>().unwrap(), 1);
    }

    #[test]
    fn test_register_username_is_case_sensitive() {
        let mut records = store();
        register(&mut records, student("alice", "a@b.com"), Utc::now()).unwrap();

        let outcome = register(&mut records, student("Alice", "c@d.com"), Utc::now()).unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn test_register_duplicate_email() {
        let mut records = store();
        register(&mut records, student("alice", "a@b.com"), Utc::now()).unwrap();

        let outcome = register(&mut records, student("bob", "a@b.com"), Utc::now()).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "Email already exists");
    }

    #[test]
    fn test_register_username_checked_before_email() {
        let mut records = store();
        register(&mut records, student("alice", "a@b.com"), Utc::now()).unwrap();

        let outcome = register(&mut records, student("alice", "a@b.com"), Utc::now()).unwrap();
        assert_eq!(outcome.message(), "Username already exists");
    }

    #[test]
    fn test_login_success() {
        let mut records = store();
        register(&mut records, student("alice", "a@b.com"), Utc::now()).unwrap();

        let outcome = validate_login(&records, "alice", "secret1", Role::Student).unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.message(), "Login successful");
        assert_eq!(outcome.value().unwrap().email, "a@b.com");
    }

    #[test]
    fn test_login_failures_share_one_message() {
        let mut records = store();
        register(&mut records, student("alice", "a@b.com"), Utc::now()).unwrap();

        let wrong_password = validate_login(&records, "alice", "nope", Role::Student).unwrap();
        let unknown_user = validate_login(&records, "zed", "secret1", Role::Student).unwrap();
        let wrong_role = validate_login(&records, "alice", "secret1", Role::Teacher).unwrap();

        for outcome in [wrong_password, unknown_user, wrong_role] {
            assert!(!outcome.is_success());
            assert_eq!(outcome.message(), "Invalid username or password");
        }
    }

    #[test]
    fn test_form_valid() {
        let account = form().validate().unwrap();
        assert_eq!(account.username, "ada");
        assert_eq!(account.role, Role::Teacher);
    }

    #[test]
    fn test_form_collects_every_error() {
        let bad = RegistrationForm {
            role: Role::Student,
            full_name: "   ".to_string(),
            username: "ab".to_string(),
            email: "not-an-email".to_string(),
            password: "abc".to_string(),
            confirm_password: "abd".to_string(),
        };

        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.errors.len(), 5);
        assert_eq!(errors.get("fullName"), Some("Full name is required"));
        assert_eq!(
            errors.get("username"),
            Some("Username must be at least 3 characters")
        );
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));
    }

    #[test]
    fn test_form_required_fields() {
        let mut empty = form();
        empty.username.clear();
        empty.email.clear();

        let errors = empty.validate().unwrap_err();
        assert_eq!(errors.get("username"), Some("Username is required"));
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert!(errors.to_string().contains("Username is required; Email is required"));
    }
}
