//! Exam Portal Core Library
//!
//! This crate provides the core functionality for the exam portal, a
//! local-first system where teachers publish question papers and students
//! submit answer sheets against them.
//!
//! # Architecture
//!
//! - **Key-value backend**: a flat string namespace, one file per key
//! - **Records**: users, question papers and answer sheets, each a JSON
//!   array stored under a single key
//! - **Session marker**: three keys naming the logged-in user
//!
//! Every mutation rewrites the whole collection it touches.
//!
//! # Quick Start
//!
//! ```text
//! let mut portal = Portal::open()?;
//!
//! portal.login("alice", "secret", Role::Student)?;
//! let submission = AnswerSubmission {
//!     question_paper_id: paper_id,
//!     attachment: Some(Attachment::from_path(path)?),
//! };
//! let outcome = portal.submit_answer(submission)?;
//! println!("{}", outcome.message());
//! ```
//!
//! # Modules
//!
//! - `portal`: Unified portal interface (main entry point)
//! - `models`: Accounts, question papers and answer sheets
//! - `accounts`: Registration and login
//! - `papers`: Question paper upload, listing and deletion
//! - `submissions`: Answer sheet submission
//! - `session`: Persisted login marker
//! - `validation`: Email, password and file checks
//! - `attachment`: Files and their data URL encoding
//! - `outcome`: Accepted/rejected operation results
//! - `storage`: Key-value backends and typed record collections
//! - `config`: Application configuration

pub mod accounts;
pub mod attachment;
pub mod config;
pub mod models;
pub mod outcome;
pub mod papers;
pub mod portal;
pub mod session;
pub mod storage;
pub mod submissions;
pub mod validation;

pub use accounts::{FieldError, FormErrors, RegistrationForm};
pub use attachment::{Attachment, DownloadedFile};
pub use config::Config;
pub use models::{Account, AnswerSheet, NewAccount, QuestionPaper, Role};
pub use outcome::{Outcome, Rejection};
pub use papers::{DeletePolicy, DeletedPaper, PaperUpload};
pub use portal::{PaperStatus, Portal, StorageStats};
pub use session::Session;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};
pub use submissions::AnswerSubmission;
pub use validation::{FileRejection, Validation};
