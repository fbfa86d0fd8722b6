//! Unified portal interface
//!
//! `Portal` is the main entry point. It wires the configuration, the
//! key-value backend, the record store and the session marker together,
//! and applies the role guards before any teacher or student action.
//!
//! ## Usage
//!
//! ```ignore
//! let mut portal = Portal::open()?;
//!
//! portal.login("mr_t", "secret1", Role::Teacher)?;
//! let upload = PaperUpload { title, subject, attachment: Some(file) };
//! let outcome = portal.upload_paper(upload)?;
//! println!("{}", outcome.message());
//! ```

use anyhow::{Context, Result};
use chrono::Utc;

use crate::accounts::{self, RegistrationForm};
use crate::attachment::DownloadedFile;
use crate::config::Config;
use crate::models::{Account, AnswerSheet, NewAccount, QuestionPaper, Role};
use crate::outcome::{Outcome, Rejection};
use crate::papers::{self, DeletePolicy, DeletedPaper, PaperUpload};
use crate::session::{self, Session};
use crate::storage::{FileStore, KeyValueStore, RecordStore};
use crate::submissions::{self, AnswerSubmission};

/// Rejects with the outcome when the session guard fails
macro_rules! guard {
    ($check:expr) => {
        match $check {
            Ok(session) => session,
            Err(rejection) => return Ok(Outcome::rejected(rejection)),
        }
    };
}

/// A question paper together with the current student's submission state
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperStatus {
    #[serde(flatten)]
    pub paper: QuestionPaper,
    pub submitted: bool,
}

/// Size and record counts of a file-backed portal
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub store_dir: std::path::PathBuf,
    pub total_size: u64,
    pub accounts: usize,
    pub question_papers: usize,
    pub answer_sheets: usize,
}

/// The portal over some key-value backend
pub struct Portal<S: KeyValueStore = FileStore> {
    records: RecordStore<S>,
    config: Config,
}

impl Portal<FileStore> {
    /// Open the portal with the configuration from the default location
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(config)
    }

    /// Open the portal with a specific configuration
    pub fn open_with_config(config: Config) -> Result<Self> {
        let backend = FileStore::open(config.store_dir()).context("Failed to open store")?;
        Ok(Self::with_backend(backend, config))
    }

    /// Size and counts of the store on disk
    pub fn storage_stats(&self) -> Result<StorageStats> {
        let backend = self.records.backend();
        Ok(StorageStats {
            store_dir: backend.root().to_path_buf(),
            total_size: backend
                .total_size()
                .context("Failed to measure store size")?,
            accounts: self.records.count::<Account>()?,
            question_papers: self.records.count::<QuestionPaper>()?,
            answer_sheets: self.records.count::<AnswerSheet>()?,
        })
    }
}

impl<S: KeyValueStore> Portal<S> {
    /// Build a portal over any backend
    pub fn with_backend(backend: S, config: Config) -> Self {
        Self {
            records: RecordStore::new(backend),
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the underlying record store
    pub fn records(&self) -> &RecordStore<S> {
        &self.records
    }

    // ==================== Accounts ====================

    /// Register an account (duplicate checks only)
    pub fn register(&mut self, account: NewAccount) -> Result<Outcome<Account>> {
        accounts::register(&mut self.records, account, Utc::now())
            .context("Failed to register account")
    }

    /// Validate a registration form, then register it
    pub fn register_form(&mut self, form: &RegistrationForm) -> Result<Outcome<Account>> {
        match form.validate() {
            Ok(account) => self.register(account),
            Err(errors) => Ok(Outcome::rejected(Rejection::InvalidForm(errors))),
        }
    }

    /// Check credentials and, on success, start a session
    pub fn login(&mut self, username: &str, password: &str, role: Role) -> Result<Outcome<Account>> {
        let outcome = accounts::validate_login(&self.records, username, password, role)
            .context("Failed to read accounts")?;

        if let Some(account) = outcome.value() {
            session::login(
                self.records.backend_mut(),
                account.role,
                &account.username,
                &account.full_name,
            )
            .context("Failed to record session")?;
        }
        Ok(outcome)
    }

    /// End the current session
    pub fn logout(&mut self) -> Result<()> {
        session::logout(self.records.backend_mut()).context("Failed to clear session")
    }

    /// The logged-in user, if any
    pub fn current_session(&self) -> Result<Option<Session>> {
        session::current(self.records.backend()).context("Failed to read session")
    }

    /// Whether someone is logged in with `role`
    pub fn is_authenticated(&self, role: Role) -> Result<bool> {
        session::is_authenticated(self.records.backend(), role).context("Failed to read session")
    }

    fn require(&self, role: Role) -> Result<Result<Session, Rejection>> {
        session::require(self.records.backend(), role).context("Failed to read session")
    }

    /// Any logged-in user
    fn require_any(&self) -> Result<Result<Session, Rejection>> {
        Ok(self
            .current_session()?
            .ok_or(Rejection::NotLoggedIn))
    }

    // ==================== Question Papers ====================

    /// Upload a question paper as the logged-in teacher
    pub fn upload_paper(&mut self, upload: PaperUpload) -> Result<Outcome<QuestionPaper>> {
        let teacher = guard!(self.require(Role::Teacher)?);
        papers::upload(
            &mut self.records,
            &teacher.username,
            upload,
            self.config.max_upload_bytes,
            Utc::now(),
        )
        .context("Failed to upload question paper")
    }

    /// Delete a question paper using the configured delete policy
    pub fn delete_paper(&mut self, id: &str) -> Result<Outcome<DeletedPaper>> {
        let policy = self.config.delete_policy;
        self.delete_paper_with(id, policy)
    }

    /// Delete a question paper with an explicit delete policy
    pub fn delete_paper_with(
        &mut self,
        id: &str,
        policy: DeletePolicy,
    ) -> Result<Outcome<DeletedPaper>> {
        guard!(self.require(Role::Teacher)?);
        papers::delete(&mut self.records, id, policy).context("Failed to delete question paper")
    }

    /// All question papers
    pub fn list_papers(&self) -> Result<Vec<QuestionPaper>> {
        papers::list(&self.records).context("Failed to get question papers")
    }

    /// Question papers uploaded by the logged-in teacher
    pub fn my_papers(&self) -> Result<Outcome<Vec<QuestionPaper>>> {
        let teacher = guard!(self.require(Role::Teacher)?);
        let mine = papers::uploaded_by(&self.records, &teacher.username)
            .context("Failed to get question papers")?;
        Ok(Outcome::accepted(format!("{} question paper(s)", mine.len()), mine))
    }

    /// Get a question paper by ID
    pub fn paper(&self, id: &str) -> Result<Option<QuestionPaper>> {
        papers::find(&self.records, id).context("Failed to get question paper")
    }

    /// Every paper, marked with whether the logged-in student answered it
    pub fn papers_for_student(&self) -> Result<Outcome<Vec<PaperStatus>>> {
        let student = guard!(self.require(Role::Student)?);
        let sheets = submissions::submitted_by(&self.records, &student.username)
            .context("Failed to get answer sheets")?;

        let statuses: Vec<PaperStatus> = self
            .list_papers()?
            .into_iter()
            .map(|paper| {
                let submitted = sheets.iter().any(|s| s.question_paper_id == paper.id);
                PaperStatus { paper, submitted }
            })
            .collect();

        Ok(Outcome::accepted(
            format!("{} question paper(s)", statuses.len()),
            statuses,
        ))
    }

    /// Whether the logged-in student has answered `paper_id`
    pub fn has_submitted(&self, paper_id: &str) -> Result<Outcome<bool>> {
        let student = guard!(self.require(Role::Student)?);
        let submitted = papers::is_submitted(&self.records, paper_id, &student.username)
            .context("Failed to get answer sheets")?;
        let message = if submitted { "Submitted" } else { "Not submitted" };
        Ok(Outcome::accepted(message, submitted))
    }

    /// Decode a question paper's file for any logged-in user
    pub fn download_paper(&self, id: &str) -> Result<Outcome<DownloadedFile>> {
        guard!(self.require_any()?);
        papers::download(&self.records, id).context("Failed to download question paper")
    }

    // ==================== Answer Sheets ====================

    /// Submit an answer sheet as the logged-in student
    pub fn submit_answer(&mut self, submission: AnswerSubmission) -> Result<Outcome<AnswerSheet>> {
        let student = guard!(self.require(Role::Student)?);
        submissions::submit(
            &mut self.records,
            &student.username,
            submission,
            self.config.max_upload_bytes,
            Utc::now(),
        )
        .context("Failed to submit answer sheet")
    }

    /// The logged-in student's answer sheets
    pub fn my_answer_sheets(&self) -> Result<Outcome<Vec<AnswerSheet>>> {
        let student = guard!(self.require(Role::Student)?);
        let sheets = submissions::submitted_by(&self.records, &student.username)
            .context("Failed to get answer sheets")?;
        Ok(Outcome::accepted(format!("{} answer sheet(s)", sheets.len()), sheets))
    }

    /// Answer sheets submitted for one paper (teachers only)
    pub fn answer_sheets_for_paper(&self, paper_id: &str) -> Result<Outcome<Vec<AnswerSheet>>> {
        guard!(self.require(Role::Teacher)?);
        let sheets =
            submissions::for_paper(&self.records, paper_id).context("Failed to get answer sheets")?;
        Ok(Outcome::accepted(format!("{} answer sheet(s)", sheets.len()), sheets))
    }

    /// Decode an answer sheet's file
    ///
    /// Teachers may fetch any sheet; students only their own.
    pub fn download_answer_sheet(&self, id: &str) -> Result<Outcome<DownloadedFile>> {
        let session = guard!(self.require_any()?);
        let Some(sheet) =
            submissions::find(&self.records, id).context("Failed to get answer sheet")?
        else {
            return Ok(Outcome::rejected(Rejection::AnswerSheetNotFound));
        };

        if session.role == Role::Student && sheet.submitted_by != session.username {
            return Ok(Outcome::rejected(Rejection::AnswerSheetNotFound));
        }
        Ok(submissions::download(&sheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::Attachment;
    use crate::storage::MemoryStore;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn memory_portal() -> Portal<MemoryStore> {
        Portal::with_backend(MemoryStore::new(), Config::default())
    }

    fn pdf() -> Attachment {
        Attachment::new("exam.pdf", "application/pdf", b"%PDF-1.7".to_vec())
    }

    fn seed_accounts<S: KeyValueStore>(portal: &mut Portal<S>) {
        portal
            .register(NewAccount::new(Role::Teacher, "mr_t", "secret1", "t@school.org", "Mr T"))
            .unwrap();
        portal
            .register(NewAccount::new(Role::Student, "alice", "secret2", "a@school.org", "Alice"))
            .unwrap();
        portal
            .register(NewAccount::new(Role::Student, "bob", "secret3", "b@school.org", "Bob"))
            .unwrap();
    }

    fn upload_as_teacher<S: KeyValueStore>(portal: &mut Portal<S>, title: &str) -> QuestionPaper {
        portal.login("mr_t", "secret1", Role::Teacher).unwrap();
        portal
            .upload_paper(PaperUpload {
                title: title.to_string(),
                subject: "Physics".to_string(),
                attachment: Some(pdf()),
            })
            .unwrap()
            .into_result()
            .unwrap()
    }

    fn submit_as<S: KeyValueStore>(
        portal: &mut Portal<S>,
        username: &str,
        password: &str,
        paper_id: &str,
    ) -> Outcome<AnswerSheet> {
        portal.login(username, password, Role::Student).unwrap();
        portal
            .submit_answer(AnswerSubmission {
                question_paper_id: paper_id.to_string(),
                attachment: Some(pdf()),
            })
            .unwrap()
    }

    #[test]
    fn test_login_sets_session() {
        let mut portal = memory_portal();
        seed_accounts(&mut portal);

        assert!(portal.current_session().unwrap().is_none());

        let outcome = portal.login("alice", "secret2", Role::Student).unwrap();
        assert!(outcome.is_success());

        let session = portal.current_session().unwrap().unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.full_name.as_deref(), Some("Alice"));
        assert!(portal.is_authenticated(Role::Student).unwrap());
    }

    #[test]
    fn test_failed_login_keeps_previous_session() {
        let mut portal = memory_portal();
        seed_accounts(&mut portal);
        portal.login("alice", "secret2", Role::Student).unwrap();

        let outcome = portal.login("bob", "wrong", Role::Student).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(portal.current_session().unwrap().unwrap().username, "alice");
    }

    #[test]
    fn test_logout() {
        let mut portal = memory_portal();
        seed_accounts(&mut portal);
        portal.login("alice", "secret2", Role::Student).unwrap();

        portal.logout().unwrap();
        assert!(portal.current_session().unwrap().is_none());
    }

    #[test]
    fn test_register_form_rejects_invalid_input() {
        let mut portal = memory_portal();
        let form = RegistrationForm {
            role: Role::Student,
            full_name: "Carol".to_string(),
            username: "carol".to_string(),
            email: "carol-at-school".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        };

        let outcome = portal.register_form(&form).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "Please enter a valid email address");
        assert_eq!(portal.records().count::<Account>().unwrap(), 0);
    }

    #[test]
    fn test_upload_requires_teacher() {
        let mut portal = memory_portal();
        seed_accounts(&mut portal);

        let upload = PaperUpload {
            title: "Quiz".to_string(),
            subject: "Physics".to_string(),
            attachment: Some(pdf()),
        };

        // No session
        let outcome = portal.upload_paper(upload.clone()).unwrap();
        assert_eq!(outcome.rejection(), Some(&Rejection::NotAuthorized(Role::Teacher)));

        // Student session
        portal.login("alice", "secret2", Role::Student).unwrap();
        let outcome = portal.upload_paper(upload).unwrap();
        assert!(!outcome.is_success());
        assert!(portal.list_papers().unwrap().is_empty());
    }

    #[test]
    fn test_full_workflow() {
        let mut portal = memory_portal();
        seed_accounts(&mut portal);

        let paper = upload_as_teacher(&mut portal, "Quiz 1");
        assert_eq!(paper.uploaded_by, "mr_t");

        let first = submit_as(&mut portal, "alice", "secret2", &paper.id);
        assert!(first.is_success());

        let statuses = portal.papers_for_student().unwrap().into_result().unwrap();
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].submitted);
        assert!(portal.has_submitted(&paper.id).unwrap().into_result().unwrap());

        let again = submit_as(&mut portal, "alice", "secret2", &paper.id);
        assert_eq!(again.rejection(), Some(&Rejection::AlreadySubmitted));

        let bob = submit_as(&mut portal, "bob", "secret3", &paper.id);
        assert!(bob.is_success());
        assert!(!portal.papers_for_student().unwrap().into_result().unwrap().is_empty());

        portal.login("mr_t", "secret1", Role::Teacher).unwrap();
        let sheets = portal
            .answer_sheets_for_paper(&paper.id)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(sheets.len(), 2);
    }

    #[test]
    fn test_student_cannot_delete_paper() {
        let mut portal = memory_portal();
        seed_accounts(&mut portal);
        let paper = upload_as_teacher(&mut portal, "Quiz 1");

        portal.login("alice", "secret2", Role::Student).unwrap();
        let outcome = portal.delete_paper(&paper.id).unwrap();
        assert_eq!(outcome.rejection(), Some(&Rejection::NotAuthorized(Role::Teacher)));
        assert_eq!(portal.list_papers().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_uses_configured_policy() {
        let config = Config {
            delete_policy: DeletePolicy::Block,
            ..Config::default()
        };
        let mut portal = Portal::with_backend(MemoryStore::new(), config);
        seed_accounts(&mut portal);

        let paper = upload_as_teacher(&mut portal, "Quiz 1");
        submit_as(&mut portal, "alice", "secret2", &paper.id);

        portal.login("mr_t", "secret1", Role::Teacher).unwrap();
        let blocked = portal.delete_paper(&paper.id).unwrap();
        assert_eq!(blocked.rejection(), Some(&Rejection::PaperHasSubmissions));

        let cascaded = portal
            .delete_paper_with(&paper.id, DeletePolicy::Cascade)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(cascaded.removed_answer_sheets, 1);
        assert!(portal.list_papers().unwrap().is_empty());
    }

    #[test]
    fn test_students_only_download_own_sheets() {
        let mut portal = memory_portal();
        seed_accounts(&mut portal);
        let paper = upload_as_teacher(&mut portal, "Quiz 1");
        let sheet = submit_as(&mut portal, "alice", "secret2", &paper.id)
            .into_result()
            .unwrap();

        let own = portal.download_answer_sheet(&sheet.id).unwrap();
        assert!(own.is_success());

        portal.login("bob", "secret3", Role::Student).unwrap();
        let other = portal.download_answer_sheet(&sheet.id).unwrap();
        assert_eq!(other.rejection(), Some(&Rejection::AnswerSheetNotFound));

        portal.login("mr_t", "secret1", Role::Teacher).unwrap();
        let file = portal
            .download_answer_sheet(&sheet.id)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(file.bytes, b"%PDF-1.7");
    }

    #[test]
    fn test_download_paper_requires_login() {
        let mut portal = memory_portal();
        seed_accounts(&mut portal);
        let paper = upload_as_teacher(&mut portal, "Quiz 1");

        portal.logout().unwrap();
        let outcome = portal.download_paper(&paper.id).unwrap();
        assert_eq!(outcome.rejection(), Some(&Rejection::NotLoggedIn));

        portal.login("bob", "secret3", Role::Student).unwrap();
        let file = portal.download_paper(&paper.id).unwrap().into_result().unwrap();
        assert_eq!(file.file_name, "exam.pdf");
    }

    #[test]
    fn test_my_papers_and_sheets() {
        let mut portal = memory_portal();
        seed_accounts(&mut portal);
        let paper = upload_as_teacher(&mut portal, "Quiz 1");

        let mine = portal.my_papers().unwrap().into_result().unwrap();
        assert_eq!(mine, vec![paper.clone()]);

        submit_as(&mut portal, "alice", "secret2", &paper.id);
        let sheets = portal.my_answer_sheets().unwrap().into_result().unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].question_paper_title, "Quiz 1");
    }

    #[test]
    fn test_file_portal_persists_across_opens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        {
            let mut portal = Portal::open_with_config(config.clone()).unwrap();
            seed_accounts(&mut portal);
            upload_as_teacher(&mut portal, "Persistent Paper");
        }

        let portal = Portal::open_with_config(config).unwrap();
        let papers = portal.list_papers().unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].title, "Persistent Paper");

        // Session survives too
        let session = portal.current_session().unwrap().unwrap();
        assert_eq!(session.role, Role::Teacher);

        let stats = portal.storage_stats().unwrap();
        assert_eq!(stats.accounts, 3);
        assert_eq!(stats.question_papers, 1);
        assert_eq!(stats.answer_sheets, 0);
        assert!(stats.total_size > 0);
    }

    #[test]
    fn test_file_portal_survives_corrupt_collection() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        std::fs::create_dir_all(config.store_dir()).unwrap();
        std::fs::write(config.store_dir().join("questionPapers"), "not json").unwrap();

        let portal = Portal::open_with_config(config).unwrap();
        assert!(portal.list_papers().unwrap().is_empty());
    }
}
