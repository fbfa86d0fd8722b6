//! Answer sheet submission
//!
//! A student may submit one answer sheet per question paper. Submissions
//! cannot be edited or withdrawn.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::attachment::{decode_data_url, Attachment, DownloadedFile};
use crate::models::{generate_id, AnswerSheet};
use crate::outcome::{Outcome, Rejection};
use crate::papers;
use crate::storage::{KeyValueStore, RecordStore, StorageResult};
use crate::validation::validate_file;

/// Student input for an answer sheet
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub question_paper_id: String,
    pub attachment: Option<Attachment>,
}

/// Submit an answer sheet on behalf of `submitted_by`
///
/// The paper's current title is copied onto the sheet; later changes to
/// the paper do not reach it.
pub fn submit<S: KeyValueStore>(
    records: &mut RecordStore<S>,
    submitted_by: &str,
    submission: AnswerSubmission,
    max_upload_bytes: u64,
    now: DateTime<Utc>,
) -> StorageResult<Outcome<AnswerSheet>> {
    let paper_id = submission.question_paper_id.trim();
    let attachment = match submission.attachment {
        Some(a) if !paper_id.is_empty() => a,
        _ => return Ok(Outcome::rejected(Rejection::MissingAnswerFields)),
    };

    let Some(paper) = papers::find(records, paper_id)? else {
        return Ok(Outcome::rejected(Rejection::PaperNotFound));
    };

    let existing = records.list::<AnswerSheet>()?;
    if existing
        .iter()
        .any(|s| s.question_paper_id == paper.id && s.submitted_by == submitted_by)
    {
        return Ok(Outcome::rejected(Rejection::AlreadySubmitted));
    }

    if let Err(rejection) = validate_file(&attachment.mime_type, attachment.size(), max_upload_bytes)
    {
        return Ok(Outcome::rejected(rejection));
    }

    let sheet = AnswerSheet {
        id: generate_id(now, existing.iter().map(|s| s.id.as_str())),
        question_paper_id: paper.id,
        question_paper_title: paper.title,
        file_name: attachment.file_name.clone(),
        file_data: attachment.to_data_url(),
        submitted_by: submitted_by.to_string(),
        submission_date: now,
    };

    records.append(sheet.clone())?;
    info!(
        id = %sheet.id,
        paper_id = %sheet.question_paper_id,
        submitted_by,
        "submitted answer sheet"
    );

    Ok(Outcome::accepted("Answer sheet uploaded successfully!", sheet))
}

/// A student's own answer sheets, in submission order
pub fn submitted_by<S: KeyValueStore>(
    records: &RecordStore<S>,
    username: &str,
) -> StorageResult<Vec<AnswerSheet>> {
    records.find_all::<AnswerSheet>(|s| s.submitted_by == username)
}

/// Answer sheets referencing one paper
pub fn for_paper<S: KeyValueStore>(
    records: &RecordStore<S>,
    paper_id: &str,
) -> StorageResult<Vec<AnswerSheet>> {
    records.find_all::<AnswerSheet>(|s| s.question_paper_id == paper_id)
}

pub fn find<S: KeyValueStore>(
    records: &RecordStore<S>,
    id: &str,
) -> StorageResult<Option<AnswerSheet>> {
    records.find::<AnswerSheet>(|s| s.id == id)
}

/// Decode an answer sheet's stored file
pub fn download(sheet: &AnswerSheet) -> Outcome<DownloadedFile> {
    match decode_data_url(&sheet.file_data) {
        Ok((mime_type, bytes)) => Outcome::accepted(
            format!("Downloaded: {}", sheet.file_name),
            DownloadedFile {
                file_name: sheet.file_name.clone(),
                mime_type,
                bytes,
            },
        ),
        Err(e) => {
            tracing::warn!(id = %sheet.id, error = %e, "stored answer sheet file is unreadable");
            Outcome::rejected(Rejection::UnreadableFile(sheet.file_name.clone()))
        }
    }
}
