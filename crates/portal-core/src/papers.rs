//! Question paper lifecycle
//!
//! A paper is listed after a teacher uploads it and gone after a teacher
//! deletes it. Papers are never edited. Whether a student has answered a
//! paper is derived from the answer sheets, not stored on the paper.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::attachment::{decode_data_url, Attachment, DownloadedFile};
use crate::models::{generate_id, AnswerSheet, QuestionPaper};
use crate::outcome::{Outcome, Rejection};
use crate::storage::{KeyValueStore, RecordStore, StorageResult};
use crate::validation::validate_file;

/// What deleting a paper does to answer sheets that reference it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Remove the paper only; its answer sheets keep a dangling reference
    #[default]
    Orphan,
    /// Refuse while any answer sheet references the paper
    Block,
    /// Remove the referencing answer sheets, then the paper
    Cascade,
}

impl DeletePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletePolicy::Orphan => "orphan",
            DeletePolicy::Block => "block",
            DeletePolicy::Cascade => "cascade",
        }
    }
}

impl std::fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "orphan" => Ok(DeletePolicy::Orphan),
            "block" => Ok(DeletePolicy::Block),
            "cascade" => Ok(DeletePolicy::Cascade),
            other => Err(format!(
                "Unknown delete policy '{}'. Use 'orphan', 'block' or 'cascade'.",
                other
            )),
        }
    }
}

/// Teacher input for a new paper
#[derive(Debug, Clone)]
pub struct PaperUpload {
    pub title: String,
    pub subject: String,
    pub attachment: Option<Attachment>,
}

/// Result of a successful delete
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPaper {
    pub paper: QuestionPaper,
    /// Answer sheets removed along with the paper (cascade only)
    pub removed_answer_sheets: usize,
    /// Answer sheets left pointing at the removed paper (orphan only)
    pub orphaned_answer_sheets: usize,
}

/// Store a new paper uploaded by `uploaded_by`
pub fn upload<S: KeyValueStore>(
    records: &mut RecordStore<S>,
    uploaded_by: &str,
    upload: PaperUpload,
    max_upload_bytes: u64,
    now: DateTime<Utc>,
) -> StorageResult<Outcome<QuestionPaper>> {
    let attachment = match upload.attachment {
        Some(a) if !upload.title.trim().is_empty() && !upload.subject.trim().is_empty() => a,
        _ => return Ok(Outcome::rejected(Rejection::MissingPaperFields)),
    };

    if let Err(rejection) = validate_file(&attachment.mime_type, attachment.size(), max_upload_bytes)
    {
        return Ok(Outcome::rejected(rejection));
    }

    let existing = records.list::<QuestionPaper>()?;
    let id = generate_id(now, existing.iter().map(|p| p.id.as_str()));

    let paper = QuestionPaper {
        id,
        title: upload.title,
        subject: upload.subject,
        file_name: attachment.file_name.clone(),
        file_data: attachment.to_data_url(),
        uploaded_by: uploaded_by.to_string(),
        upload_date: now,
    };

    records.append(paper.clone())?;
    info!(id = %paper.id, title = %paper.title, uploaded_by, "uploaded question paper");

    Ok(Outcome::accepted("Question paper uploaded successfully!", paper))
}

/// Delete the paper with `id`, handling its answer sheets per `policy`
pub fn delete<S: KeyValueStore>(
    records: &mut RecordStore<S>,
    id: &str,
    policy: DeletePolicy,
) -> StorageResult<Outcome<DeletedPaper>> {
    let Some(paper) = find(records, id)? else {
        return Ok(Outcome::rejected(Rejection::PaperNotFound));
    };

    let referencing = records
        .find_all::<AnswerSheet>(|s| s.question_paper_id == id)?
        .len();

    let mut removed_answer_sheets = 0;
    match policy {
        DeletePolicy::Block if referencing > 0 => {
            return Ok(Outcome::rejected(Rejection::PaperHasSubmissions));
        }
        DeletePolicy::Cascade => {
            removed_answer_sheets = records.remove::<AnswerSheet>(|s| s.question_paper_id == id)?;
        }
        _ => {}
    }

    records.remove::<QuestionPaper>(|p| p.id == id)?;
    info!(id, %policy, removed_answer_sheets, "deleted question paper");

    Ok(Outcome::accepted(
        "Question paper deleted successfully",
        DeletedPaper {
            paper,
            removed_answer_sheets,
            orphaned_answer_sheets: referencing - removed_answer_sheets,
        },
    ))
}

/// All papers, in upload order
pub fn list<S: KeyValueStore>(records: &RecordStore<S>) -> StorageResult<Vec<QuestionPaper>> {
    records.list::<QuestionPaper>()
}

/// Papers uploaded by one teacher
pub fn uploaded_by<S: KeyValueStore>(
    records: &RecordStore<S>,
    username: &str,
) -> StorageResult<Vec<QuestionPaper>> {
    records.find_all::<QuestionPaper>(|p| p.uploaded_by == username)
}

pub fn find<S: KeyValueStore>(
    records: &RecordStore<S>,
    id: &str,
) -> StorageResult<Option<QuestionPaper>> {
    records.find::<QuestionPaper>(|p| p.id == id)
}

/// Whether `username` has submitted an answer sheet for `paper_id`
pub fn is_submitted<S: KeyValueStore>(
    records: &RecordStore<S>,
    paper_id: &str,
    username: &str,
) -> StorageResult<bool> {
    records.any::<AnswerSheet>(|s| s.question_paper_id == paper_id && s.submitted_by == username)
}

/// Decode a paper's stored file
pub fn download<S: KeyValueStore>(
    records: &RecordStore<S>,
    id: &str,
) -> StorageResult<Outcome<DownloadedFile>> {
    let Some(paper) = find(records, id)? else {
        return Ok(Outcome::rejected(Rejection::PaperNotFound));
    };

    Ok(match decode_data_url(&paper.file_data) {
        Ok((mime_type, bytes)) => Outcome::accepted(
            format!("Downloaded: {}", paper.title),
            DownloadedFile {
                file_name: paper.file_name,
                mime_type,
                bytes,
            },
        ),
        Err(e) => {
            tracing::warn!(id, error = %e, "stored question paper file is unreadable");
            Outcome::rejected(Rejection::UnreadableFile(paper.file_name))
        }
    })
}
