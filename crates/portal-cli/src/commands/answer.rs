//! Answer sheet command handlers

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Result};
use serde_json::json;

use portal_core::{AnswerSubmission, Attachment, Outcome, Portal, Rejection, Role};

use crate::commands::save_download;
use crate::output::{answer_sheet_json, Output};

/// Submit an answer sheet for a question paper
pub fn submit(
    portal: &mut Portal,
    paper_id: String,
    file: &Path,
    output: &Output,
) -> Result<ExitCode> {
    let submission = AnswerSubmission {
        question_paper_id: paper_id,
        attachment: Some(Attachment::from_path(file)?),
    };

    match portal.submit_answer(submission)? {
        Outcome::Accepted { message, value } => {
            output.accepted(&message, Some(&value.id), answer_sheet_json(&value));
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Rejected(rejection) => Ok(output.rejected(&rejection)),
    }
}

/// List answer sheets
///
/// Students see their own sheets, optionally narrowed to one paper.
/// Teachers must name the paper.
pub fn list(portal: &Portal, paper: Option<&str>, output: &Output) -> Result<ExitCode> {
    let Some(session) = portal.current_session()? else {
        return Ok(output.rejected(&Rejection::NotLoggedIn));
    };

    let outcome = match (session.role, paper) {
        (Role::Student, _) => portal.my_answer_sheets()?.map(|sheets| {
            sheets
                .into_iter()
                .filter(|s| paper.map_or(true, |id| s.question_paper_id == id))
                .collect::<Vec<_>>()
        }),
        (Role::Teacher, Some(id)) => portal.answer_sheets_for_paper(id)?,
        (Role::Teacher, None) => {
            bail!("Teachers must choose a question paper: portal answer list --paper <id>")
        }
    };

    match outcome {
        Outcome::Accepted { value, .. } => {
            output.print_answer_sheets(&value);
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Rejected(rejection) => Ok(output.rejected(&rejection)),
    }
}

/// Save an answer sheet's file to disk
pub fn download(
    portal: &Portal,
    id: &str,
    target: Option<PathBuf>,
    output: &Output,
) -> Result<ExitCode> {
    match portal.download_answer_sheet(id)? {
        Outcome::Accepted { message, value } => {
            let path = save_download(&value, target)?;
            output.accepted(
                &format!("{} -> {}", message, path.display()),
                Some(&path.display().to_string()),
                json!({"path": path, "mimeType": value.mime_type, "size": value.bytes.len()}),
            );
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Rejected(rejection) => Ok(output.rejected(&rejection)),
    }
}
