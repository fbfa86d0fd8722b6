//! Question paper command handlers

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use serde_json::json;

use portal_core::{Attachment, DeletePolicy, Outcome, PaperUpload, Portal, Rejection, Role};

use crate::commands::save_download;
use crate::output::{paper_json, Output, OutputFormat};
use crate::prompt::confirm;

/// Upload a question paper
pub fn upload(
    portal: &mut Portal,
    title: String,
    subject: String,
    file: &Path,
    output: &Output,
) -> Result<ExitCode> {
    let upload = PaperUpload {
        title,
        subject,
        attachment: Some(Attachment::from_path(file)?),
    };

    match portal.upload_paper(upload)? {
        Outcome::Accepted { message, value } => {
            output.accepted(&message, Some(&value.id), paper_json(&value));
            if output.format == OutputFormat::Human {
                output.print_paper(&value);
            }
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Rejected(rejection) => Ok(output.rejected(&rejection)),
    }
}

/// List question papers
///
/// Students see every paper with whether they have answered it.
/// Teachers see every paper, or with `mine` only their own.
pub fn list(portal: &Portal, mine: bool, output: &Output) -> Result<ExitCode> {
    let Some(session) = portal.current_session()? else {
        return Ok(output.rejected(&Rejection::NotLoggedIn));
    };

    match session.role {
        Role::Student => match portal.papers_for_student()? {
            Outcome::Accepted { value, .. } => output.print_paper_statuses(&value),
            Outcome::Rejected(rejection) => return Ok(output.rejected(&rejection)),
        },
        Role::Teacher if mine => match portal.my_papers()? {
            Outcome::Accepted { value, .. } => output.print_papers(&value),
            Outcome::Rejected(rejection) => return Ok(output.rejected(&rejection)),
        },
        Role::Teacher => output.print_papers(&portal.list_papers()?),
    }

    Ok(ExitCode::SUCCESS)
}

/// Save a question paper's file to disk
pub fn download(
    portal: &Portal,
    id: &str,
    target: Option<PathBuf>,
    output: &Output,
) -> Result<ExitCode> {
    match portal.download_paper(id)? {
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

/// Delete a question paper
pub fn delete(
    portal: &mut Portal,
    id: &str,
    policy: Option<DeletePolicy>,
    output: &Output,
) -> Result<ExitCode> {
    let policy = policy.unwrap_or(portal.config().delete_policy);

    if !portal.is_authenticated(Role::Teacher)? {
        return Ok(output.rejected(&Rejection::NotAuthorized(Role::Teacher)));
    }

    // Confirm deletion
    if output.should_prompt() {
        let Some(paper) = portal.paper(id)? else {
            return Ok(output.rejected(&Rejection::PaperNotFound));
        };
        println!("Delete question paper: {} - {}", paper.id, paper.title);
        if !confirm("Are you sure?")? {
            output.message("Cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    match portal.delete_paper_with(id, policy)? {
        Outcome::Accepted { message, value } => {
            let mut message = message;
            if value.removed_answer_sheets > 0 {
                message.push_str(&format!(
                    " ({} answer sheet(s) removed)",
                    value.removed_answer_sheets
                ));
            }
            if value.orphaned_answer_sheets > 0 {
                message.push_str(&format!(
                    " ({} answer sheet(s) still reference it)",
                    value.orphaned_answer_sheets
                ));
            }
            output.accepted(
                &message,
                Some(&value.paper.id),
                json!({
                    "paper": paper_json(&value.paper),
                    "policy": policy,
                    "removedAnswerSheets": value.removed_answer_sheets,
                    "orphanedAnswerSheets": value.orphaned_answer_sheets,
                }),
            );
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Rejected(rejection) => Ok(output.rejected(&rejection)),
    }
}
