//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::process::ExitCode;

use serde_json::{json, Value};

use portal_core::{Account, AnswerSheet, PaperStatus, QuestionPaper, Rejection, Session};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Report an accepted operation
    ///
    /// In JSON mode `value` is attached to the outcome object. In quiet
    /// mode only `id` (if any) is printed.
    pub fn accepted(&self, message: &str, id: Option<&str>, value: Value) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{:#}",
                    json!({"success": true, "message": message, "value": value})
                );
            }
            OutputFormat::Quiet => {
                if let Some(id) = id {
                    println!("{}", id);
                }
            }
        }
    }

    /// Report a refused operation and produce the failing exit code
    pub fn rejected(&self, rejection: &Rejection) -> ExitCode {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{:#}",
                    json!({"success": false, "message": rejection.to_string()})
                );
            }
            OutputFormat::Human => eprintln!("✗ {}", rejection),
            OutputFormat::Quiet => eprintln!("{}", rejection),
        }
        ExitCode::FAILURE
    }

    /// Print a single question paper
    pub fn print_paper(&self, paper: &QuestionPaper) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:          {}", paper.id);
                println!("Title:       {}", paper.title);
                println!("Subject:     {}", paper.subject);
                println!("File:        {}", paper.file_name);
                println!("Uploaded by: {}", paper.uploaded_by);
                println!("Uploaded:    {}", paper.upload_date.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => println!("{:#}", paper_json(paper)),
            OutputFormat::Quiet => println!("{}", paper.id),
        }
    }

    /// Print a list of question papers
    pub fn print_papers(&self, papers: &[QuestionPaper]) {
        match self.format {
            OutputFormat::Human => {
                if papers.is_empty() {
                    println!("No question papers found.");
                    return;
                }
                for paper in papers {
                    println!("{}", paper_line(paper));
                }
                println!("\n{} question paper(s)", papers.len());
            }
            OutputFormat::Json => {
                let list: Vec<Value> = papers.iter().map(paper_json).collect();
                println!("{:#}", Value::Array(list));
            }
            OutputFormat::Quiet => {
                for paper in papers {
                    println!("{}", paper.id);
                }
            }
        }
    }

    /// Print papers with the student's submission state
    pub fn print_paper_statuses(&self, statuses: &[PaperStatus]) {
        match self.format {
            OutputFormat::Human => {
                if statuses.is_empty() {
                    println!("No question papers found.");
                    return;
                }
                for status in statuses {
                    let marker = if status.submitted { "[submitted]" } else { "[open]" };
                    println!("{} {}", paper_line(&status.paper), marker);
                }
                let open = statuses.iter().filter(|s| !s.submitted).count();
                println!("\n{} question paper(s), {} awaiting an answer", statuses.len(), open);
            }
            OutputFormat::Json => {
                let list: Vec<Value> = statuses
                    .iter()
                    .map(|s| {
                        let mut value = paper_json(&s.paper);
                        value["submitted"] = json!(s.submitted);
                        value
                    })
                    .collect();
                println!("{:#}", Value::Array(list));
            }
            OutputFormat::Quiet => {
                for status in statuses.iter().filter(|s| !s.submitted) {
                    println!("{}", status.paper.id);
                }
            }
        }
    }

    /// Print a list of answer sheets
    pub fn print_answer_sheets(&self, sheets: &[AnswerSheet]) {
        match self.format {
            OutputFormat::Human => {
                if sheets.is_empty() {
                    println!("No answer sheets found.");
                    return;
                }
                for sheet in sheets {
                    println!(
                        "{} | {} | {} | {} | {}",
                        sheet.id,
                        truncate(&sheet.question_paper_title, 30),
                        sheet.submitted_by,
                        truncate(&sheet.file_name, 30),
                        sheet.submission_date.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("\n{} answer sheet(s)", sheets.len());
            }
            OutputFormat::Json => {
                let list: Vec<Value> = sheets.iter().map(answer_sheet_json).collect();
                println!("{:#}", Value::Array(list));
            }
            OutputFormat::Quiet => {
                for sheet in sheets {
                    println!("{}", sheet.id);
                }
            }
        }
    }

    /// Print the current session
    pub fn print_session(&self, session: Option<&Session>) {
        match (self.format, session) {
            (OutputFormat::Human, Some(s)) => {
                println!("Logged in as {} ({}, {})", s.display_name(), s.username, s.role);
            }
            (OutputFormat::Human, None) => println!("Not logged in."),
            (OutputFormat::Json, _) => {
                let value = match session {
                    Some(s) => json!({
                        "loggedIn": true,
                        "userType": s.role,
                        "username": s.username,
                        "fullName": s.full_name,
                    }),
                    None => json!({"loggedIn": false}),
                };
                println!("{:#}", value);
            }
            (OutputFormat::Quiet, Some(s)) => println!("{}", s.username),
            (OutputFormat::Quiet, None) => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!("{}", json!({"success": true, "message": message}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Account fields safe to show (no password)
pub fn account_json(account: &Account) -> Value {
    json!({
        "username": account.username,
        "email": account.email,
        "fullName": account.full_name,
        "userType": account.role,
        "createdAt": account.created_at,
    })
}

/// Paper metadata without the embedded file
pub fn paper_json(paper: &QuestionPaper) -> Value {
    json!({
        "id": paper.id,
        "title": paper.title,
        "subject": paper.subject,
        "fileName": paper.file_name,
        "uploadedBy": paper.uploaded_by,
        "uploadDate": paper.upload_date,
    })
}

/// Answer sheet metadata without the embedded file
pub fn answer_sheet_json(sheet: &AnswerSheet) -> Value {
    json!({
        "id": sheet.id,
        "questionPaperId": sheet.question_paper_id,
        "questionPaperTitle": sheet.question_paper_title,
        "fileName": sheet.file_name,
        "submittedBy": sheet.submitted_by,
        "submissionDate": sheet.submission_date,
    })
}

fn paper_line(paper: &QuestionPaper) -> String {
    format!(
        "{} | {} | {} | {} | {}",
        paper.id,
        truncate(&paper.title, 35),
        truncate(&paper.subject, 20),
        paper.uploaded_by,
        paper.upload_date.format("%Y-%m-%d")
    )
}

/// Truncate a string to max length (in chars), adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
