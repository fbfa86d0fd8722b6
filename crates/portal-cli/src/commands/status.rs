//! Status command handler

use std::process::ExitCode;

use anyhow::Result;

use portal_core::validation::format_limit;
use portal_core::Portal;

use crate::output::{Output, OutputFormat};

/// Show status information
pub fn show(portal: &Portal, output: &Output) -> Result<ExitCode> {
    let stats = portal.storage_stats()?;
    let session = portal.current_session()?;
    let config = portal.config();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{:#}",
                serde_json::json!({
                    "session": session,
                    "delete_policy": config.delete_policy,
                    "max_upload_bytes": config.max_upload_bytes,
                    "storage": {
                        "store_dir": stats.store_dir,
                        "total_size": stats.total_size
                    },
                    "counts": {
                        "accounts": stats.accounts,
                        "question_papers": stats.question_papers,
                        "answer_sheets": stats.answer_sheets
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.store_dir.display());
        }
        OutputFormat::Human => {
            println!("Portal Status");
            println!("=============");
            println!();
            println!("Session:");
            match &session {
                Some(s) => println!("  {} ({}, {})", s.display_name(), s.username, s.role),
                None => println!("  Not logged in"),
            }
            println!();
            println!("Policy:");
            println!("  Max upload:    {}", format_limit(&config.max_upload_bytes));
            println!("  Delete policy: {}", config.delete_policy);
            println!();
            println!("Storage:");
            println!("  Location: {}", stats.store_dir.display());
            println!("  Size:     {}", human_size(stats.total_size));
            println!();
            println!("Contents:");
            println!("  Accounts:        {}", stats.accounts);
            println!("  Question papers: {}", stats.question_papers);
            println!("  Answer sheets:   {}", stats.answer_sheets);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
