//! Portal CLI
//!
//! Command-line interface for the exam portal - question papers and
//! answer sheets.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use portal_core::{Config, DeletePolicy, Portal, Role};

mod commands;
mod output;
mod prompt;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Exam portal - question papers and answer sheets")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a student or teacher account
    Register {
        /// Account role (student or teacher)
        #[arg(long)]
        role: Role,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Log in and remember the session
    Login {
        /// Role to log in as (student or teacher)
        #[arg(long)]
        role: Role,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the current session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Manage question papers
    Paper {
        #[command(subcommand)]
        command: PaperCommands,
    },
    /// Manage answer sheets
    Answer {
        #[command(subcommand)]
        command: AnswerCommands,
    },
    /// Show storage location and record counts
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum PaperCommands {
    /// Upload a question paper (teachers)
    #[command(alias = "add")]
    Upload {
        #[arg(short = 'T', long)]
        title: String,
        #[arg(short, long)]
        subject: String,
        /// PDF or Word document
        file: PathBuf,
    },
    /// List question papers
    #[command(alias = "ls")]
    List {
        /// Only papers uploaded by the logged-in teacher
        #[arg(long)]
        mine: bool,
    },
    /// Save a question paper's file
    Download {
        /// Question paper ID
        id: String,
        /// Where to write the file (defaults to its original name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a question paper (teachers)
    #[command(alias = "rm")]
    Delete {
        /// Question paper ID
        id: String,
        /// What happens to submitted answer sheets (orphan, block, cascade)
        #[arg(long)]
        policy: Option<DeletePolicy>,
    },
}

#[derive(Subcommand)]
enum AnswerCommands {
    /// Submit an answer sheet (students)
    Submit {
        /// Question paper ID
        paper_id: String,
        /// PDF or Word document
        file: PathBuf,
    },
    /// List answer sheets
    #[command(alias = "ls")]
    List {
        /// Question paper ID (required for teachers)
        #[arg(short, long)]
        paper: Option<String>,
    },
    /// Save an answer sheet's file
    Download {
        /// Answer sheet ID
        id: String,
        /// Where to write the file (defaults to its original name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, max_upload_bytes, delete_policy, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without opening the store
    if let Commands::Config { command } = &cli.command {
        handle_config_command(command.clone(), config_path, &output)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let mut portal = Portal::open_with_config(config)?;

    match cli.command {
        Commands::Register {
            role,
            username,
            email,
            full_name,
            password,
            confirm_password,
        } => commands::account::register(
            &mut portal,
            commands::account::RegisterArgs {
                role,
                username,
                email,
                full_name,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            },
            &output,
        ),
        Commands::Login {
            role,
            username,
            password,
        } => commands::account::login(&mut portal, role, &username, &password, &output),
        Commands::Logout => commands::account::logout(&mut portal, &output),
        Commands::Whoami => commands::account::whoami(&portal, &output),
        Commands::Paper { command } => handle_paper_command(command, &mut portal, &output),
        Commands::Answer { command } => handle_answer_command(command, &mut portal, &output),
        Commands::Status => commands::status::show(&portal, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_paper_command(
    command: PaperCommands,
    portal: &mut Portal,
    output: &Output,
) -> Result<ExitCode> {
    match command {
        PaperCommands::Upload {
            title,
            subject,
            file,
        } => commands::paper::upload(portal, title, subject, &file, output),
        PaperCommands::List { mine } => commands::paper::list(portal, mine, output),
        PaperCommands::Download { id, output: path } => {
            commands::paper::download(portal, &id, path, output)
        }
        PaperCommands::Delete { id, policy } => commands::paper::delete(portal, &id, policy, output),
    }
}

fn handle_answer_command(
    command: AnswerCommands,
    portal: &mut Portal,
    output: &Output,
) -> Result<ExitCode> {
    match command {
        AnswerCommands::Submit { paper_id, file } => {
            commands::answer::submit(portal, paper_id, &file, output)
        }
        AnswerCommands::List { paper } => commands::answer::list(portal, paper.as_deref(), output),
        AnswerCommands::Download { id, output: path } => {
            commands::answer::download(portal, &id, path, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Install the tracing subscriber
///
/// Level comes from `PORTAL_LOG` (default `warn`). Logs go to
/// `config.log_file` when set, stderr otherwise.
fn init_logging(config: &Config) {
    let level = std::env::var("PORTAL_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!("portal_core={},portal_cli={}", level, level));

    match &config.log_file {
        Some(log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };

            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
