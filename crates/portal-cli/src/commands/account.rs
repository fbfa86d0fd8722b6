//! Account and session command handlers

use std::process::ExitCode;

use anyhow::Result;

use portal_core::{Outcome, Portal, RegistrationForm, Role};

use crate::output::{account_json, Output};

/// Registration input as given on the command line
pub struct RegisterArgs {
    pub role: Role,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Register a new account
pub fn register(portal: &mut Portal, args: RegisterArgs, output: &Output) -> Result<ExitCode> {
    let form = RegistrationForm {
        role: args.role,
        full_name: args.full_name,
        username: args.username,
        email: args.email,
        password: args.password,
        confirm_password: args.confirm_password,
    };

    match portal.register_form(&form)? {
        Outcome::Accepted { message, value } => {
            output.accepted(&message, Some(&value.username), account_json(&value));
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Rejected(rejection) => Ok(output.rejected(&rejection)),
    }
}

/// Log in as `role`
pub fn login(
    portal: &mut Portal,
    role: Role,
    username: &str,
    password: &str,
    output: &Output,
) -> Result<ExitCode> {
    match portal.login(username, password, role)? {
        Outcome::Accepted { message, value } => {
            output.accepted(
                &format!("{}. Welcome, {}!", message, value.full_name),
                Some(&value.username),
                account_json(&value),
            );
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Rejected(rejection) => Ok(output.rejected(&rejection)),
    }
}

/// Log out
pub fn logout(portal: &mut Portal, output: &Output) -> Result<ExitCode> {
    portal.logout()?;
    output.success("Logged out");
    Ok(ExitCode::SUCCESS)
}

/// Show the current session
pub fn whoami(portal: &Portal, output: &Output) -> Result<ExitCode> {
    let session = portal.current_session()?;
    output.print_session(session.as_ref());
    Ok(ExitCode::SUCCESS)
}
