//! Command handlers. Each returns `Result<(), AppError>`; `main` renders failures.

use clap::Subcommand;
use sch_core::error::AppError;

use crate::context::AppContext;

pub mod account;
pub mod admin;
pub mod feed;
pub mod profile;
pub mod report;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session
    Login(account::LoginArgs),

    /// Create a citizen account (needs approval before first login)
    Register(account::RegisterArgs),

    /// Forget the stored session
    Logout,

    /// Show the logged-in account
    Whoami,

    /// Change the account password
    ChangePassword(account::ChangePasswordArgs),

    /// List reported incidents
    Incidents(feed::IncidentsArgs),

    /// List incident categories
    Categories,

    /// Work on the incident report draft
    #[command(subcommand)]
    Report(report::ReportCommand),

    /// Show the profile, optionally saving the profile photo
    Profile(profile::ProfileArgs),

    /// Account moderation (admins only)
    #[command(subcommand)]
    Admin(admin::AdminCommand),
}

pub fn run(ctx: &AppContext, command: Command) -> Result<(), AppError> {
    match command {
        Command::Login(args) => account::login(ctx, args),
        Command::Register(args) => account::register(ctx, args),
        Command::Logout => account::logout(ctx),
        Command::Whoami => account::whoami(ctx),
        Command::ChangePassword(args) => account::change_password(ctx, args),
        Command::Incidents(args) => feed::incidents(ctx, args),
        Command::Categories => feed::categories(ctx),
        Command::Report(cmd) => report::run(ctx, cmd),
        Command::Profile(args) => profile::show(ctx, args),
        Command::Admin(cmd) => admin::run(ctx, cmd),
    }
}

/// Non-empty trimmed value or a `VALIDATION_*_REQUIRED` error naming `field`.
pub(crate) fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::new(
            format!("VALIDATION_{}_REQUIRED", field.to_ascii_uppercase()),
            format!("{field} is required"),
        ));
    }
    Ok(value.to_string())
}
