use clap::Subcommand;
use sch_core::error::AppError;
use sch_core::remote::AuthApi;

use crate::context::AppContext;

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Accounts waiting for approval
    Pending,

    /// Approve a pending account
    Approve {
        /// User id
        id: i64,
    },

    /// Reject a pending account
    Reject {
        /// User id
        id: i64,
    },
}

/// Refuse early when the cached account is known not to be an admin. Without a cached
/// user the server decides.
fn ensure_admin(ctx: &AppContext) -> Result<(), AppError> {
    let sessions = ctx.sessions();
    sessions.require_token()?;
    match sessions.current_user()? {
        Some(user) if !user.role.is_admin() => Err(AppError::new(
            "AUTH_FORBIDDEN",
            "Only administrators can moderate accounts",
        )
        .with_details(format!("role={:?}", user.role))),
        _ => Ok(()),
    }
}

pub fn run(ctx: &AppContext, command: AdminCommand) -> Result<(), AppError> {
    ensure_admin(ctx)?;
    let auth = ctx.auth()?;
    match command {
        AdminCommand::Pending => {
            let users = auth.pending_users()?;
            if users.is_empty() {
                println!("No accounts waiting for approval.");
            }
            for u in users {
                println!("#{:<6} {:<28} {}", u.id, u.email, u.display_name());
            }
        }
        AdminCommand::Approve { id } => {
            auth.approve_user(id)?;
            println!("Approved account #{id}.");
        }
        AdminCommand::Reject { id } => {
            auth.reject_user(id)?;
            println!("Rejected account #{id}.");
        }
    }
    Ok(())
}
