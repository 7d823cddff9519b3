use clap::Args;
use sch_api::HttpAuthApi;
use sch_core::domain::{
    AuthSession, ChangePasswordRequest, LoginRequest, RegisterRequest, User, UserStatus,
};
use sch_core::error::AppError;
use sch_core::remote::AuthApi;

use super::required;
use crate::context::AppContext;

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "SCH_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "SCH_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Debug, Args)]
pub struct ChangePasswordArgs {
    #[arg(long)]
    pub current: String,

    #[arg(long)]
    pub new: String,
}

fn describe(user: &User) -> String {
    let status = match user.status {
        Some(UserStatus::Pending) => " [pending approval]",
        Some(UserStatus::Rejected) => " [rejected]",
        Some(UserStatus::Suspended) => " [suspended]",
        Some(UserStatus::Active) | None => "",
    };
    format!(
        "{} <{}> #{} ({:?}){status}",
        user.display_name(),
        user.email,
        user.id,
        user.role
    )
}

/// Fetch the account with the freshly issued token when login did not include it.
fn fill_user(ctx: &AppContext, mut session: AuthSession) -> AuthSession {
    if session.user.is_some() {
        return session;
    }
    let auth = ctx
        .client()
        .map(|c| HttpAuthApi::new(c.with_token(Some(session.access_token.clone()))));
    match auth.and_then(|a| a.current_user()) {
        Ok(user) => session.user = Some(user),
        Err(e) => tracing::warn!(code = %e.code, error = %e, "logged in but could not load the account"),
    }
    session
}

pub fn login(ctx: &AppContext, args: LoginArgs) -> Result<(), AppError> {
    let request = LoginRequest {
        email: required("email", &args.email)?,
        password: required("password", &args.password)?,
    };
    let session = ctx.auth()?.login(&request)?;
    let session = fill_user(ctx, session);
    ctx.sessions().save(&session)?;
    tracing::info!(email = %request.email, "logged in");

    match &session.user {
        Some(user) => println!("Logged in as {}", describe(user)),
        None => println!("Logged in as {}", request.email),
    }
    Ok(())
}

pub fn register(ctx: &AppContext, args: RegisterArgs) -> Result<(), AppError> {
    let request = RegisterRequest {
        first_name: required("first_name", &args.first_name)?,
        last_name: required("last_name", &args.last_name)?,
        email: required("email", &args.email)?,
        password: required("password", &args.password)?,
        phone: args.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
    };
    let user = ctx.auth()?.register(&request)?;
    println!("Account created: {}", describe(&user));
    if user.status == Some(UserStatus::Pending) {
        println!("An administrator must approve it before you can log in.");
    }
    Ok(())
}

/// The server call is best effort; local tokens are always dropped.
pub fn logout(ctx: &AppContext) -> Result<(), AppError> {
    let sessions = ctx.sessions();
    if sessions.access_token()?.is_some() {
        if let Err(e) = ctx.auth().and_then(|a| a.logout()) {
            tracing::warn!(code = %e.code, error = %e, "server logout failed; clearing local session anyway");
        }
    }
    sessions.clear()?;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> Result<(), AppError> {
    let sessions = ctx.sessions();
    sessions.require_token()?;
    let user = ctx.auth()?.current_user()?;
    sessions.save_user(&user)?;
    println!("{}", describe(&user));
    if let Some(phone) = &user.phone {
        println!("Phone: {phone}");
    }
    Ok(())
}

pub fn change_password(ctx: &AppContext, args: ChangePasswordArgs) -> Result<(), AppError> {
    let request = ChangePasswordRequest {
        current_password: required("current_password", &args.current)?,
        new_password: required("new_password", &args.new)?,
    };
    if request.current_password == request.new_password {
        return Err(AppError::new(
            "VALIDATION_PASSWORD_UNCHANGED",
            "The new password must differ from the current one",
        ));
    }
    ctx.sessions().require_token()?;
    ctx.auth()?.change_password(&request)?;
    println!("Password changed.");
    Ok(())
}
