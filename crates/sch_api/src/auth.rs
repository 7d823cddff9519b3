use sch_core::domain::{AuthSession, ChangePasswordRequest, LoginRequest, RegisterRequest, User};
use sch_core::error::AppError;
use sch_core::remote::AuthApi;
use serde::Serialize;

use crate::client::{call_error, decode, discard, ApiClient};

#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: ApiClient,
}

fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| {
        AppError::new("API_ENCODE_FAILED", "Failed to encode request").with_details(e.to_string())
    })
}

impl HttpAuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn moderate(&self, user_id: i64, action: &str) -> Result<(), AppError> {
        self.client.require_token()?;
        let path = format!("/auth/users/{user_id}/{action}");
        match self.client.post(&path).call() {
            Ok(r) => {
                discard(r);
                tracing::info!(user_id, action, "user moderated");
                Ok(())
            }
            Err(e) => Err(call_error(
                "API_USER_MODERATION_FAILED",
                "Failed to update the account request",
                e,
            )),
        }
    }
}

impl AuthApi for HttpAuthApi {
    fn login(&self, request: &LoginRequest) -> Result<AuthSession, AppError> {
        let resp = self.client.post("/auth/login").send_json(encode(request)?);
        match resp {
            Ok(r) => {
                let session: AuthSession = decode(r, "login")?;
                if session.access_token.trim().is_empty() {
                    return Err(AppError::new("AUTH_LOGIN_FAILED", "Login response had no token"));
                }
                Ok(session)
            }
            Err(ureq::Error::Status(400 | 401, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                tracing::debug!(body = %body, "login rejected");
                Err(AppError::new("AUTH_INVALID_CREDENTIALS", "Email or password is incorrect"))
            }
            Err(e) => Err(call_error("AUTH_LOGIN_FAILED", "Login failed", e)),
        }
    }

    fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        let resp = self.client.post("/auth/register").send_json(encode(request)?);
        match resp {
            Ok(r) => decode(r, "registration"),
            Err(e) => Err(call_error("AUTH_REGISTER_FAILED", "Registration failed", e)),
        }
    }

    fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), AppError> {
        self.client.require_token()?;
        let resp = self
            .client
            .post("/auth/change-password")
            .send_json(encode(request)?);
        match resp {
            Ok(r) => {
                discard(r);
                Ok(())
            }
            Err(e) => Err(call_error(
                "AUTH_PASSWORD_CHANGE_FAILED",
                "Failed to change password",
                e,
            )),
        }
    }

    fn logout(&self) -> Result<(), AppError> {
        self.client.require_token()?;
        match self.client.post("/auth/logout").call() {
            Ok(r) => {
                discard(r);
                Ok(())
            }
            Err(e) => Err(call_error("AUTH_LOGOUT_FAILED", "Logout failed", e)),
        }
    }

    fn current_user(&self) -> Result<User, AppError> {
        self.client.require_token()?;
        match self.client.get("/auth/me").call() {
            Ok(r) => decode(r, "current user"),
            Err(e) => Err(call_error("API_CURRENT_USER_FAILED", "Failed to load your account", e)),
        }
    }

    fn pending_users(&self) -> Result<Vec<User>, AppError> {
        self.client.require_token()?;
        match self.client.get("/auth/pending-users").call() {
            Ok(r) => decode(r, "pending users"),
            Err(e) => Err(call_error(
                "API_PENDING_USERS_FAILED",
                "Failed to load pending accounts",
                e,
            )),
        }
    }

    fn approve_user(&self, user_id: i64) -> Result<(), AppError> {
        self.moderate(user_id, "approve")
    }

    fn reject_user(&self, user_id: i64) -> Result<(), AppError> {
        self.moderate(user_id, "reject")
    }
}
