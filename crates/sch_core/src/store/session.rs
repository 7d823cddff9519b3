use super::KvStore;
use crate::domain::{AuthSession, User};
use crate::error::AppError;

pub const ACCESS_TOKEN_KEY: &str = "auth_access_token";
pub const REFRESH_TOKEN_KEY: &str = "auth_refresh_token";
pub const USER_KEY: &str = "auth_user";

/// Thin wrapper storing login tokens and the cached current user.
#[derive(Debug, Clone, Copy)]
pub struct SessionStore<'a> {
    kv: &'a KvStore,
}

impl<'a> SessionStore<'a> {
    pub fn new(kv: &'a KvStore) -> Self {
        Self { kv }
    }

    pub fn save(&self, session: &AuthSession) -> Result<(), AppError> {
        self.kv.set(ACCESS_TOKEN_KEY, &session.access_token)?;
        match &session.refresh_token {
            Some(token) => self.kv.set(REFRESH_TOKEN_KEY, token)?,
            None => {
                self.kv.remove(REFRESH_TOKEN_KEY)?;
            }
        }
        match &session.user {
            Some(user) => self.save_user(user)?,
            None => {
                self.kv.remove(USER_KEY)?;
            }
        }
        Ok(())
    }

    pub fn save_user(&self, user: &User) -> Result<(), AppError> {
        self.kv.set_json(USER_KEY, user)
    }

    pub fn access_token(&self) -> Result<Option<String>, AppError> {
        self.kv.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>, AppError> {
        self.kv.get(REFRESH_TOKEN_KEY)
    }

    /// Token for calls that require login.
    pub fn require_token(&self) -> Result<String, AppError> {
        self.access_token()?.ok_or_else(|| {
            AppError::new("AUTH_REQUIRED", "You need to log in first")
        })
    }

    /// A corrupt cached user is treated as absent; the token remains authoritative.
    pub fn current_user(&self) -> Result<Option<User>, AppError> {
        match self.kv.get_json::<User>(USER_KEY) {
            Ok(user) => Ok(user),
            Err(e) if e.code == "KV_DECODE_FAILED" => {
                tracing::warn!(error = %e, "discarding unreadable cached user");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn clear(&self) -> Result<(), AppError> {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            self.kv.remove(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            user: Some(User {
                id: 3,
                email: "citizen@example.org".to_string(),
                first_name: "Amina".to_string(),
                last_name: "B".to_string(),
                role: UserRole::Citizen,
                status: None,
                phone: None,
            }),
        }
    }

    #[test]
    fn save_then_clear() {
        let kv = KvStore::in_memory().unwrap();
        let store = SessionStore::new(&kv);
        store.save(&session()).unwrap();
        assert_eq!(store.require_token().unwrap(), "access");
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh"));
        assert_eq!(store.current_user().unwrap().unwrap().id, 3);

        store.clear().unwrap();
        assert_eq!(store.require_token().unwrap_err().code, "AUTH_REQUIRED");
        assert!(store.current_user().unwrap().is_none());
    }

    #[test]
    fn corrupt_cached_user_reads_as_absent() {
        let kv = KvStore::in_memory().unwrap();
        kv.set(USER_KEY, "[]").unwrap();
        assert!(SessionStore::new(&kv).current_user().unwrap().is_none());
    }
}
