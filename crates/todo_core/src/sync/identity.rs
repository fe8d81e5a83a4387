//! Signed-in user lookup.
//!
//! The repository asks for the current user id on every mutation; `None`
//! means cloud mirroring is skipped entirely.

use log::info;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reports which user, if any, is signed in right now.
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;

    fn is_signed_in(&self) -> bool {
        self.current_user_id().is_some()
    }
}

/// Profile of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            display_name: None,
        }
    }
}

/// Mutable session holder fed by the platform sign-in flow.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    session: RwLock<Option<UserSession>>,
}

impl SessionIdentity {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(session: UserSession) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }

    pub fn sign_in(&self, session: UserSession) {
        info!("event=auth_sign_in module=sync status=ok");
        *self.write() = Some(session);
    }

    pub fn sign_out(&self) {
        info!("event=auth_sign_out module=sync status=ok");
        *self.write() = None;
    }

    pub fn current_session(&self) -> Option<UserSession> {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<UserSession>> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<UserSession>> {
        self.session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.read().as_ref().map(|session| session.user_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{IdentityProvider, SessionIdentity, UserSession};

    #[test]
    fn sign_in_and_out_changes_current_user() {
        let identity = SessionIdentity::signed_out();
        assert!(!identity.is_signed_in());

        identity.sign_in(UserSession {
            user_id: "uid-1".to_string(),
            email: Some("me@example.com".to_string()),
            display_name: None,
        });
        assert_eq!(identity.current_user_id().as_deref(), Some("uid-1"));
        assert_eq!(
            identity.current_session().and_then(|s| s.email).as_deref(),
            Some("me@example.com")
        );

        identity.sign_out();
        assert_eq!(identity.current_user_id(), None);
    }
}
