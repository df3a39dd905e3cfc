//! Session accessor injected into clients and controllers at construction time.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};
use tracing::info;

/// Caller role, as issued by the auth service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Reviewer,
    #[default]
    Editor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Reviewer => "reviewer",
            Role::Editor => "editor",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "reviewer" => Ok(Role::Reviewer),
            "editor" => Ok(Role::Editor),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Read access to the signed-in identity.
///
/// Token refresh lives outside this crate. When the transport sees a `401` it calls
/// [`Session::force_logout`] and reports `ResourceError::Unauthorized`.
pub trait Session: Send + Sync {
    fn user_id(&self) -> Option<String>;

    fn role(&self) -> Role;

    /// Bearer token for outgoing requests.
    fn token(&self) -> Option<String>;

    fn force_logout(&self);

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

#[derive(Debug, Clone, Default)]
struct SessionData {
    user_id: Option<String>,
    role: Role,
    token: Option<String>,
}

/// In-memory session.
#[derive(Debug, Default)]
pub struct StaticSession {
    data: RwLock<SessionData>,
}

impl StaticSession {
    pub fn new(user_id: impl Into<String>, role: Role, token: impl Into<String>) -> Self {
        Self {
            data: RwLock::new(SessionData {
                user_id: Some(user_id.into()),
                role,
                token: Some(token.into()),
            }),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    fn read(&self) -> SessionData {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Session for StaticSession {
    fn user_id(&self) -> Option<String> {
        self.read().user_id
    }

    fn role(&self) -> Role {
        self.read().role
    }

    fn token(&self) -> Option<String> {
        self.read().token
    }

    fn force_logout(&self) {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        info!(user_id = ?data.user_id, "Forced logout");
        *data = SessionData::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_logout_clears_identity() {
        let session = StaticSession::new("u-1", Role::Reviewer, "secret");
        assert!(session.is_authenticated());

        session.force_logout();

        assert!(!session.is_authenticated());
        assert_eq!(session.user_id(), None);
        assert_eq!(session.role(), Role::Editor);
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert!("guest".parse::<Role>().is_err());
    }
}
