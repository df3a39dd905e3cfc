use resource_framework::{ResourceEntity, Role};
use serde::{Deserialize, Serialize};

resource_id!(
    /// Type-safe identifier for console users.
    UserId
);

/// A console account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: Role,
}

impl UserCreate {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            role,
        }
    }
}

/// Payload for updating an existing user.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl ResourceEntity for User {
    type Id = UserId;
    type Create = UserCreate;
    type Update = UserUpdate;
    const ENDPOINT: &'static str = "users";

    fn id(&self) -> &UserId {
        &self.id
    }
}
