use resource_framework::ResourceEntity;
use serde::{Deserialize, Serialize};

resource_id!(
    /// Type-safe identifier for exhibitions.
    ExhibitionId
);

/// A time-boxed featured exhibition. Not moderated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exhibition {
    pub id: ExhibitionId,
    pub title: String,
    /// ISO-8601 dates, as sent by the backend.
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhibitionCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhibitionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ResourceEntity for Exhibition {
    type Id = ExhibitionId;
    type Create = ExhibitionCreate;
    type Update = ExhibitionUpdate;
    const ENDPOINT: &'static str = "exhibitions";

    fn id(&self) -> &ExhibitionId {
        &self.id
    }
}
