use resource_framework::{ResourceEntity, ReviewStatus, Reviewable};
use serde::{Deserialize, Serialize};

resource_id!(
    /// Type-safe identifier for heritage sites.
    HeritageSiteId
);

/// A physical heritage location that artifacts and chapters hang off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeritageSite {
    pub id: HeritageSiteId,
    pub name: String,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ReviewStatus,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeritageSiteCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeritageSiteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceEntity for HeritageSite {
    type Id = HeritageSiteId;
    type Create = HeritageSiteCreate;
    type Update = HeritageSiteUpdate;
    const ENDPOINT: &'static str = "heritage-sites";

    fn id(&self) -> &HeritageSiteId {
        &self.id
    }
}

impl Reviewable for HeritageSite {
    fn status(&self) -> ReviewStatus {
        self.status
    }

    fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    fn stamp_status(payload: &mut HeritageSiteCreate, status: ReviewStatus) {
        payload.status = Some(status);
    }
}
