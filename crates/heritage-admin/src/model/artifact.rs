use super::heritage_site::HeritageSiteId;
use resource_framework::{ResourceEntity, ReviewStatus, Reviewable};
use serde::{Deserialize, Serialize};

resource_id!(
    /// Type-safe identifier for artifacts.
    ArtifactId
);

/// An exhibit object belonging to a heritage site.
///
/// Artifacts are moderated: editors create drafts, reviewers publish them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: ArtifactId,
    pub heritage_site_id: HeritageSiteId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub status: ReviewStatus,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCreate {
    pub heritage_site_id: HeritageSiteId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
}

impl ArtifactCreate {
    pub fn new(heritage_site_id: impl Into<HeritageSiteId>, name: impl Into<String>) -> Self {
        Self {
            heritage_site_id: heritage_site_id.into(),
            name: name.into(),
            category: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ResourceEntity for Artifact {
    type Id = ArtifactId;
    type Create = ArtifactCreate;
    type Update = ArtifactUpdate;
    const ENDPOINT: &'static str = "artifacts";

    fn id(&self) -> &ArtifactId {
        &self.id
    }
}

impl Reviewable for Artifact {
    fn status(&self) -> ReviewStatus {
        self.status
    }

    fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    fn stamp_status(payload: &mut ArtifactCreate, status: ReviewStatus) {
        payload.status = Some(status);
    }
}
