use resource_framework::{ResourceEntity, ReviewStatus, Reviewable};
use serde::{Deserialize, Serialize};

resource_id!(
    /// Type-safe identifier for chapters.
    ChapterId
);

/// A story chapter of the game. `order` is its position in the campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub order: u32,
    pub status: ReviewStatus,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterCreate {
    pub title: String,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl ResourceEntity for Chapter {
    type Id = ChapterId;
    type Create = ChapterCreate;
    type Update = ChapterUpdate;
    const ENDPOINT: &'static str = "chapters";

    fn id(&self) -> &ChapterId {
        &self.id
    }
}

impl Reviewable for Chapter {
    fn status(&self) -> ReviewStatus {
        self.status
    }

    fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    fn stamp_status(payload: &mut ChapterCreate, status: ReviewStatus) {
        payload.status = Some(status);
    }
}
