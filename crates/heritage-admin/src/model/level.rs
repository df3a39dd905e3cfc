use super::chapter::ChapterId;
use resource_framework::{ResourceEntity, ReviewStatus, Reviewable};
use serde::{Deserialize, Serialize};

resource_id!(
    /// Type-safe identifier for levels.
    LevelId
);

/// Gameplay mechanic of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelType {
    Dialogue,
    Quiz,
    Timeline,
    HiddenObject,
}

/// A playable level inside a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: LevelId,
    pub chapter_id: ChapterId,
    pub name: String,
    #[serde(rename = "type")]
    pub level_type: LevelType,
    pub order: u32,
    pub status: ReviewStatus,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCreate {
    pub chapter_id: ChapterId,
    pub name: String,
    #[serde(rename = "type")]
    pub level_type: LevelType,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub level_type: Option<LevelType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl ResourceEntity for Level {
    type Id = LevelId;
    type Create = LevelCreate;
    type Update = LevelUpdate;
    const ENDPOINT: &'static str = "levels";

    fn id(&self) -> &LevelId {
        &self.id
    }
}

impl Reviewable for Level {
    fn status(&self) -> ReviewStatus {
        self.status
    }

    fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    fn stamp_status(payload: &mut LevelCreate, status: ReviewStatus) {
        payload.status = Some(status);
    }
}
