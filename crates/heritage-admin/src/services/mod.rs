//! # Resource Services
//!
//! Thin domain wrappers over the generic controller and workflow. Each service adds the
//! queries and shortcuts that only make sense for its resource (artifacts by site, levels
//! by chapter, users by role) and otherwise hands out the underlying controller.
//!
//! Services are generic over the transport so tests can drive them with
//! [`MockClient`](resource_framework::mock::MockClient).

mod artifact_service;
mod level_service;
mod user_service;

pub use artifact_service::ArtifactService;
pub use level_service::LevelService;
pub use user_service::UserService;
