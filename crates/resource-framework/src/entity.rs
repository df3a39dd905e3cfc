//! # ResourceEntity Trait
//!
//! The `ResourceEntity` trait is the contract every backend-managed resource (artifact,
//! chapter, level, user, …) implements so that one generic [`ResourceController`] can drive
//! it. Associated types pin the identifier and the create/update payloads to the resource,
//! so a `ChapterCreate` can never be posted to the artifacts endpoint.
//!
//! Resources that take part in moderation additionally implement [`Reviewable`].
//!
//! [`ResourceController`]: crate::controller::ResourceController

use crate::review::ReviewStatus;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource type must implement to be managed by a `ResourceController`.
///
/// # Architecture Note
/// The controller never contains resource-specific code. Everything it needs to know
/// about a resource (where it lives, how it is identified, what its payloads look like)
/// is expressed through this trait.
pub trait ResourceEntity: Clone + Debug + Send + Sync + DeserializeOwned + 'static {
    /// The unique identifier for this resource (numeric ids, slugs, uuids).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + Serialize + DeserializeOwned + 'static;

    /// The payload posted to create a new instance (DTO).
    type Create: Serialize + Send + Sync + Debug + 'static;

    /// The payload put to update an existing instance.
    type Update: Serialize + Send + Sync + Debug + 'static;

    /// Endpoint path segment relative to the API base URL (e.g. `"artifacts"`).
    const ENDPOINT: &'static str;

    fn id(&self) -> &Self::Id;
}

/// A resource carrying a moderation status and an owner.
///
/// Status only changes through review transitions. The one exception is creation, where
/// the workflow stamps an initial status derived from the caller's role.
pub trait Reviewable: ResourceEntity {
    fn status(&self) -> ReviewStatus;

    /// Identity of the author, when the backend reports one.
    fn created_by(&self) -> Option<&str>;

    /// Writes the initial status into a create payload.
    fn stamp_status(payload: &mut Self::Create, status: ReviewStatus);
}
