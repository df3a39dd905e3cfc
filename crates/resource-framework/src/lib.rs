//! # Resource Framework
//!
//! Building blocks for admin consoles over a REST backend: one generic controller drives
//! the list, filter, sort, paginate, mutate and import/export lifecycle of *any* resource
//! type, and a review workflow adds moderation on top for resources that need it.
//!
//! ## Architecture Overview
//!
//! The crate separates concerns into three layers:
//!
//! 1. **Entity Layer** ([`ResourceEntity`], [`Reviewable`]) - what a resource is: its id,
//!    payload types and endpoint
//! 2. **Controller Layer** ([`ResourceController`], [`ReviewWorkflow`]) - query state,
//!    mutation policy, notifications
//! 3. **Transport Layer** ([`ResourceClient`], [`ReviewClient`]) - how requests reach the
//!    backend ([`HttpResourceClient`] in production, [`mock::MockClient`] in tests)
//!
//! Resource-specific code lives only in layer 1. The controller never branches on which
//! resource it is driving.
//!
//! ## Example
//!
//! ```rust,ignore
//! use resource_framework::{ControllerConfig, HttpResourceClient, ResourceController, StaticSession, Role};
//! use std::sync::Arc;
//!
//! let session = Arc::new(StaticSession::new("u-1", Role::Editor, "token"));
//! let client = Arc::new(HttpResourceClient::<Artifact>::new(&ClientConfig::default(), session.clone())?);
//! let artifacts = ResourceController::new(client, session, ControllerConfig::default());
//!
//! artifacts.search("bronze");
//! artifacts.fetch_all(None).await?;
//! println!("{} artifacts", artifacts.snapshot().items.len());
//! ```
//!
//! ## Query state
//!
//! Pagination, filters, sorter and search term are held by the controller and compiled
//! into a flat parameter map by [`query::compile`] on every fetch. Updates that would not
//! change anything hand back the same `Arc` so observers can skip work with
//! [`std::sync::Arc::ptr_eq`].
//!
//! ## Failure surface
//!
//! Reads (`fetch_all`, `get_by_id`) return `Err` after recording the failure. Mutations
//! never do: they return `bool`/`Option`/[`BatchDeleteOutcome`] and the failure is visible
//! through the recorded `error` and an error [`Notification`].
//!
//! ## Testing
//!
//! [`mock::MockClient`] implements both client traits in memory with a fluent expectation
//! API. See the [`mock`] module for usage patterns.

pub mod batch;
pub mod client;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod http;
pub mod mock;
pub mod notify;
pub mod pagination;
pub mod query;
pub mod review;
pub mod session;
pub mod state;
pub mod tracing;
pub mod transfer;
pub mod workflow;

// Re-export core types for convenience
pub use batch::BatchDeleteOutcome;
pub use client::{
    ImportFile, ImportOutcome, ImportResult, ImportRowError, ListResponse, ResourceClient,
    ReviewClient,
};
pub use config::{ClientConfig, ControllerConfig};
pub use controller::{PageRequest, ResourceController, TableChange, TableChangeEffect};
pub use entity::{ResourceEntity, Reviewable};
pub use error::{FieldError, ResourceError, Result};
pub use http::HttpResourceClient;
pub use notify::{Notification, NotificationLevel, Notifier};
pub use pagination::{PaginationState, ServerPagination};
pub use query::{FilterSet, FilterValue, ParamValue, QueryParams, SortDirection, SortSpec};
pub use review::{ReviewAction, ReviewStatus, ReviewStep};
pub use session::{Role, Session, StaticSession};
pub use state::ControllerState;
pub use transfer::{DirectorySink, ExportOptions, ExportScope, FileSink, MemorySink};
pub use workflow::ReviewWorkflow;
