//! # Mock Client & Testing Guide
//!
//! `MockClient<T>` implements [`ResourceClient`] (and [`ReviewClient`] for reviewable
//! resources) entirely in memory. Tests queue expectations with a fluent API, hand the
//! mock to a controller, then assert on state, notifications and the recorded calls.
//!
//! ## When to use the mock vs. the HTTP client
//!
//! | Feature             | MockClient                         | HttpResourceClient + wiremock      |
//! |---------------------|------------------------------------|------------------------------------|
//! | **Speed**           | Instant                            | Local socket round-trips           |
//! | **Covers**          | Controller / workflow logic        | Wire format, envelopes, status map |
//! | **Error injection** | `return_err(..)`                   | Mounted error responses            |
//! | **Timing**          | `.delay(..)` per expectation       | `set_delay` on the template        |
//!
//! ## Example
//!
//! ```rust,ignore
//! let mock = MockClient::<Artifact>::new();
//! mock.expect_list().return_ok(ListResponse::new(vec![artifact]));
//! mock.expect_delete(7).return_err(ResourceError::Status { status: 500, message: "boom".into() });
//!
//! let controller = ResourceController::new(Arc::new(mock.clone()), session, ControllerConfig::default());
//! controller.fetch_all(None).await?;
//!
//! mock.verify(); // every expectation was consumed
//! ```
//!
//! ## Matching
//!
//! A call consumes the oldest queued expectation of the same kind (and the same id, for
//! id-bearing calls). Calls of different kinds may interleave freely, which keeps
//! concurrent batch deletes deterministic. A call with no matching expectation panics.

use crate::client::{ImportFile, ImportResult, ListResponse, ResourceClient, ReviewClient};
use crate::entity::{ResourceEntity, Reviewable};
use crate::error::{ResourceError, Result};
use crate::query::QueryParams;
use crate::review::{ReviewAction, ReviewStep};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// =============================================================================
// EXPECTATIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum ExpectKind<Id> {
    List,
    Get(Id),
    Create,
    Update(Id),
    Delete(Id),
    Export,
    Import,
    Template,
    Transition(Id, ReviewStep),
}

enum Reply<T: ResourceEntity> {
    List(Result<ListResponse<T>>),
    Item(Result<T>),
    Unit(Result<()>),
    Bytes(Result<Vec<u8>>),
    Import(Result<ImportResult>),
}

struct Expectation<T: ResourceEntity> {
    kind: ExpectKind<T::Id>,
    delay: Option<Duration>,
    reply: Reply<T>,
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A call the mock received, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall<Id> {
    List(QueryParams),
    Get(Id),
    /// Serialized create payload.
    Create(Value),
    Update(Id, Value),
    Delete(Id),
    Export(QueryParams),
    Import(String),
    Template,
    Transition(Id, ReviewAction),
}

/// Fluent expectation builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<T: ResourceEntity, R> {
    kind: ExpectKind<T::Id>,
    delay: Option<Duration>,
    wrap: fn(Result<R>) -> Reply<T>,
    expectations: Queue<T>,
}

impl<T: ResourceEntity, R> ExpectationBuilder<T, R> {
    /// Holds the reply back for `delay` before answering.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ResourceError) {
        self.push(Err(error));
    }

    fn push(self, result: Result<R>) {
        let reply = (self.wrap)(result);
        lock(&self.expectations).push_back(Expectation {
            kind: self.kind,
            delay: self.delay,
            reply,
        });
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// =============================================================================
// MOCK CLIENT
// =============================================================================

/// In-memory client with expectation tracking. Clones share expectations and calls.
pub struct MockClient<T: ResourceEntity> {
    expectations: Queue<T>,
    calls: Arc<Mutex<Vec<MockCall<T::Id>>>>,
}

impl<T: ResourceEntity> Clone for MockClient<T> {
    fn clone(&self) -> Self {
        Self {
            expectations: Arc::clone(&self.expectations),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T: ResourceEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        Self {
            expectations: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn builder<R>(&self, kind: ExpectKind<T::Id>, wrap: fn(Result<R>) -> Reply<T>) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            kind,
            delay: None,
            wrap,
            expectations: Arc::clone(&self.expectations),
        }
    }

    pub fn expect_list(&self) -> ExpectationBuilder<T, ListResponse<T>> {
        self.builder(ExpectKind::List, Reply::List)
    }

    pub fn expect_get(&self, id: T::Id) -> ExpectationBuilder<T, T> {
        self.builder(ExpectKind::Get(id), Reply::Item)
    }

    pub fn expect_create(&self) -> ExpectationBuilder<T, T> {
        self.builder(ExpectKind::Create, Reply::Item)
    }

    pub fn expect_update(&self, id: T::Id) -> ExpectationBuilder<T, T> {
        self.builder(ExpectKind::Update(id), Reply::Item)
    }

    pub fn expect_delete(&self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(ExpectKind::Delete(id), Reply::Unit)
    }

    pub fn expect_export(&self) -> ExpectationBuilder<T, Vec<u8>> {
        self.builder(ExpectKind::Export, Reply::Bytes)
    }

    pub fn expect_import(&self) -> ExpectationBuilder<T, ImportResult> {
        self.builder(ExpectKind::Import, Reply::Import)
    }

    pub fn expect_template(&self) -> ExpectationBuilder<T, Vec<u8>> {
        self.builder(ExpectKind::Template, Reply::Bytes)
    }

    pub fn expect_transition(&self, id: T::Id, step: ReviewStep) -> ExpectationBuilder<T, T> {
        self.builder(ExpectKind::Transition(id, step), Reply::Item)
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<MockCall<T::Id>> {
        lock(&self.calls).clone()
    }

    /// Number of recorded calls satisfying `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&MockCall<T::Id>) -> bool) -> usize {
        lock(&self.calls).iter().filter(|call| predicate(call)).count()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = lock(&self.expectations).len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }

    async fn respond(&self, call: MockCall<T::Id>, kind: ExpectKind<T::Id>) -> Reply<T> {
        lock(&self.calls).push(call);
        let expectation = {
            let mut exps = lock(&self.expectations);
            let position = exps.iter().position(|e| e.kind == kind);
            position.and_then(|i| exps.remove(i))
        };
        let Some(expectation) = expectation else {
            panic!("Unexpected call with no matching expectation: {:?}", kind);
        };
        if let Some(delay) = expectation.delay {
            tokio::time::sleep(delay).await;
        }
        expectation.reply
    }

    async fn item(&self, call: MockCall<T::Id>, kind: ExpectKind<T::Id>) -> Result<T> {
        match self.respond(call, kind).await {
            Reply::Item(result) => result,
            _ => panic!("Expectation reply does not match call"),
        }
    }

    async fn bytes(&self, call: MockCall<T::Id>, kind: ExpectKind<T::Id>) -> Result<Vec<u8>> {
        match self.respond(call, kind).await {
            Reply::Bytes(result) => result,
            _ => panic!("Expectation reply does not match call"),
        }
    }
}

fn to_value<P: serde::Serialize>(payload: &P) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

#[async_trait]
impl<T: ResourceEntity> ResourceClient<T> for MockClient<T> {
    async fn list(&self, query: &QueryParams) -> Result<ListResponse<T>> {
        match self.respond(MockCall::List(query.clone()), ExpectKind::List).await {
            Reply::List(result) => result,
            _ => panic!("Expectation reply does not match call"),
        }
    }

    async fn get_by_id(&self, id: &T::Id) -> Result<T> {
        self.item(MockCall::Get(id.clone()), ExpectKind::Get(id.clone()))
            .await
    }

    async fn create(&self, payload: &T::Create) -> Result<T> {
        self.item(MockCall::Create(to_value(payload)), ExpectKind::Create)
            .await
    }

    async fn update(&self, id: &T::Id, payload: &T::Update) -> Result<T> {
        self.item(
            MockCall::Update(id.clone(), to_value(payload)),
            ExpectKind::Update(id.clone()),
        )
        .await
    }

    async fn delete(&self, id: &T::Id) -> Result<()> {
        match self
            .respond(MockCall::Delete(id.clone()), ExpectKind::Delete(id.clone()))
            .await
        {
            Reply::Unit(result) => result,
            _ => panic!("Expectation reply does not match call"),
        }
    }

    async fn export(&self, query: &QueryParams) -> Result<Vec<u8>> {
        self.bytes(MockCall::Export(query.clone()), ExpectKind::Export)
            .await
    }

    async fn import(&self, file: ImportFile) -> Result<ImportResult> {
        match self
            .respond(MockCall::Import(file.file_name), ExpectKind::Import)
            .await
        {
            Reply::Import(result) => result,
            _ => panic!("Expectation reply does not match call"),
        }
    }

    async fn download_template(&self) -> Result<Vec<u8>> {
        self.bytes(MockCall::Template, ExpectKind::Template).await
    }
}

#[async_trait]
impl<T: Reviewable> ReviewClient<T> for MockClient<T> {
    async fn transition(&self, id: &T::Id, action: &ReviewAction) -> Result<T> {
        self.item(
            MockCall::Transition(id.clone(), action.clone()),
            ExpectKind::Transition(id.clone(), action.step()),
        )
        .await
    }
}
