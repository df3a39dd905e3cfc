//! # Console Lifecycle
//!
//! Wires one controller per backend resource against a shared session and notifier.
//!
//! ## Wiring
//!
//! Every resource gets its own [`HttpResourceClient`], but all of them share:
//!
//! - the [`Session`](resource_framework::Session), so a `401` on any table logs the
//!   whole console out
//! - the [`Notifier`], so one subscriber sees success and failure toasts from every table
//! - the export directory and page size from [`Args`]
//!
//! ```rust,ignore
//! let console = AdminConsole::connect(&Args::parse())?;
//! let mut toasts = console.notifier.subscribe();
//! console.artifacts.fetch_for_site(HeritageSiteId(3)).await?;
//! ```
//!
//! Nothing here owns background tasks, so there is no shutdown step: dropping the
//! console drops every client.

use crate::model::{Artifact, Chapter, Exhibition, HeritageSite, Level, User};
use crate::services::{ArtifactService, LevelService, UserService};
use clap::Parser;
use resource_framework::{
    ClientConfig, ControllerConfig, HttpResourceClient, Notification, NotificationLevel,
    Notifier, ResourceController, ResourceEntity, ResourceError, ReviewWorkflow, Role, Session,
    StaticSession,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Heritage admin console
#[derive(Parser, Debug, Clone)]
#[command(name = "heritage-admin")]
#[command(about = "Content administration for the heritage game backend")]
pub struct Args {
    /// API root URL
    #[arg(long, env = "HERITAGE_API_URL", default_value = "http://localhost:3000/api")]
    pub api_url: String,

    /// Bearer token for the signed-in user
    #[arg(long, env = "HERITAGE_API_TOKEN")]
    pub token: Option<String>,

    /// Identity of the signed-in user, used for ownership checks
    #[arg(long, env = "HERITAGE_USER_ID", default_value = "console")]
    pub user_id: String,

    /// Role of the signed-in user (admin, reviewer, editor)
    #[arg(long, env = "HERITAGE_ROLE", default_value = "editor")]
    pub role: Role,

    /// Rows per page
    #[arg(long, env = "HERITAGE_PAGE_SIZE", default_value = "10")]
    pub page_size: u32,

    /// Directory exports and templates are written to
    #[arg(long, env = "HERITAGE_EXPORT_DIR", default_value = "exports")]
    pub export_dir: PathBuf,

    /// Request timeout in seconds
    #[arg(long, env = "HERITAGE_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,
}

impl Args {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::default()
            .with_page_size(self.page_size)
            .with_export_dir(self.export_dir.clone())
    }

    pub fn session(&self) -> StaticSession {
        match &self.token {
            Some(token) => StaticSession::new(&self.user_id, self.role, token),
            None => {
                warn!("No API token configured, requests will be anonymous");
                StaticSession::anonymous()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Failed to build client for {resource}: {source}")]
    Client {
        resource: &'static str,
        #[source]
        source: ResourceError,
    },

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

type HttpController<T> = ResourceController<T, HttpResourceClient<T>>;
type HttpWorkflow<T> = ReviewWorkflow<T, HttpResourceClient<T>>;

/// All resource tables of the console.
pub struct AdminConsole {
    pub session: Arc<StaticSession>,
    pub notifier: Notifier,
    pub sites: HttpWorkflow<HeritageSite>,
    pub artifacts: ArtifactService<HttpResourceClient<Artifact>>,
    pub chapters: HttpWorkflow<Chapter>,
    pub levels: LevelService<HttpResourceClient<Level>>,
    pub exhibitions: HttpController<Exhibition>,
    pub users: UserService<HttpResourceClient<User>>,
}

struct Wiring<'a> {
    args: &'a Args,
    client: ClientConfig,
    session: Arc<dyn Session>,
    notifier: Notifier,
}

impl Wiring<'_> {
    fn controller<T: ResourceEntity>(&self) -> Result<HttpController<T>, AdminError> {
        let client = HttpResourceClient::<T>::new(&self.client, Arc::clone(&self.session))
            .map_err(|source| AdminError::Client {
                resource: T::ENDPOINT,
                source,
            })?;
        Ok(ResourceController::new(
            Arc::new(client),
            Arc::clone(&self.session),
            self.args.controller_config(),
        )
        .with_notifier(self.notifier.clone()))
    }
}

impl AdminConsole {
    /// Builds every controller. Fails only on invalid transport settings; nothing is
    /// fetched yet.
    pub fn connect(args: &Args) -> Result<Self, AdminError> {
        let session = Arc::new(args.session());
        let wiring = Wiring {
            args,
            client: args.client_config(),
            session: session.clone(),
            notifier: Notifier::default(),
        };

        let console = Self {
            sites: ReviewWorkflow::new(wiring.controller()?),
            artifacts: ArtifactService::new(ReviewWorkflow::new(wiring.controller()?)),
            chapters: ReviewWorkflow::new(wiring.controller()?),
            levels: LevelService::new(ReviewWorkflow::new(wiring.controller()?)),
            exhibitions: wiring.controller()?,
            users: UserService::new(wiring.controller()?),
            notifier: wiring.notifier,
            session,
        };
        info!(api = %args.api_url, role = %args.role.as_str(), "Admin console ready");
        Ok(console)
    }

    /// Loads the first page of every table concurrently.
    ///
    /// Each table records its own failure; the returned list names the tables that
    /// failed, in declaration order.
    pub async fn refresh_all(&self) -> Vec<(&'static str, ResourceError)> {
        let (sites, artifacts, chapters, levels, exhibitions, users) = tokio::join!(
            self.sites.controller().refresh(),
            self.artifacts.workflow().controller().refresh(),
            self.chapters.controller().refresh(),
            self.levels.workflow().controller().refresh(),
            self.exhibitions.refresh(),
            self.users.controller().refresh(),
        );

        [
            (HeritageSite::ENDPOINT, sites.err()),
            (Artifact::ENDPOINT, artifacts.err()),
            (Chapter::ENDPOINT, chapters.err()),
            (Level::ENDPOINT, levels.err()),
            (Exhibition::ENDPOINT, exhibitions.err()),
            (User::ENDPOINT, users.err()),
        ]
        .into_iter()
        .filter_map(|(resource, err)| err.map(|err| (resource, err)))
        .collect()
    }
}

/// Streams notifications into the log until every sender is gone.
///
/// The task resolves to the number of notifications logged.
pub fn log_notifications(mut receiver: broadcast::Receiver<Notification>) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut logged = 0;
        loop {
            let note = match receiver.recv().await {
                Ok(note) => note,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification listener fell behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match note.level {
                NotificationLevel::Error => error!(resource = note.resource, "{}", note.message),
                NotificationLevel::Warning => warn!(resource = note.resource, "{}", note.message),
                NotificationLevel::Success | NotificationLevel::Info => {
                    info!(resource = note.resource, "{}", note.message)
                }
            }
            logged += 1;
        }
        logged
    })
}
