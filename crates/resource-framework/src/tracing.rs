//! # Observability & Tracing
//!
//! Every controller operation runs inside a span carrying a `resource` field (the
//! endpoint), so interleaved output from several tables stays readable:
//!
//! ```text
//! INFO fetch_all{resource="artifacts"}: Fetched count=10
//! WARN Failed to delete 1 of 3 items resource="chapters" error=Request failed (404): The requested resource was not found
//! ```
//!
//! Log levels come from `RUST_LOG`. With `RUST_LOG=debug`, create and update log their
//! full payload once on entry (`debug!(?payload, ..)`) and fetches log the compiled query.
//!
//! ```bash
//! RUST_LOG=info cargo run -p heritage-admin
//! RUST_LOG=resource_framework=debug cargo run -p heritage-admin
//! ```

use std::error::Error;

/// Installs the global subscriber. Panics if one is already installed.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // the `resource` field identifies the source
        .compact()
        .init();
}

/// Like [`setup_tracing`], but reports an already-installed subscriber as an error.
pub fn try_setup_tracing() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init()
}
