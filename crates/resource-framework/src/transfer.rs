//! # Import / Export Gateway
//!
//! Spreadsheet export, import and template download for any controller. Blob responses
//! are handed to a [`FileSink`], which decides where the bytes end up (a directory on
//! disk by default, memory in tests).
//!
//! Export scope:
//!
//! | Scope          | Query sent                                        |
//! |----------------|---------------------------------------------------|
//! | selected ids   | `id_in` + `format` only, table state ignored      |
//! | `Page`         | current compiled query + `format`                 |
//! | `All`          | current query without paging, `_limit=-1`         |
//! | `Custom(n)`    | current query with `_page=1`, `_limit=n`          |

use crate::client::{ImportFile, ImportOutcome, ImportResult, ResourceClient};
use crate::controller::ResourceController;
use crate::entity::ResourceEntity;
use crate::error::{ResourceError, Result};
use crate::query::{ParamValue, QueryParams, LIMIT_PARAM, PAGE_PARAM};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, instrument};

pub const FORMAT_PARAM: &str = "format";
pub const ID_IN_PARAM: &str = "id_in";
pub const DEFAULT_EXPORT_FORMAT: &str = "xlsx";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportScope {
    #[default]
    Page,
    All,
    Custom {
        limit: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub format: String,
    pub scope: ExportScope,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: DEFAULT_EXPORT_FORMAT.to_string(),
            scope: ExportScope::Page,
        }
    }
}

impl ExportOptions {
    pub fn with_scope(mut self, scope: ExportScope) -> Self {
        self.scope = scope;
        self
    }
}

/// A bare format string exports the current page.
impl From<&str> for ExportOptions {
    fn from(format: &str) -> Self {
        Self {
            format: format.to_string(),
            scope: ExportScope::Page,
        }
    }
}

/// Builds the export query from the current compiled query.
///
/// A non-empty `ids` overrides scope and table state entirely.
pub fn build_export_query<Id: ToString>(
    current: &QueryParams,
    options: &ExportOptions,
    ids: &[Id],
) -> Result<QueryParams> {
    let format = if options.format.trim().is_empty() {
        DEFAULT_EXPORT_FORMAT
    } else {
        options.format.as_str()
    };

    if !ids.is_empty() {
        let joined = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        return Ok(QueryParams::new()
            .with(ID_IN_PARAM, joined)
            .with(FORMAT_PARAM, format));
    }

    let mut query = current.clone();
    match options.scope {
        ExportScope::Page => {}
        ExportScope::All => {
            query.remove(PAGE_PARAM);
            query.insert(LIMIT_PARAM, ParamValue::Int(-1));
        }
        ExportScope::Custom { limit: 0 } => {
            return Err(ResourceError::InvalidInput(
                "custom export limit must be at least 1".into(),
            ));
        }
        ExportScope::Custom { limit } => {
            query.insert(PAGE_PARAM, 1u32);
            query.insert(LIMIT_PARAM, limit);
        }
    }
    query.insert(FORMAT_PARAM, format);
    Ok(query)
}

/// Timestamped file name for a downloaded blob.
pub fn export_file_name(endpoint: &str, extension: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{}_{}.{}", endpoint.replace('/', "_"), millis, extension)
}

/// Destination for downloaded files.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Stores `bytes` under `file_name` and returns where they went.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes files into a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "File saved");
        Ok(path)
    }
}

/// Keeps saved files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_names(&self) -> Vec<String> {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = files.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contents(&self, file_name: &str) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.get(file_name).cloned()
    }
}

#[async_trait]
impl FileSink for MemorySink {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let mut files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.insert(file_name.to_string(), bytes.to_vec());
        Ok(PathBuf::from(file_name))
    }
}

impl<T, C> ResourceController<T, C>
where
    T: ResourceEntity,
    C: ResourceClient<T> + 'static,
{
    /// Exports rows and saves the blob through the sink.
    #[instrument(skip(self, options, ids), fields(resource = T::ENDPOINT, selected = ids.len()))]
    pub async fn export_data(&self, options: impl Into<ExportOptions>, ids: &[T::Id]) -> bool {
        let options = options.into();
        let query = match build_export_query(&self.compiled_query(), &options, ids) {
            Ok(query) => query,
            Err(e) => {
                self.record_failure("Export failed", &e);
                return false;
            }
        };
        debug!(?query, "Exporting");

        let result = async {
            let bytes = self.client.export(&query).await?;
            let name = export_file_name(T::ENDPOINT, &options.format);
            self.sink.save(&name, &bytes).await
        }
        .await;

        match result {
            Ok(path) => {
                info!(path = %path.display(), "Export saved");
                self.notifier.success(T::ENDPOINT, "Export complete");
                true
            }
            Err(e) => {
                self.record_failure("Export failed", &e);
                false
            }
        }
    }

    /// Uploads a spreadsheet. Rows the backend rejected are surfaced as a warning; the
    /// list is refetched either way once the upload is accepted.
    #[instrument(skip(self, file), fields(resource = T::ENDPOINT, file = %file.file_name))]
    pub async fn import_data(&self, file: ImportFile) -> Option<ImportResult> {
        match self.client.import(file).await {
            Ok(result) => {
                match result.outcome() {
                    ImportOutcome::Complete => {
                        info!(imported = result.imported_count, "Import complete");
                        self.notifier.success(
                            T::ENDPOINT,
                            format!("Imported {} rows", result.imported_count),
                        );
                    }
                    ImportOutcome::Partial { rejected } => {
                        info!(imported = result.imported_count, rejected, "Import partially applied");
                        self.notifier.warning(
                            T::ENDPOINT,
                            format!(
                                "Imported {} rows, {} rows rejected",
                                result.imported_count, rejected
                            ),
                        );
                    }
                }
                self.on_mutation_settled().await;
                Some(result)
            }
            Err(e) => {
                self.record_failure("Import failed", &e);
                None
            }
        }
    }

    /// Fetches the import template and saves it through the sink.
    #[instrument(skip(self), fields(resource = T::ENDPOINT))]
    pub async fn download_template(&self) -> bool {
        let result = async {
            let bytes = self.client.download_template().await?;
            let name = format!("{}_template.{}", T::ENDPOINT.replace('/', "_"), DEFAULT_EXPORT_FORMAT);
            self.sink.save(&name, &bytes).await
        }
        .await;

        match result {
            Ok(path) => {
                info!(path = %path.display(), "Template saved");
                self.notifier.success(T::ENDPOINT, "Template downloaded");
                true
            }
            Err(e) => {
                self.record_failure("Template download failed", &e);
                false
            }
        }
    }
}
