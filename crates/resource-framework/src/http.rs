//! HTTP implementation of [`ResourceClient`] for the admin REST API.
//!
//! JSON routes answer with an envelope `{success, data, pagination, message}`; export and
//! template routes answer with a raw blob. Every request carries the session's bearer
//! token when there is one.

use crate::client::{ImportFile, ImportResult, ListResponse, ResourceClient, ReviewClient};
use crate::config::ClientConfig;
use crate::entity::{ResourceEntity, Reviewable};
use crate::error::{status_message, FieldError, ResourceError, Result};
use crate::pagination::ServerPagination;
use crate::query::QueryParams;
use crate::review::ReviewAction;
use crate::session::Session;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct Envelope<D> {
    success: Option<bool>,
    data: Option<D>,
    pagination: Option<ServerPagination>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

/// REST client bound to one resource endpoint.
pub struct HttpResourceClient<T> {
    client: Client,
    base: Url,
    session: Arc<dyn Session>,
    _resource: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base: self.base.clone(),
            session: Arc::clone(&self.session),
            _resource: PhantomData,
        }
    }
}

impl<T: ResourceEntity> HttpResourceClient<T> {
    pub fn new(config: &ClientConfig, session: Arc<dyn Session>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Self::with_client(client, &config.base_url, session)
    }

    /// Shares one connection pool across resource clients.
    pub fn with_client(client: Client, base_url: &str, session: Arc<dyn Session>) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| ResourceError::InvalidInput(format!("invalid base url {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ResourceError::InvalidInput(format!(
                "base url {base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            client,
            base,
            session,
            _resource: PhantomData,
        })
    }

    /// `<base>/<endpoint>/<segments...>`
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(T::ENDPOINT.split('/'))
                .extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(self.failure(response).await)
        }
    }

    async fn failure(&self, response: Response) -> ResourceError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(resource = T::ENDPOINT, "Session rejected, logging out");
            self.session.force_logout();
            return ResourceError::Unauthorized;
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .message
            .or(body.error)
            .filter(|m| !m.trim().is_empty());

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let mut errors = body.errors;
            if errors.is_empty() {
                errors.extend(message.map(|message| FieldError {
                    field: None,
                    message,
                }));
            }
            return ResourceError::Validation { errors };
        }

        let status = status.as_u16();
        ResourceError::Status {
            status,
            message: message.unwrap_or_else(|| status_message(status)),
        }
    }

    async fn envelope<D: DeserializeOwned>(&self, response: Response) -> Result<Envelope<D>> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Envelope {
                success: None,
                data: None,
                pagination: None,
                message: None,
            });
        }
        let envelope: Envelope<D> = serde_json::from_slice(&bytes)?;
        if envelope.success == Some(false) {
            return Err(ResourceError::Status {
                status,
                message: envelope
                    .message
                    .unwrap_or_else(|| status_message(status)),
            });
        }
        Ok(envelope)
    }

    async fn data<D: DeserializeOwned>(&self, response: Response) -> Result<D> {
        let envelope = self.envelope(response).await?;
        if let Some(message) = &envelope.message {
            debug!(resource = T::ENDPOINT, %message, "Server message");
        }
        envelope
            .data
            .ok_or_else(|| ResourceError::Decode("response envelope has no data".into()))
    }

    async fn blob(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl<T: ResourceEntity> ResourceClient<T> for HttpResourceClient<T> {
    #[instrument(skip(self, query), fields(resource = T::ENDPOINT))]
    async fn list(&self, query: &QueryParams) -> Result<ListResponse<T>> {
        let request = self.client.get(self.url(&[])).query(&query.to_pairs());
        let response = self.send(request).await?;
        let envelope: Envelope<Vec<T>> = self.envelope(response).await?;
        Ok(ListResponse {
            items: envelope.data.unwrap_or_default(),
            pagination: envelope.pagination,
        })
    }

    #[instrument(skip(self), fields(resource = T::ENDPOINT))]
    async fn get_by_id(&self, id: &T::Id) -> Result<T> {
        let id = id.to_string();
        let response = self.send(self.client.get(self.url(&[id.as_str()]))).await?;
        self.data(response).await
    }

    #[instrument(skip(self, payload), fields(resource = T::ENDPOINT))]
    async fn create(&self, payload: &T::Create) -> Result<T> {
        let response = self
            .send(self.client.post(self.url(&[])).json(payload))
            .await?;
        self.data(response).await
    }

    #[instrument(skip(self, payload), fields(resource = T::ENDPOINT))]
    async fn update(&self, id: &T::Id, payload: &T::Update) -> Result<T> {
        let id = id.to_string();
        let response = self
            .send(self.client.put(self.url(&[id.as_str()])).json(payload))
            .await?;
        self.data(response).await
    }

    #[instrument(skip(self), fields(resource = T::ENDPOINT))]
    async fn delete(&self, id: &T::Id) -> Result<()> {
        let id = id.to_string();
        let response = self.send(self.client.delete(self.url(&[id.as_str()]))).await?;
        self.envelope::<Value>(response).await.map(|_| ())
    }

    #[instrument(skip(self, query), fields(resource = T::ENDPOINT))]
    async fn export(&self, query: &QueryParams) -> Result<Vec<u8>> {
        let request = self
            .client
            .get(self.url(&["export"]))
            .query(&query.to_pairs());
        self.blob(request).await
    }

    #[instrument(skip(self, file), fields(resource = T::ENDPOINT, file = %file.file_name))]
    async fn import(&self, file: ImportFile) -> Result<ImportResult> {
        let part = Part::bytes(file.bytes).file_name(file.file_name);
        let form = Form::new().part("file", part);
        let response = self
            .send(self.client.post(self.url(&["import"])).multipart(form))
            .await?;
        self.data(response).await
    }

    #[instrument(skip(self), fields(resource = T::ENDPOINT))]
    async fn download_template(&self) -> Result<Vec<u8>> {
        self.blob(self.client.get(self.url(&["template"]))).await
    }
}

#[async_trait]
impl<T: Reviewable> ReviewClient<T> for HttpResourceClient<T> {
    #[instrument(skip(self, action), fields(resource = T::ENDPOINT, step = %action.step()))]
    async fn transition(&self, id: &T::Id, action: &ReviewAction) -> Result<T> {
        let id = id.to_string();
        let url = self.url(&[id.as_str(), action.step().path_segment()]);
        let request = match action {
            ReviewAction::Reject { comment } => self.client.patch(url).json(&json!({ "comment": comment })),
            ReviewAction::RequestUnpublish { reason } => {
                self.client.patch(url).json(&json!({ "reason": reason }))
            }
            _ => self.client.patch(url),
        };
        let response = self.send(request).await?;
        self.data(response).await
    }
}
