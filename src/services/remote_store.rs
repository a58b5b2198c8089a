//! Remote store transport for visitrack.
//!
//! The remote side is an opaque JSON document behind a key-value API:
//! full-document GET and full-document PUT, authenticated with a single
//! header. The [`RemoteStore`] trait is the transport seam: tests
//! substitute an in-memory fake, production uses [`HttpRemoteStore`].

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::types::errors::SyncError;
use crate::types::settings::ServerSettings;
use crate::types::sync::{RemoteDocument, RemoteRecord};

const AUTH_HEADER: &str = "X-Master-Key";

/// Trait defining remote document access.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// True when credentials are present and sync is enabled.
    fn is_configured(&self) -> bool;

    /// Fetches the remote record. Absent, unconfigured, or malformed
    /// documents all surface as `Ok(None)`; only transport and HTTP-status
    /// failures are errors.
    async fn fetch(&self) -> Result<Option<RemoteRecord>, SyncError>;

    /// Overwrites the remote document with `record`.
    async fn put(&self, record: &RemoteRecord) -> Result<(), SyncError>;

    /// Best-effort, non-blocking, non-cancelable delivery of `record`,
    /// for page-unload pushes that must not block navigation. Delivery is
    /// not guaranteed and failures are not reported.
    fn dispatch(&self, record: RemoteRecord);
}

/// HTTP implementation of [`RemoteStore`].
pub struct HttpRemoteStore {
    client: reqwest::Client,
    settings: ServerSettings,
    unconfigured_warned: AtomicBool,
}

impl HttpRemoteStore {
    pub fn new(settings: ServerSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            unconfigured_warned: AtomicBool::new(false),
        }
    }

    fn document_url(&self) -> String {
        format!("{}/{}", self.settings.endpoint, self.settings.resource_id)
    }

    /// Warns once per process that remote operations are no-ops.
    fn note_unconfigured(&self) {
        if !self.unconfigured_warned.swap(true, Ordering::Relaxed) {
            log::warn!("remote store not configured, sync disabled");
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    async fn fetch(&self) -> Result<Option<RemoteRecord>, SyncError> {
        if !self.is_configured() {
            self.note_unconfigured();
            return Ok(None);
        }

        let response = self
            .client
            .get(self.document_url())
            .header(AUTH_HEADER, &self.settings.api_key)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus(status.as_u16()));
        }

        match response.json::<RemoteDocument>().await {
            Ok(document) => Ok(Some(document.record)),
            Err(e) => {
                // Malformed document reads as remote-absent.
                log::warn!("remote document did not parse, treating as absent: {}", e);
                Ok(None)
            }
        }
    }

    async fn put(&self, record: &RemoteRecord) -> Result<(), SyncError> {
        if !self.is_configured() {
            self.note_unconfigured();
            return Err(SyncError::NotConfigured);
        }

        let response = self
            .client
            .put(self.document_url())
            .header(AUTH_HEADER, &self.settings.api_key)
            .json(record)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }

    fn dispatch(&self, record: RemoteRecord) {
        if !self.is_configured() {
            self.note_unconfigured();
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("no async runtime, unload push dropped");
                return;
            }
        };

        let request = self
            .client
            .post(self.document_url())
            .header(AUTH_HEADER, &self.settings.api_key)
            .json(&record);

        handle.spawn(async move {
            if let Err(e) = request.send().await {
                log::debug!("unload push not delivered: {}", e);
            }
        });
    }
}
