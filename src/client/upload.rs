// src/client/upload.rs

//! Concurrent image uploads to an object store.
//!
//! Each file is uploaded by its own task. Progress is reported per file over
//! a channel and is not aggregated. A run succeeds only if every upload
//! succeeds; the first failure aborts the remaining tasks.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header;
use tokio::{sync::mpsc, task::JoinSet};

use super::ClientError;

/// Largest image accepted for upload.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// One progress event of one file in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    /// Position of the file in the run.
    pub index: usize,
    pub name: String,
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.sent as f64 / self.total as f64 * 100.0
    }
}

/// Progress reporter handed to a single upload.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    index: usize,
    name: String,
    tx: Option<mpsc::UnboundedSender<UploadProgress>>,
}

impl ProgressSink {
    pub fn report(&self, sent: u64, total: u64) {
        if let Some(tx) = &self.tx {
            // receiver gone means nobody is watching
            let _ = tx.send(UploadProgress {
                index: self.index,
                name: self.name.clone(),
                sent,
                total,
            });
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores one object and returns its public download URL.
    async fn put(
        &self,
        object_name: &str,
        file: ImageFile,
        progress: ProgressSink,
    ) -> Result<String, ClientError>;
}

/// Object store reachable with plain HTTP `PUT`, e.g. a bucket endpoint.
/// Objects are readable at `{base_url}/{object_name}`.
#[derive(Clone)]
pub struct HttpObjectStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        object_name: &str,
        file: ImageFile,
        progress: ProgressSink,
    ) -> Result<String, ClientError> {
        let url = format!("{}/{}", self.base_url, object_name);
        let total = file.bytes.len() as u64;

        let chunks: Vec<Bytes> = (0..file.bytes.len())
            .step_by(CHUNK_SIZE)
            .map(|start| file.bytes.slice(start..(start + CHUNK_SIZE).min(file.bytes.len())))
            .collect();
        let mut sent = 0u64;
        let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            progress.report(sent, total);
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let response = self
            .http
            .put(&url)
            .header(header::CONTENT_TYPE, file.content_type)
            .header(header::CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Upload(format!(
                "object store answered {} for {}",
                response.status(),
                object_name
            )));
        }
        Ok(url)
    }
}

/// Runs upload batches against an object store.
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    /// Per-file time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uploads every file concurrently and returns the URLs in input order.
    ///
    /// Fails on the first error or timeout; the remaining uploads are aborted
    /// and no URLs are returned.
    pub async fn upload_all(
        &self,
        files: Vec<ImageFile>,
        progress: Option<mpsc::UnboundedSender<UploadProgress>>,
    ) -> Result<Vec<String>, ClientError> {
        let stamp = chrono::Utc::now().timestamp_millis();
        let count = files.len();
        let mut tasks = JoinSet::new();

        for (index, file) in files.into_iter().enumerate() {
            let store = self.store.clone();
            let timeout = self.timeout;
            let object_name = format!("{stamp}-{index}-{}", safe_object_name(&file.name));
            let sink = ProgressSink {
                index,
                name: file.name.clone(),
                tx: progress.clone(),
            };
            tasks.spawn(async move {
                let result = tokio::time::timeout(timeout, store.put(&object_name, file, sink))
                    .await
                    .unwrap_or_else(|_| {
                        Err(ClientError::Upload(format!("{object_name} timed out")))
                    });
                (index, result)
            });
        }

        let mut urls: Vec<Option<String>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok((index, Ok(url))) => {
                    urls[index] = Some(url);
                    continue;
                }
                Ok((_, Err(e))) => e,
                Err(e) => ClientError::Upload(e.to_string()),
            };
            tracing::warn!("image upload failed: {}", outcome);
            tasks.abort_all();
            return Err(outcome);
        }

        Ok(urls.into_iter().flatten().collect())
    }
}

/// Keeps object names URL-safe.
fn safe_object_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
