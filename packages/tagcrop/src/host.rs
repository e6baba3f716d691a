//! Event host: turns "blob uploaded" events into pipeline runs and crop uploads.
use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{error, info, info_span, warn, Instrument};

use crate::naming::crop_name;
use crate::pipeline::ImagePipeline;
use crate::store::{BlobStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Succeeded,
    PartiallyFailed,
    Failed,
}

/// Outcome of one blob event.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationReport {
    pub blob: String,
    pub started_at: String,
    pub crops_emitted: usize,
    pub uploaded: Vec<String>,
    /// `(crop name, error)` for every upload that failed.
    pub failed_uploads: Vec<(String, String)>,
    pub error: Option<String>,
    pub status: InvocationStatus,
}

impl InvocationReport {
    fn new(blob: &str) -> Self {
        Self {
            blob: blob.to_string(),
            started_at: Utc::now().to_rfc3339(),
            crops_emitted: 0,
            uploaded: Vec::new(),
            failed_uploads: Vec::new(),
            error: None,
            status: InvocationStatus::Succeeded,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == InvocationStatus::Succeeded
    }
}

/// Wires a pipeline to the raw and processed containers of a blob store.
pub struct TriggerHost {
    pipeline: Arc<ImagePipeline>,
    store: Arc<dyn BlobStore>,
    raw_container: String,
    processed_container: String,
    max_concurrent_blobs: usize,
}

impl TriggerHost {
    pub fn new(
        pipeline: Arc<ImagePipeline>,
        store: Arc<dyn BlobStore>,
        raw_container: impl Into<String>,
        processed_container: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            store,
            raw_container: raw_container.into(),
            processed_container: processed_container.into(),
            max_concurrent_blobs: 4,
        }
    }

    pub fn with_max_concurrent_blobs(mut self, max_concurrent_blobs: usize) -> Self {
        self.max_concurrent_blobs = max_concurrent_blobs.max(1);
        self
    }

    /// Handles one upload event whose payload is already in memory.
    ///
    /// Pipeline failures end the invocation without uploads. Upload failures are logged and
    /// the remaining crops are still attempted.
    pub async fn handle(&self, name: &str, bytes: Vec<u8>) -> InvocationReport {
        let span = info_span!("invocation", blob = %name);
        self.handle_inner(name, bytes).instrument(span).await
    }

    async fn handle_inner(&self, name: &str, bytes: Vec<u8>) -> InvocationReport {
        info!(size = bytes.len(), "image manipulation triggered");
        let mut report = InvocationReport::new(name);

        let crops = match self.pipeline.process(bytes).await {
            Ok(crops) => crops,
            Err(e) => {
                error!(stage = e.stage(), error = %e, "invocation failed");
                report.error = Some(e.to_string());
                report.status = InvocationStatus::Failed;
                return report;
            }
        };
        report.crops_emitted = crops.len();

        for crop in &crops {
            let crop_blob = crop_name(name, crop.index);
            match self
                .store
                .put(&self.processed_container, &crop_blob, &crop.bytes)
                .await
            {
                Ok(()) => {
                    info!(
                        crop = %crop_blob,
                        container = %self.processed_container,
                        "uploaded crop"
                    );
                    report.uploaded.push(crop_blob);
                }
                Err(e) => {
                    warn!(crop = %crop_blob, stage = "upload", error = %e, "crop upload failed");
                    report.failed_uploads.push((crop_blob, e.to_string()));
                }
            }
        }

        if !report.failed_uploads.is_empty() {
            report.status = if report.uploaded.is_empty() {
                InvocationStatus::Failed
            } else {
                InvocationStatus::PartiallyFailed
            };
        }
        report
    }

    /// Fetches `name` from the raw container and handles it as an upload event.
    pub async fn handle_blob(&self, name: &str) -> InvocationReport {
        match self.store.get(&self.raw_container, name).await {
            Ok(bytes) => self.handle(name, bytes).await,
            Err(e) => {
                error!(blob = %name, stage = "fetch", error = %e, "could not read blob");
                let mut report = InvocationReport::new(name);
                report.error = Some(e.to_string());
                report.status = InvocationStatus::Failed;
                report
            }
        }
    }

    /// Replays an upload event for every raw blob whose name matches `pattern`.
    ///
    /// Blobs are processed concurrently, at most `max_concurrent_blobs` at a time. Reports come
    /// back in blob name order.
    pub async fn drain(self: &Arc<Self>, pattern: &str) -> Result<Vec<InvocationReport>, StoreError> {
        let matcher = glob_to_regex(pattern)?;
        let names: Vec<String> = self
            .store
            .list(&self.raw_container)
            .await?
            .into_iter()
            .filter(|name| matcher.is_match(name))
            .collect();

        info!(
            blobs = names.len(),
            container = %self.raw_container,
            max_concurrent = self.max_concurrent_blobs,
            "draining container"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_blobs));
        let mut tasks = Vec::with_capacity(names.len());
        for name in names {
            let host = Arc::clone(self);
            let semaphore = semaphore.clone();
            tasks.push((
                name.clone(),
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    host.handle_blob(&name).await
                }),
            ));
        }

        let mut reports = Vec::with_capacity(tasks.len());
        for (name, task) in tasks {
            match task.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(blob = %name, error = %e, "invocation task aborted");
                    let mut report = InvocationReport::new(&name);
                    report.error = Some(e.to_string());
                    report.status = InvocationStatus::Failed;
                    reports.push(report);
                }
            }
        }
        Ok(reports)
    }
}

/// Translates a blob glob (`*`, `**`, `?`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex, StoreError> {
    let mut regex = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                regex.push_str(".*");
            }
            '*' => regex.push_str("[^/]*"),
            '?' => regex.push_str("[^/]"),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');
    Regex::new(&regex).map_err(|e| StoreError::InvalidName(format!("{pattern}: {e}")))
}
