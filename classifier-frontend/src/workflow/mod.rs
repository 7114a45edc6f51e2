//! Network-driving operations around [`ViewState`].

use crate::models::{UploadFile, UploadPolicy, UploadReceipt};
use crate::services::metrics::record_upload;
use crate::services::{ClassifierApi, ClientError, StoreError, ViewStore};
use crate::view::{UploadOutcome, UploadRefused, UploadTicket, ViewState};
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinError;

/// First view of a session: log a liveness probe, then load the list.
pub async fn mount(api: &dyn ClassifierApi, view: &mut ViewState) {
    match api.health().await {
        Ok(body) => tracing::info!(health = %body, "Classifier service is reachable"),
        Err(e) => tracing::warn!(error = %e, "Classifier health check failed"),
    }

    fetch_documents(api, view).await;
}

/// Replace the document list. On failure the previous list is kept.
///
/// Returns whether the list was replaced.
pub async fn fetch_documents(api: &dyn ClassifierApi, view: &mut ViewState) -> bool {
    match api.list_documents().await {
        Ok(documents) => {
            view.replace_documents(documents);
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch documents");
            false
        }
    }
}

fn outcome_of(result: Result<UploadReceipt, ClientError>, filename: &str) -> UploadOutcome {
    match result {
        Ok(receipt) => {
            tracing::info!(
                filename = %filename,
                category = %receipt.category_label(),
                "Upload classified"
            );
            record_upload("accepted");
            UploadOutcome::Accepted(receipt)
        }
        Err(ClientError::Rejected { status, message }) => {
            tracing::warn!(filename = %filename, status = %status, reason = %message, "Upload rejected");
            record_upload("rejected");
            UploadOutcome::Rejected { reason: message }
        }
        Err(e) => {
            tracing::error!(filename = %filename, error = %e, "Upload failed");
            record_upload("failed");
            UploadOutcome::Failed
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("upload task did not finish: {0}")]
    Task(#[from] JoinError),
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Store(e) => e.into(),
            WorkflowError::Task(e) => AppError::InternalError(anyhow::Error::new(e)),
        }
    }
}

/// Admits uploads one at a time and runs them to completion.
///
/// Clones share the admission lock, so the check for an upload in flight and
/// the save of the uploading phase happen as one step for every session.
#[derive(Clone)]
pub struct Uploader {
    api: Arc<dyn ClassifierApi>,
    policy: Arc<UploadPolicy>,
    admission: Arc<Mutex<()>>,
}

impl Uploader {
    pub fn new(api: Arc<dyn ClassifierApi>, policy: Arc<UploadPolicy>) -> Self {
        Self {
            api,
            policy,
            admission: Arc::new(Mutex::new(())),
        }
    }

    /// Validate and submit one file, then refresh the list on success.
    ///
    /// The view is saved as "uploading" before the request goes out, so a
    /// second upload from the same session is refused until this one
    /// completes. The request and its completion run on a spawned task: if
    /// the caller is dropped (the browser disconnects) the phase still
    /// returns to idle once the classifier answers. Disclosure changes made by
    /// other requests while the upload is in flight are overwritten by the
    /// final save.
    pub async fn handle_file(
        &self,
        store: Arc<dyn ViewStore>,
        file: UploadFile,
    ) -> Result<(), WorkflowError> {
        let Some(ticket) = self.admit(store.as_ref(), &file.filename).await? else {
            return Ok(());
        };

        let api = Arc::clone(&self.api);
        let completion = tokio::spawn(async move {
            let filename = file.filename.clone();
            let outcome = outcome_of(api.upload(file).await, &filename);

            let mut view = store.load().await?;
            if view.complete_upload(ticket, outcome) {
                fetch_documents(api.as_ref(), &mut view).await;
            }
            store.save(&view).await
        });

        completion.await??;
        Ok(())
    }

    /// Show why a file could not even be read from the request.
    pub async fn reject_file(
        &self,
        store: &dyn ViewStore,
        refused: UploadRefused,
    ) -> Result<(), StoreError> {
        tracing::info!(reason = %refused, "Upload refused");
        record_upload("refused");

        let mut view = store.load().await?;
        view.refuse(refused, &self.policy);
        store.save(&view).await
    }

    async fn admit(
        &self,
        store: &dyn ViewStore,
        filename: &str,
    ) -> Result<Option<UploadTicket>, StoreError> {
        let _admission = self.admission.lock().await;

        let mut view = store.load().await?;
        let ticket = match view.begin_upload(filename, &self.policy) {
            Ok(ticket) => Some(ticket),
            Err(UploadRefused::Busy) => {
                tracing::warn!(filename = %filename, "Upload refused: another upload in flight");
                record_upload("refused");
                None
            }
            Err(refused) => {
                tracing::info!(filename = %filename, reason = %refused, "Upload refused");
                record_upload("refused");
                None
            }
        };
        store.save(&view).await?;

        Ok(ticket)
    }
}
