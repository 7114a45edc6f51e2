//! Per-session view state behind the upload page.
//!
//! Every UI event maps to exactly one method on [`ViewState`]; the
//! workflows in [`crate::workflow`] drive the network calls around them.
//! Upload flow: Idle → Validating → (Rejected | Uploading) → (Success | Failed) → Idle.

pub mod message;
pub mod page;

pub use message::{Message, MessageKind};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{sort_most_recent_first, DocumentId, DocumentRecord, UploadPolicy, UploadReceipt};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading {
        filename: String,
        id: Uuid,
        started_at: DateTime<Utc>,
    },
}

impl UploadPhase {
    pub fn uploading_filename(&self) -> Option<&str> {
        match self {
            UploadPhase::Uploading { filename, .. } => Some(filename),
            UploadPhase::Idle => None,
        }
    }
}

/// Identifies the upload admitted by [`ViewState::begin_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    id: Uuid,
}

/// Why `begin_upload` did not start a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRefused {
    #[error("an upload is already in progress")]
    Busy,
    #[error("no file selected")]
    NoFile,
    #[error("extension not allowed for {filename}")]
    DisallowedExtension { filename: String },
    #[error("file exceeds the {limit_bytes} byte upload limit")]
    TooLarge { limit_bytes: usize },
    #[error("upload body could not be read")]
    Unreadable,
}

fn describe_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KB", bytes / 1024)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Result of the upload request, as far as the view is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Accepted(UploadReceipt),
    /// The classifier answered with an error; `reason` is its message or the status text.
    Rejected { reason: String },
    /// The request never produced a usable answer.
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    mounted: bool,
    message: Option<Message>,
    documents: Vec<DocumentRecord>,
    expanded: Option<DocumentId>,
    phase: UploadPhase,
}

impl ViewState {
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Returns true the first time only.
    pub fn mark_mounted(&mut self) -> bool {
        !std::mem::replace(&mut self.mounted, true)
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn expanded(&self) -> Option<&DocumentId> {
        self.expanded.as_ref()
    }

    pub fn is_expanded(&self, id: &DocumentId) -> bool {
        self.expanded.as_ref() == Some(id)
    }

    pub fn phase(&self) -> &UploadPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, UploadPhase::Uploading { .. })
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.iter().any(|d| &d.id == id)
    }

    /// Replace the list with a fresh fetch, most recent first.
    pub fn replace_documents(&mut self, mut documents: Vec<DocumentRecord>) {
        sort_most_recent_first(&mut documents);
        self.documents = documents;

        if let Some(id) = &self.expanded {
            if !self.contains(id) {
                self.expanded = None;
            }
        }
    }

    /// Validate a selected file and enter the uploading phase.
    ///
    /// On refusal the view carries an error message and stays idle (or stays
    /// uploading, for `Busy`).
    pub fn begin_upload(
        &mut self,
        filename: &str,
        policy: &UploadPolicy,
    ) -> Result<UploadTicket, UploadRefused> {
        self.begin_upload_at(filename, policy, Utc::now())
    }

    /// [`begin_upload`](Self::begin_upload) with an explicit clock. An upload
    /// older than `policy.stale_after()` no longer counts as in flight.
    pub fn begin_upload_at(
        &mut self,
        filename: &str,
        policy: &UploadPolicy,
        now: DateTime<Utc>,
    ) -> Result<UploadTicket, UploadRefused> {
        if let UploadPhase::Uploading { started_at, .. } = &self.phase {
            let age = (now - *started_at).to_std().unwrap_or_default();
            if age < policy.stale_after() {
                return Err(self.refuse(UploadRefused::Busy, policy));
            }
        }

        if filename.trim().is_empty() {
            return Err(self.refuse(UploadRefused::NoFile, policy));
        }

        if !policy.allows(filename) {
            return Err(self.refuse(
                UploadRefused::DisallowedExtension {
                    filename: filename.to_string(),
                },
                policy,
            ));
        }

        let id = Uuid::new_v4();
        self.message = None;
        self.phase = UploadPhase::Uploading {
            filename: filename.to_string(),
            id,
            started_at: now,
        };
        Ok(UploadTicket { id })
    }

    /// Show why a file was not uploaded. The upload phase is left as is.
    pub fn refuse(&mut self, refused: UploadRefused, policy: &UploadPolicy) -> UploadRefused {
        let text = match &refused {
            UploadRefused::Busy => "An upload is already in progress.".to_string(),
            UploadRefused::NoFile => "No file selected.".to_string(),
            UploadRefused::DisallowedExtension { .. } => policy.rejection_text(),
            UploadRefused::TooLarge { limit_bytes } => format!(
                "File is larger than the {} upload limit.",
                describe_size(*limit_bytes)
            ),
            UploadRefused::Unreadable => "Failed to read the uploaded file.".to_string(),
        };
        self.message = Some(Message::error(text));
        refused
    }

    /// Record the outcome of the upload behind `ticket`. Returns true when the
    /// list should be refreshed.
    ///
    /// The phase only returns to idle if `ticket` still owns it; a newer upload
    /// admitted after this one went stale keeps the session busy.
    pub fn complete_upload(&mut self, ticket: UploadTicket, outcome: UploadOutcome) -> bool {
        if matches!(&self.phase, UploadPhase::Uploading { id, .. } if *id == ticket.id) {
            self.phase = UploadPhase::Idle;
        }

        match outcome {
            UploadOutcome::Accepted(receipt) => {
                self.message = Some(Message::success(format!(
                    "{} - {}. Category: {}",
                    receipt.message,
                    receipt.filename,
                    receipt.category_label()
                )));
                true
            }
            UploadOutcome::Rejected { reason } => {
                self.message = Some(Message::error(reason));
                false
            }
            UploadOutcome::Failed => {
                self.message = Some(Message::error("Failed to upload file."));
                false
            }
        }
    }

    /// Open `id`, or close it if it is already open. Opening one closes any other.
    pub fn toggle_disclosure(&mut self, id: &DocumentId) {
        if self.is_expanded(id) {
            self.expanded = None;
        } else {
            self.expanded = Some(id.clone());
        }
    }

    pub fn dismiss_message(&mut self) {
        self.message = None;
    }
}
