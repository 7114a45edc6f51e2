//! Flattened, template-ready projections of [`ViewState`].

use serde::Serialize;

use super::{MessageKind, ViewState};
use crate::models::{DocumentRecord, ScoreRow};

pub struct MessageBanner {
    pub text: String,
    pub css_class: &'static str,
}

pub struct DocumentCard {
    pub id: String,
    /// Percent-encoded id, safe as a path segment and as a fragment.
    pub slug: String,
    pub filename: String,
    pub category: String,
    pub upload_time: String,
    pub expanded: bool,
    /// Empty unless the card is expanded.
    pub scores: Vec<ScoreRow>,
    pub has_scores: bool,
}

impl DocumentCard {
    pub fn from_record(record: &DocumentRecord, expanded: bool) -> Self {
        let scores = if expanded {
            record.ranked_scores()
        } else {
            Vec::new()
        };

        Self {
            id: record.id.to_string(),
            slug: record.id.slug(),
            filename: record.filename.clone(),
            category: record.category_label().to_string(),
            upload_time: record
                .uploaded_at()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| record.upload_time.clone()),
            expanded,
            scores,
            has_scores: record
                .confidence_scores
                .as_ref()
                .is_some_and(|s| !s.is_empty()),
        }
    }
}

pub fn banner(view: &ViewState) -> Option<MessageBanner> {
    view.message().map(|m| MessageBanner {
        text: m.text().to_string(),
        css_class: m.kind().css_class(),
    })
}

pub fn cards(view: &ViewState) -> Vec<DocumentCard> {
    view.documents()
        .iter()
        .map(|d| DocumentCard::from_record(d, view.is_expanded(&d.id)))
        .collect()
}

/// JSON shape served at `/api/view`.
#[derive(Debug, Serialize)]
pub struct ViewSnapshot {
    pub loading: bool,
    pub uploading: Option<String>,
    pub message: Option<String>,
    pub message_kind: Option<MessageKind>,
    pub expanded: Option<String>,
    pub document_count: usize,
}

impl From<&ViewState> for ViewSnapshot {
    fn from(view: &ViewState) -> Self {
        Self {
            loading: view.is_loading(),
            uploading: view.phase().uploading_filename().map(str::to_string),
            message: view.message().map(|m| m.text().to_string()),
            message_kind: view.message().map(|m| m.kind()),
            expanded: view.expanded().map(|id| id.to_string()),
            document_count: view.documents().len(),
        }
    }
}
