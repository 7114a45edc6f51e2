use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::document::UNCLASSIFIED;

/// A file received from the browser, ready to be forwarded to the classifier.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Extension of `filename` in lowercase with its leading dot, taken after the last `.`.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

/// How long an upload may stay in flight before the session accepts another one.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// Which file extensions the frontend will forward to the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_extensions: Vec<String>,
    stale_after: Duration,
}

impl UploadPolicy {
    /// Entries are normalised to lowercase with a leading dot, so `"PDF"` and `".pdf"` are equal.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed_extensions: Vec<String> = Vec::new();
        for ext in allowed {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            if ext.is_empty() {
                continue;
            }
            let ext = format!(".{}", ext);
            if !allowed_extensions.contains(&ext) {
                allowed_extensions.push(ext);
            }
        }
        Self {
            allowed_extensions,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Age after which an unfinished upload no longer blocks the session.
    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn allows(&self, filename: &str) -> bool {
        extension_of(filename)
            .map(|ext| self.allowed_extensions.contains(&ext))
            .unwrap_or(false)
    }

    /// Comma-separated list for the file input's `accept` attribute.
    pub fn accept_attribute(&self) -> String {
        self.allowed_extensions.join(",")
    }

    /// Human list: ".txt", ".txt and .pdf", ".txt, .pdf, and .docx".
    pub fn describe(&self) -> String {
        match self.allowed_extensions.as_slice() {
            [] => "no".to_string(),
            [only] => only.clone(),
            [first, second] => format!("{} and {}", first, second),
            [init @ .., last] => format!("{}, and {}", init.join(", "), last),
        }
    }

    pub fn rejection_text(&self) -> String {
        format!("Only {} files are allowed.", self.describe())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new([".txt", ".pdf", ".docx"])
    }
}

/// Body of a successful `POST /upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub message: String,
    pub filename: String,
    #[serde(default)]
    pub predicted_category: Option<String>,
    #[serde(default)]
    pub confidence_scores: Option<BTreeMap<String, f64>>,
}

impl UploadReceipt {
    pub fn category_label(&self) -> &str {
        self.predicted_category.as_deref().unwrap_or(UNCLASSIFIED)
    }
}

/// Error body of the classifier. It reports rejections either as
/// `{"message": ...}` or, for framework-level errors, `{"detail": ...}`.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ServiceErrorBody {
    pub fn into_message(self) -> Option<String> {
        let detail = match self.detail {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        };
        self.message
            .into_iter()
            .chain(detail)
            .map(|m| m.trim().to_string())
            .find(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extension_is_case_insensitive_and_uses_last_dot() {
        assert_eq!(extension_of("Report.PDF"), Some(".pdf".to_string()));
        assert_eq!(extension_of("archive.tar.gz"), Some(".gz".to_string()));
        assert_eq!(extension_of(".txt"), Some(".txt".to_string()));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn default_policy_allows_text_pdf_docx() {
        let policy = UploadPolicy::default();
        assert!(policy.allows("notes.txt"));
        assert!(policy.allows("scan.PDF"));
        assert!(policy.allows("letter.docx"));
        assert!(!policy.allows("image.png"));
        assert!(!policy.allows("letter.doc"));
        assert!(!policy.allows(""));
    }

    #[test]
    fn policy_normalises_configured_entries() {
        let policy = UploadPolicy::new(["TXT", ".txt", " .Md "]);
        assert_eq!(policy.allowed_extensions(), &[".txt", ".md"]);
        assert_eq!(policy.accept_attribute(), ".txt,.md");
    }

    #[test]
    fn rejection_text_lists_extensions() {
        assert_eq!(
            UploadPolicy::default().rejection_text(),
            "Only .txt, .pdf, and .docx files are allowed."
        );
        assert_eq!(
            UploadPolicy::new([".txt"]).rejection_text(),
            "Only .txt files are allowed."
        );
        assert_eq!(UploadPolicy::new(["txt", "pdf"]).describe(), ".txt and .pdf");
    }

    #[test]
    fn error_body_prefers_message_then_detail() {
        let both: ServiceErrorBody =
            serde_json::from_value(json!({"message": "bad file", "detail": "ignored"})).unwrap();
        let detail_only: ServiceErrorBody =
            serde_json::from_value(json!({"detail": "Only .txt files are allowed"})).unwrap();
        let structured: ServiceErrorBody =
            serde_json::from_value(json!({"detail": [{"loc": ["body", "file"]}]})).unwrap();

        assert_eq!(both.into_message(), Some("bad file".to_string()));
        assert_eq!(
            detail_only.into_message(),
            Some("Only .txt files are allowed".to_string())
        );
        assert_eq!(structured.into_message(), None);
    }
}
