use serde::{Deserialize, Serialize};

const SUCCESS_PREFIX: &str = "Success";
const ERROR_PREFIX: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Success,
    Error,
}

impl MessageKind {
    /// CSS modifier used by the page template.
    pub fn css_class(self) -> &'static str {
        match self {
            MessageKind::Success => "message--success",
            MessageKind::Error => "message--error",
        }
    }
}

/// A dismissible status line. Styling is derived from the text prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(String);

impl Message {
    pub fn success(detail: impl AsRef<str>) -> Self {
        Message(format!("{}: {}", SUCCESS_PREFIX, detail.as_ref()))
    }

    pub fn error(detail: impl AsRef<str>) -> Self {
        Message(format!("{}: {}", ERROR_PREFIX, detail.as_ref()))
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> MessageKind {
        if self.0.starts_with(SUCCESS_PREFIX) {
            MessageKind::Success
        } else {
            MessageKind::Error
        }
    }
}
