pub mod document;
pub mod upload;

pub use document::{DocumentId, DocumentRecord, ScoreRow, sort_most_recent_first};
pub use upload::{ServiceErrorBody, UploadFile, UploadPolicy, UploadReceipt};
