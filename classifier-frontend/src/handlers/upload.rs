use crate::models::UploadFile;
use crate::services::SessionViewStore;
use crate::view::UploadRefused;
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Redirect,
};
use service_core::error::AppError;
use std::sync::Arc;
use tower_sessions::Session;

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

async fn read_file(multipart: &mut Multipart) -> Result<Option<UploadFile>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await?;

        return Ok(Some(UploadFile::new(file_name, content_type, data.to_vec())));
    }

    Ok(None)
}

pub async fn upload_handler(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let store = Arc::new(SessionViewStore::new(session));

    let file = match read_file(&mut multipart).await {
        Ok(file) => file,
        Err(e) => {
            let refused = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                UploadRefused::TooLarge {
                    limit_bytes: state.max_upload_bytes,
                }
            } else {
                UploadRefused::Unreadable
            };
            tracing::warn!(error = %e, "Could not read upload body");
            state.uploader.reject_file(store.as_ref(), refused).await?;
            return Ok(Redirect::to("/"));
        }
    };

    // A form without a file field is handled as an empty selection.
    let file = file.unwrap_or_else(|| UploadFile::new("", "application/octet-stream", Vec::new()));

    state.uploader.handle_file(store, file).await?;

    Ok(Redirect::to("/"))
}
