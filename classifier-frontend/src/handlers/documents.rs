use crate::models::DocumentId;
use crate::services::{SessionViewStore, ViewStore};
use crate::workflow;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use service_core::error::AppError;
use tower_sessions::Session;

pub async fn refresh_documents(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let store = SessionViewStore::new(session);
    let mut view = store.load().await?;

    workflow::fetch_documents(state.classifier.as_ref(), &mut view).await;
    store.save(&view).await?;

    Ok(Redirect::to("/"))
}

/// Expand or collapse one document card.
pub async fn toggle_document(
    Path(id): Path<String>,
    session: Session,
) -> Result<Redirect, AppError> {
    let store = SessionViewStore::new(session);
    let mut view = store.load().await?;
    let id = DocumentId::from(id);

    if !view.contains(&id) {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "document {} is not in the current list",
            id
        )));
    }

    view.toggle_disclosure(&id);
    store.save(&view).await?;

    Ok(Redirect::to(&format!("/#doc-{}", id.slug())))
}
