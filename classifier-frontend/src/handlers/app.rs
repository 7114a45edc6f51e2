use crate::services::{SessionViewStore, ViewStore};
use crate::view::page::{self, DocumentCard, MessageBanner, ViewSnapshot};
use crate::workflow;
use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Json, Redirect},
};
use serde_json::json;
use service_core::error::AppError;
use tower_sessions::Session;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub message: Option<MessageBanner>,
    pub loading: bool,
    pub uploading_filename: String,
    pub accept: String,
    pub allowed_label: String,
    pub documents: Vec<DocumentCard>,
}

/// Render the upload page, mounting the session view on first visit.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<IndexTemplate, AppError> {
    let store = SessionViewStore::new(session);
    let mut view = store.load().await?;

    if view.mark_mounted() {
        tracing::debug!("Mounting new session view");
        workflow::mount(state.classifier.as_ref(), &mut view).await;
        store.save(&view).await?;
    }

    Ok(IndexTemplate {
        message: page::banner(&view),
        loading: view.is_loading(),
        uploading_filename: view
            .phase()
            .uploading_filename()
            .unwrap_or_default()
            .to_string(),
        accept: state.upload_policy.accept_attribute(),
        allowed_label: state.upload_policy.describe(),
        documents: page::cards(&view),
    })
}

pub async fn dismiss_message(session: Session) -> Result<Redirect, AppError> {
    let store = SessionViewStore::new(session);
    let mut view = store.load().await?;
    view.dismiss_message();
    store.save(&view).await?;
    Ok(Redirect::to("/"))
}

/// JSON snapshot of the session view; polled by the page while uploading.
pub async fn view_snapshot(session: Session) -> Result<Json<ViewSnapshot>, AppError> {
    let view = SessionViewStore::new(session).load().await?;
    Ok(Json(ViewSnapshot::from(&view)))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "classifier-frontend",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
