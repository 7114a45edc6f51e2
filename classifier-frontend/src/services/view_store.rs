//! Persistence of [`ViewState`] between requests of one browser session.

use crate::view::ViewState;
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;

/// Session key under which the view is stored.
pub const VIEW_SESSION_KEY: &str = "view";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::SessionError(err.to_string())
    }
}

#[async_trait]
pub trait ViewStore: Send + Sync {
    /// The stored view, or a fresh unmounted one.
    async fn load(&self) -> Result<ViewState, StoreError>;

    /// Persist immediately so concurrent requests of the session observe it.
    async fn save(&self, view: &ViewState) -> Result<(), StoreError>;
}

/// View stored in the caller's `tower-sessions` session.
pub struct SessionViewStore {
    session: Session,
}

impl SessionViewStore {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ViewStore for SessionViewStore {
    async fn load(&self) -> Result<ViewState, StoreError> {
        let view: Option<ViewState> = self.session.get(VIEW_SESSION_KEY).await?;
        Ok(view.unwrap_or_default())
    }

    async fn save(&self, view: &ViewState) -> Result<(), StoreError> {
        self.session.insert(VIEW_SESSION_KEY, view).await?;
        self.session.save().await?;
        Ok(())
    }
}

/// Process-local store holding a single view. Useful outside an HTTP request.
#[derive(Clone, Default)]
pub struct MemoryViewStore {
    inner: Arc<Mutex<ViewState>>,
}

impl MemoryViewStore {
    pub fn new(view: ViewState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(view)),
        }
    }

    pub async fn snapshot(&self) -> ViewState {
        self.inner.lock().await.clone()
    }
}

#[async_trait]
impl ViewStore for MemoryViewStore {
    async fn load(&self) -> Result<ViewState, StoreError> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, view: &ViewState) -> Result<(), StoreError> {
        *self.inner.lock().await = view.clone();
        Ok(())
    }
}
