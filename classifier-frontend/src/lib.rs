pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod view;
pub mod workflow;

use models::UploadPolicy;
use services::ClassifierApi;
use std::sync::Arc;
use workflow::Uploader;

/// Shared application state containing the classifier client and upload rules
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn ClassifierApi>,
    pub upload_policy: Arc<UploadPolicy>,
    pub uploader: Uploader,
    pub max_upload_bytes: usize,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(classifier: Arc<dyn ClassifierApi>, upload_policy: UploadPolicy) -> Self {
        let upload_policy = Arc::new(upload_policy);
        Self {
            uploader: Uploader::new(Arc::clone(&classifier), Arc::clone(&upload_policy)),
            classifier,
            upload_policy,
            max_upload_bytes: 10 * 1024 * 1024,
            secure_cookies: false,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}
