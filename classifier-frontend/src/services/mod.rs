pub mod classifier_client;
pub mod metrics;
pub mod view_store;

pub use classifier_client::{ClassifierApi, ClassifierClient, ClientError};
pub use view_store::{MemoryViewStore, SessionViewStore, StoreError, ViewStore};
