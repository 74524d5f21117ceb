//! HTTP API: chat proxy, contact form, audio upload and the relay socket

mod handlers;
mod socket;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::contact::ContactStore;
use crate::llm::LlmService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    /// `None` when no provider credentials are configured
    pub llm: Option<Arc<dyn LlmService>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContactStore>, llm: Option<Arc<dyn LlmService>>) -> Self {
        Self { store, llm }
    }
}
