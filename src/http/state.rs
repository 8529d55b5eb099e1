use crate::session::LessonController;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The lesson session driven by this server
    pub controller: Arc<Mutex<LessonController>>,
}

impl AppState {
    pub fn new(controller: LessonController) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
        }
    }
}
