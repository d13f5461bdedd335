use std::sync::Arc;

use crate::routes::tasks::{TaskService, TaskStore};

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
}

impl AppState {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            tasks: TaskService::new(store),
        }
    }
}
