pub mod dto;
pub mod model;
pub mod queries;
pub mod routes;
pub mod service;
pub mod store;

pub use model::{Task, TaskPriority, TaskStatus};
pub use queries::PgTaskStore;
pub use service::{TaskError, TaskService};
pub use store::{InMemoryTaskStore, TaskStore};
