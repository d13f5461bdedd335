pub mod config;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use routes::app;
pub use state::AppState;
