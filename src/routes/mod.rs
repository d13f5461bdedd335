use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod health;
pub mod tasks;

pub use health::health;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let task_router = Router::new()
        .route("/", get(tasks::routes::list).post(tasks::routes::create))
        .route(
            "/{id}",
            get(tasks::routes::get)
                .put(tasks::routes::update)
                .patch(tasks::routes::update)
                .delete(tasks::routes::delete),
        );

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/tasks", task_router)
}

/// The full application: routes, request tracing and CORS, bound to `state`.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Task API"
}
