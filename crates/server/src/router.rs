use super::{handlers, state::AppState};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    let max_upload_bytes = app_state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route(
            "/medical/upload-prescription",
            post(handlers::upload_prescription_handler)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/medical/prescriptions",
            get(handlers::list_prescriptions_handler),
        )
        .route("/medical/summarize", post(handlers::summarize_handler))
        .route("/medical/search", post(handlers::search_handler))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
