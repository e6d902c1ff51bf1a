//! Axum router construction.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/status", get(routes::health::api_status))
        // Comics
        .route("/comics", get(routes::comics::list_comics))
        .route("/comics/{date}", get(routes::comics::get_comic))
        // Posts
        .route("/posts", get(routes::posts::list_posts))
        .route(
            "/posts/{id}",
            get(routes::posts::get_post)
                .put(routes::posts::update_post)
                .delete(routes::posts::delete_post),
        )
        // Admin
        .route("/admin/fetch-comics", post(routes::admin::fetch_comics))
        .route("/admin/create-post", post(routes::admin::create_post))
        .route("/admin/statistics", get(routes::admin::statistics))
        .route("/admin/system-status", get(routes::admin::system_status));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
