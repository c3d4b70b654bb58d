/// Application routes configuration
use crate::handlers::{
    create_rule, delete_rule, get_board, get_board_text, get_operator, get_rule, get_settings,
    get_station, health, list_rules, refresh_board, update_rule, AppState,
};
use axum::{routing::get, Router};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Departure board
        .route("/board", get(get_board))
        .route("/board/refresh", get(refresh_board))
        .route("/board/text", get(get_board_text))
        // Quick times
        .route("/rules", get(list_rules).post(create_rule))
        .route(
            "/rules/:id",
            get(get_rule).put(update_rule).delete(delete_rule),
        )
        // Settings and reference data
        .route("/settings", get(get_settings))
        .route("/stations/:crs", get(get_station))
        .route("/operators/:code", get(get_operator))
        .with_state(state)
}

/// Serve `app` on an ephemeral local port for tests
#[cfg(test)]
pub(crate) async fn serve_local(app: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    addr
}
