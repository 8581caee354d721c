mod handlers;
mod middleware;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::vault::Vault;

pub use handlers::{ActivityInput, HistoryResult, ThemeBody, VaultStatus};
pub use middleware::SecurityConfig;

/// Router that only answers same-origin and header-less callers.
pub fn create_router(vault: Vault) -> Router {
    create_router_with_config(vault, SecurityConfig::local())
}

pub fn create_router_with_config(vault: Vault, config: SecurityConfig) -> Router {
    let cors = config.cors_layer();
    let api = Router::new()
        // Vault lifecycle
        .route("/vault", get(handlers::get_vault_status))
        .route("/vault/setup", post(handlers::setup_vault))
        .route("/vault/unlock", post(handlers::unlock_vault))
        .route("/vault/rotate", post(handlers::rotate_passphrase))
        .route("/vault/lock", post(handlers::lock_vault))
        .route("/vault/activity", post(handlers::record_activity))
        // Document
        .route("/state", get(handlers::get_state))
        .route("/summary", get(handlers::get_summary))
        // Missions
        .route("/missions", post(handlers::create_mission))
        .route("/missions/{id}", delete(handlers::delete_mission))
        .route("/missions/{id}/cycle", post(handlers::cycle_mission_status))
        .route("/missions/{id}/phases", post(handlers::add_phase))
        .route("/missions/{id}/moves", post(handlers::add_move))
        .route("/missions/{id}/moves/{move_id}", delete(handlers::delete_move))
        .route("/missions/{id}/moves/{move_id}/cycle", post(handlers::cycle_move_status))
        .route("/missions/{id}/moves/{move_id}/archive", post(handlers::toggle_move_archived))
        // Risks and momentum
        .route("/risks", post(handlers::create_risk))
        .route("/risks/{id}", delete(handlers::delete_risk))
        .route("/momentum", put(handlers::log_momentum))
        // History
        .route("/history/undo", post(handlers::undo))
        .route("/history/redo", post(handlers::redo))
        // Preferences
        .route("/theme", get(handlers::get_theme).put(handlers::set_theme))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn_with_state(
            config,
            middleware::origin_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(vault)
}
