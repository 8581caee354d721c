use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::models::*;
use crate::vault::{ActivityKind, LockState, Vault, VaultError};

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Request / response bodies
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultStatus {
    pub state: LockState,
    pub present: bool,
    pub undo: usize,
    pub redo: usize,
}

#[derive(Deserialize)]
pub struct PassphraseInput {
    pub passphrase: Zeroizing<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityInput {
    pub kind: ActivityKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryResult {
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeBody {
    pub theme: Theme,
}

// ============================================================
// Error Handling
// ============================================================

/// Map a vault error to a response.
///
/// Storage and internal failures were already logged where they happened;
/// clients only see a generic message for those.
fn vault_error(e: VaultError) -> (StatusCode, String) {
    match e {
        VaultError::Locked => (
            StatusCode::LOCKED,
            "Vault is locked. Unlock to continue.".to_string(),
        ),
        VaultError::UnlockFailure => (
            StatusCode::UNAUTHORIZED,
            "Unlock failed. Incorrect passphrase or corrupted data.".to_string(),
        ),
        VaultError::WeakPassphrase { .. } | VaultError::Invalid(_) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        VaultError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
        VaultError::InvalidTransition { .. } => {
            tracing::warn!("Rejected vault transition: {}", e);
            (StatusCode::CONFLICT, e.to_string())
        }
        VaultError::Storage(_) | VaultError::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Vault lifecycle
// ============================================================

async fn status(vault: &Vault) -> VaultStatus {
    let (undo, redo) = vault.history_depths().await;
    let state = vault.lock_state().await;
    VaultStatus {
        state,
        present: state != LockState::Uninitialized,
        undo,
        redo,
    }
}

pub async fn get_vault_status(State(vault): State<Vault>) -> Json<VaultStatus> {
    Json(status(&vault).await)
}

pub async fn setup_vault(
    State(vault): State<Vault>,
    Json(input): Json<PassphraseInput>,
) -> ApiResult<Json<VaultStatus>> {
    vault.setup(&input.passphrase).await.map_err(vault_error)?;
    Ok(Json(status(&vault).await))
}

pub async fn unlock_vault(
    State(vault): State<Vault>,
    Json(input): Json<PassphraseInput>,
) -> ApiResult<Json<VaultStatus>> {
    vault.unlock(&input.passphrase).await.map_err(vault_error)?;
    Ok(Json(status(&vault).await))
}

pub async fn rotate_passphrase(
    State(vault): State<Vault>,
    Json(input): Json<PassphraseInput>,
) -> ApiResult<StatusCode> {
    vault.rotate(&input.passphrase).await.map_err(vault_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn lock_vault(State(vault): State<Vault>) -> Json<VaultStatus> {
    vault.lock().await;
    Json(status(&vault).await)
}

pub async fn record_activity(
    State(vault): State<Vault>,
    Json(input): Json<ActivityInput>,
) -> StatusCode {
    vault.record_activity(input.kind).await;
    StatusCode::NO_CONTENT
}

// ============================================================
// Document
// ============================================================

pub async fn get_state(State(vault): State<Vault>) -> ApiResult<Json<AppState>> {
    vault.state().await.map(Json).map_err(vault_error)
}

pub async fn get_summary(State(vault): State<Vault>) -> ApiResult<Json<DashboardSummary>> {
    let state = vault.state().await.map_err(vault_error)?;
    Ok(Json(DashboardSummary::from_state(&state)))
}

fn mission_after(state: &AppState, id: &str) -> Result<Mission, VaultError> {
    state
        .mission(id)
        .cloned()
        .ok_or(VaultError::NotFound("Mission"))
}

// ============================================================
// Missions
// ============================================================

pub async fn create_mission(
    State(vault): State<Vault>,
    Json(input): Json<CreateMissionInput>,
) -> ApiResult<(StatusCode, Json<Mission>)> {
    vault
        .mutate(|state| Ok(state.add_mission(input)?))
        .await
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(vault_error)
}

pub async fn delete_mission(
    State(vault): State<Vault>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    vault
        .mutate(|state| Ok(state.remove_mission(&id)?))
        .await
        .map_err(vault_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cycle_mission_status(
    State(vault): State<Vault>,
    Path(id): Path<String>,
) -> ApiResult<Json<Mission>> {
    vault
        .mutate(|state| {
            state.cycle_mission_status(&id)?;
            mission_after(state, &id)
        })
        .await
        .map(Json)
        .map_err(vault_error)
}

pub async fn add_phase(
    State(vault): State<Vault>,
    Path(id): Path<String>,
    Json(input): Json<CreatePhaseInput>,
) -> ApiResult<(StatusCode, Json<Phase>)> {
    vault
        .mutate(|state| Ok(state.add_phase(&id, input)?))
        .await
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(vault_error)
}

// ============================================================
// Strategic moves
// ============================================================

pub async fn add_move(
    State(vault): State<Vault>,
    Path(id): Path<String>,
    Json(input): Json<CreateMoveInput>,
) -> ApiResult<(StatusCode, Json<StrategicMove>)> {
    vault
        .mutate(|state| Ok(state.add_move(&id, input)?))
        .await
        .map(|m| (StatusCode::CREATED, Json(m)))
        .map_err(vault_error)
}

pub async fn cycle_move_status(
    State(vault): State<Vault>,
    Path((id, move_id)): Path<(String, String)>,
) -> ApiResult<Json<Mission>> {
    vault
        .mutate(|state| {
            state.cycle_move_status(&id, &move_id)?;
            mission_after(state, &id)
        })
        .await
        .map(Json)
        .map_err(vault_error)
}

pub async fn toggle_move_archived(
    State(vault): State<Vault>,
    Path((id, move_id)): Path<(String, String)>,
) -> ApiResult<Json<Mission>> {
    vault
        .mutate(|state| {
            state.toggle_move_archived(&id, &move_id)?;
            mission_after(state, &id)
        })
        .await
        .map(Json)
        .map_err(vault_error)
}

pub async fn delete_move(
    State(vault): State<Vault>,
    Path((id, move_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    vault
        .mutate(|state| Ok(state.remove_move(&id, &move_id)?))
        .await
        .map_err(vault_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Risks and momentum
// ============================================================

pub async fn create_risk(
    State(vault): State<Vault>,
    Json(input): Json<CreateRiskInput>,
) -> ApiResult<(StatusCode, Json<RiskPoint>)> {
    vault
        .mutate(|state| Ok(state.add_risk(input)?))
        .await
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(vault_error)
}

pub async fn delete_risk(
    State(vault): State<Vault>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    vault
        .mutate(|state| Ok(state.remove_risk(&id)?))
        .await
        .map_err(vault_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn log_momentum(
    State(vault): State<Vault>,
    Json(input): Json<LogMomentumInput>,
) -> ApiResult<Json<MomentumLog>> {
    vault
        .mutate(|state| Ok(state.log_momentum(input)?))
        .await
        .map(Json)
        .map_err(vault_error)
}

// ============================================================
// History
// ============================================================

pub async fn undo(State(vault): State<Vault>) -> ApiResult<Json<HistoryResult>> {
    let applied = vault.undo().await.map_err(vault_error)?;
    Ok(Json(HistoryResult { applied }))
}

pub async fn redo(State(vault): State<Vault>) -> ApiResult<Json<HistoryResult>> {
    let applied = vault.redo().await.map_err(vault_error)?;
    Ok(Json(HistoryResult { applied }))
}

// ============================================================
// Theme
// ============================================================

pub async fn get_theme(State(vault): State<Vault>) -> ApiResult<Json<ThemeBody>> {
    let theme = vault.theme().await.map_err(vault_error)?;
    Ok(Json(ThemeBody { theme }))
}

pub async fn set_theme(
    State(vault): State<Vault>,
    Json(input): Json<ThemeBody>,
) -> ApiResult<Json<ThemeBody>> {
    vault.set_theme(input.theme).await.map_err(vault_error)?;
    Ok(Json(input))
}
