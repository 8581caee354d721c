//! One-shot import of the pre-encryption plaintext document.

use crate::db::{Database, LEGACY_STATE_KEY};
use crate::models::{normalize_str, AppState};

use super::VaultError;

/// Result of looking for legacy plaintext data.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    /// A legacy entry existed; its normalized contents become the bootstrap
    /// document. Unreadable entries migrate as an empty document.
    Migrated(AppState),
    /// No legacy entry. This is the normal path for new installs.
    NoLegacyData,
}

/// Read the legacy key once and delete it.
///
/// The entry is removed whether or not it parsed, so plaintext never
/// survives past the first open.
pub fn take_legacy_state(db: &Database) -> Result<MigrationOutcome, VaultError> {
    let Some(raw) = db
        .get_value(LEGACY_STATE_KEY)
        .map_err(VaultError::storage)?
    else {
        return Ok(MigrationOutcome::NoLegacyData);
    };

    let state = normalize_str(&raw);
    db.remove_value(LEGACY_STATE_KEY)
        .map_err(VaultError::storage)?;

    tracing::info!(
        missions = state.missions.len(),
        risks = state.risk_points.len(),
        logs = state.momentum_logs.len(),
        "Migrated legacy plaintext state"
    );
    Ok(MigrationOutcome::Migrated(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn no_legacy_entry_is_a_no_op() {
        assert_eq!(take_legacy_state(&db()).unwrap(), MigrationOutcome::NoLegacyData);
    }

    #[test]
    fn migrates_and_deletes_legacy_entry() {
        let db = db();
        db.set_value(LEGACY_STATE_KEY, r#"{"missions":[{"id":"x"}]}"#)
            .unwrap();

        let MigrationOutcome::Migrated(state) = take_legacy_state(&db).unwrap() else {
            panic!("expected migration");
        };
        assert_eq!(state.missions.len(), 1);
        assert_eq!(state.missions[0].id, "x");
        assert!(state.missions[0].phases.is_empty());
        assert!(state.missions[0].strategic_moves.is_empty());
        assert!(!db.has_value(LEGACY_STATE_KEY).unwrap());

        assert_eq!(take_legacy_state(&db).unwrap(), MigrationOutcome::NoLegacyData);
    }

    #[test]
    fn malformed_legacy_entry_migrates_empty_and_is_deleted() {
        let db = db();
        db.set_value(LEGACY_STATE_KEY, "{not json").unwrap();
        assert_eq!(
            take_legacy_state(&db).unwrap(),
            MigrationOutcome::Migrated(AppState::default())
        );
        assert!(!db.has_value(LEGACY_STATE_KEY).unwrap());
    }
}
