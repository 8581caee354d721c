//! Shape enforcement for documents read from storage.
//!
//! Decrypted vaults and legacy plaintext stores are untyped JSON written by
//! older releases, so nothing about their shape can be trusted. Normalization
//! never fails: collections that are not arrays become empty, entries that are
//! not objects are dropped, missing fields get their defaults and numeric
//! fields are clamped into range.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde_json::{Map, Value};

use super::mission::*;
use super::momentum::*;
use super::risk::*;
use super::state::{new_id, AppState};

type Object = Map<String, Value>;

/// Normalize an arbitrary JSON value into an [`AppState`].
pub fn normalize(input: &Value) -> AppState {
    let Some(root) = input.as_object() else {
        return AppState::default();
    };

    let missions = objects(root.get("missions")).map(normalize_mission).collect();
    let risk_points = objects(root.get("riskPoints")).map(normalize_risk).collect();

    // Week keys are unique; later duplicates win.
    let momentum_logs = objects(root.get("momentumLogs"))
        .filter_map(normalize_momentum)
        .map(|log| (log.week.clone(), log))
        .collect::<BTreeMap<_, _>>()
        .into_values()
        .collect();

    AppState {
        missions,
        risk_points,
        momentum_logs,
    }
}

/// Parse and normalize a stored document, substituting an empty document
/// for anything that is not valid JSON.
pub fn normalize_str(raw: &str) -> AppState {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize(&value),
        Err(e) => {
            tracing::warn!("Discarding unreadable stored document: {}", e);
            AppState::default()
        }
    }
}

fn normalize_mission(obj: &Object) -> Mission {
    let strategic_moves = objects(obj.get("strategicMoves"))
        .map(normalize_move)
        .collect();

    Mission {
        id: id_field(obj),
        title: string_field(obj, "title").unwrap_or_default(),
        horizon_years: clamp_u8(
            number_field(obj, "horizonYears"),
            MIN_HORIZON_YEARS,
            MAX_HORIZON_YEARS,
            DEFAULT_HORIZON_YEARS,
        ),
        status: status_field(obj),
        phases: objects(obj.get("phases"))
            .map(|p| Phase {
                id: id_field(p),
                title: string_field(p, "title").unwrap_or_default(),
            })
            .collect(),
        strategic_moves,
        created_at: timestamp_field(obj, "createdAt"),
    }
}

fn normalize_move(obj: &Object) -> StrategicMove {
    let tags = match obj.get("tags") {
        Some(Value::Array(items)) => normalize_tags(items.iter().filter_map(Value::as_str)),
        _ => Vec::new(),
    };

    StrategicMove {
        id: id_field(obj),
        title: string_field(obj, "title").unwrap_or_default(),
        tags,
        leverage_type: string_field(obj, "leverageType")
            .and_then(|s| LeverageType::from_str(&s))
            .unwrap_or_default(),
        priority: string_field(obj, "priority")
            .and_then(|s| Priority::from_str(&s))
            .unwrap_or_default(),
        deadline: date_field(obj, "deadline"),
        progress: clamp_u8(number_field(obj, "progress"), 0, 100, 0),
        color: string_field(obj, "color")
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_MOVE_COLOR.to_string()),
        phase_id: string_field(obj, "phaseId").unwrap_or_default(),
        archived: obj.get("archived").is_some_and(truthy),
        status: status_field(obj),
    }
}

fn normalize_risk(obj: &Object) -> RiskPoint {
    RiskPoint {
        id: id_field(obj),
        title: string_field(obj, "title").unwrap_or_default(),
        probability: clamp_u8(number_field(obj, "probability"), MIN_RISK_SCORE, MAX_RISK_SCORE, 5),
        impact: clamp_u8(number_field(obj, "impact"), MIN_RISK_SCORE, MAX_RISK_SCORE, 5),
        created_at: timestamp_field(obj, "createdAt"),
    }
}

fn normalize_momentum(obj: &Object) -> Option<MomentumLog> {
    let week = string_field(obj, "week").filter(|w| !w.is_empty())?;
    Some(MomentumLog {
        id: id_field(obj),
        week,
        score: clamp_u8(number_field(obj, "score"), 0, MAX_MOMENTUM_SCORE, 0),
        created_at: timestamp_field(obj, "createdAt"),
        updated_at: timestamp_field(obj, "updatedAt"),
    })
}

// ============================================================
// Field helpers
// ============================================================

fn objects(value: Option<&Value>) -> impl Iterator<Item = &Object> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn string_field(obj: &Object, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_field(obj: &Object) -> String {
    string_field(obj, "id")
        .filter(|id| !id.is_empty())
        .unwrap_or_else(new_id)
}

/// Numbers and numeric strings, as long as they are finite.
fn number_field(obj: &Object, key: &str) -> Option<f64> {
    let n = match obj.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn clamp_u8(value: Option<f64>, min: u8, max: u8, fallback: u8) -> u8 {
    match value {
        Some(n) => n.round().clamp(f64::from(min), f64::from(max)) as u8,
        None => fallback,
    }
}

fn status_field(obj: &Object) -> MissionStatus {
    string_field(obj, "status")
        .and_then(|s| MissionStatus::from_str(&s))
        .unwrap_or_default()
}

/// Epoch milliseconds, or an RFC 3339 string truncated to milliseconds.
fn timestamp_field(obj: &Object, key: &str) -> Option<DateTime<Utc>> {
    match obj.get(key)? {
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_f64()? as i64),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3)),
        _ => None,
    }
}

/// A calendar date, also taken from the date part of a timestamp.
fn date_field(obj: &Object, key: &str) -> Option<NaiveDate> {
    let raw = string_field(obj, key)?;
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    // Local date-times such as `2024-03-04T09:30` or `2024-03-04 09:30:00`.
    let (date, rest) = (raw.get(..10)?, raw.get(10..)?);
    if !rest.starts_with(['T', 't', ' ']) {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_objects_become_empty_documents() {
        assert_eq!(normalize(&json!(null)), AppState::default());
        assert_eq!(normalize(&json!([1, 2])), AppState::default());
        assert_eq!(normalize_str("{not json"), AppState::default());
    }

    #[test]
    fn coerces_collections_and_drops_non_objects() {
        let state = normalize(&json!({
            "missions": "oops",
            "riskPoints": [1, {"id": "r", "title": "Cash", "probability": 40, "impact": "3"}],
            "momentumLogs": null
        }));
        assert!(state.missions.is_empty());
        assert!(state.momentum_logs.is_empty());
        assert_eq!(state.risk_points.len(), 1);
        assert_eq!(state.risk_points[0].probability, 10);
        assert_eq!(state.risk_points[0].impact, 3);
    }

    #[test]
    fn fills_missing_mission_collections() {
        let state = normalize(&json!({"missions": [{"id": "x"}]}));
        let mission = &state.missions[0];
        assert_eq!(mission.id, "x");
        assert!(mission.phases.is_empty());
        assert!(mission.strategic_moves.is_empty());
        assert_eq!(mission.horizon_years, DEFAULT_HORIZON_YEARS);
        assert_eq!(mission.status, MissionStatus::Planning);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["missions"][0]["phases"], json!([]));
        assert_eq!(json["missions"][0]["strategicMoves"], json!([]));
    }

    #[test]
    fn defaults_and_clamps_move_fields() {
        let state = normalize(&json!({"missions": [{
            "id": "m",
            "title": "Mission",
            "horizonYears": 9,
            "status": "Active",
            "createdAt": 1_700_000_000_000_i64,
            "strategicMoves": [{
                "id": "s",
                "title": "Move",
                "tags": ["  Alpha", "BETA", 7, "", "c", "d", "e", "f", "g", "h", "i"],
                "leverageType": "Capital",
                "progress": -20,
                "archived": 1,
                "deadline": "not a date"
            }]
        }]}));
        let mission = &state.missions[0];
        assert_eq!(mission.horizon_years, MAX_HORIZON_YEARS);
        assert_eq!(mission.status, MissionStatus::Active);
        assert_eq!(
            mission.created_at.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );

        let m = &mission.strategic_moves[0];
        assert_eq!(m.tags.len(), MAX_TAGS);
        assert_eq!(m.tags[0], "alpha");
        assert_eq!(m.tags[1], "beta");
        assert_eq!(m.leverage_type, LeverageType::Capital);
        assert_eq!(m.priority, Priority::Medium);
        assert_eq!(m.progress, 0);
        assert_eq!(m.color, DEFAULT_MOVE_COLOR);
        assert!(m.archived);
        assert!(m.deadline.is_none());
        assert_eq!(m.status, MissionStatus::Planning);
    }

    #[test]
    fn deadlines_keep_the_date_of_timestamps() {
        let deadline = |raw: &str| {
            let state = normalize(&json!({"missions": [{
                "strategicMoves": [{ "deadline": raw }]
            }]}));
            state.missions[0].strategic_moves[0].deadline
        };
        let march_4 = NaiveDate::from_ymd_opt(2024, 3, 4);

        assert_eq!(deadline("2024-03-04"), march_4);
        assert_eq!(deadline(" 2024-03-04 "), march_4);
        assert_eq!(deadline("2024-03-04T23:30:00+02:00"), march_4);
        assert_eq!(deadline("2024-03-04T09:30:00.000Z"), march_4);
        assert_eq!(deadline("2024-03-04T09:30"), march_4);
        assert_eq!(deadline("2024-03-04 09:30:00"), march_4);
        assert_eq!(deadline("2024-03-04junk"), None);
        assert_eq!(deadline("04/03/2024"), None);
        assert_eq!(deadline(""), None);
    }

    #[test]
    fn momentum_weeks_are_unique_and_sorted() {
        let state = normalize(&json!({"momentumLogs": [
            {"id": "a", "week": "2024-02-05", "score": 3},
            {"id": "b", "week": "2024-01-29", "score": 12},
            {"id": "c", "week": "2024-02-05", "score": 7},
            {"id": "d", "score": 5}
        ]}));
        let weeks: Vec<_> = state.momentum_logs.iter().map(|l| l.week.as_str()).collect();
        assert_eq!(weeks, vec!["2024-01-29", "2024-02-05"]);
        assert_eq!(state.momentum_logs[0].score, 10);
        assert_eq!(state.momentum_logs[1].id, "c");
    }

    #[test]
    fn normalized_output_is_stable() {
        let once = normalize(&json!({"missions": [{"id": "x", "title": "T"}]}));
        let twice = normalize(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }
}
