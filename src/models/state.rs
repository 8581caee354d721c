use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::mission::*;
use super::momentum::*;
use super::risk::*;

/// Rejected domain operation. Converted into a vault error at the lifecycle
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

/// The entire protected document.
///
/// All three collections are always present and ordered. Missions and risks
/// are kept newest first; momentum logs are kept sorted by week.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub missions: Vec<Mission>,
    pub risk_points: Vec<RiskPoint>,
    pub momentum_logs: Vec<MomentumLog>,
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time at the millisecond precision timestamps are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn required_title(title: &str, what: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::Invalid(format!("{} title is required", what)));
    }
    Ok(title.to_string())
}

fn in_range(value: i64, min: u8, max: u8, what: &str) -> Result<u8, DomainError> {
    if value < i64::from(min) || value > i64::from(max) {
        return Err(DomainError::Invalid(format!(
            "{} must be between {} and {}",
            what, min, max
        )));
    }
    Ok(value as u8)
}

impl AppState {
    pub fn is_empty(&self) -> bool {
        self.missions.is_empty() && self.risk_points.is_empty() && self.momentum_logs.is_empty()
    }

    pub fn mission(&self, id: &str) -> Option<&Mission> {
        self.missions.iter().find(|m| m.id == id)
    }

    fn mission_mut(&mut self, id: &str) -> Result<&mut Mission, DomainError> {
        self.missions
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DomainError::NotFound("Mission"))
    }

    // ============================================================
    // Missions
    // ============================================================

    pub fn add_mission(&mut self, input: CreateMissionInput) -> Result<Mission, DomainError> {
        let title = required_title(&input.title, "Mission")?;
        let horizon_years = in_range(
            input.horizon_years,
            MIN_HORIZON_YEARS,
            MAX_HORIZON_YEARS,
            "Horizon",
        )?;

        let mission = Mission {
            id: new_id(),
            title,
            horizon_years,
            status: MissionStatus::Planning,
            phases: Vec::new(),
            strategic_moves: Vec::new(),
            created_at: Some(now()),
        };
        self.missions.insert(0, mission.clone());
        Ok(mission)
    }

    pub fn remove_mission(&mut self, id: &str) -> Result<(), DomainError> {
        let before = self.missions.len();
        self.missions.retain(|m| m.id != id);
        if self.missions.len() == before {
            return Err(DomainError::NotFound("Mission"));
        }
        Ok(())
    }

    pub fn cycle_mission_status(&mut self, id: &str) -> Result<MissionStatus, DomainError> {
        let mission = self.mission_mut(id)?;
        mission.status = mission.status.next();
        Ok(mission.status)
    }

    pub fn add_phase(
        &mut self,
        mission_id: &str,
        input: CreatePhaseInput,
    ) -> Result<Phase, DomainError> {
        let title = required_title(&input.title, "Phase")?;
        let mission = self.mission_mut(mission_id)?;
        let phase = Phase { id: new_id(), title };
        mission.phases.push(phase.clone());
        Ok(phase)
    }

    // ============================================================
    // Strategic moves
    // ============================================================

    pub fn add_move(
        &mut self,
        mission_id: &str,
        input: CreateMoveInput,
    ) -> Result<StrategicMove, DomainError> {
        let title = required_title(&input.title, "Move")?;
        let mission = self.mission_mut(mission_id)?;
        if mission.phase(&input.phase_id).is_none() {
            return Err(DomainError::NotFound("Phase"));
        }

        let strategic_move = StrategicMove {
            id: new_id(),
            title,
            tags: input.tags.as_deref().map(parse_tags).unwrap_or_default(),
            leverage_type: input.leverage_type,
            priority: input.priority.unwrap_or_default(),
            deadline: input.deadline,
            progress: input.progress.unwrap_or(0).clamp(0, 100) as u8,
            color: input
                .color
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MOVE_COLOR.to_string()),
            phase_id: input.phase_id,
            archived: false,
            status: MissionStatus::Planning,
        };
        mission.strategic_moves.push(strategic_move.clone());
        Ok(strategic_move)
    }

    /// Advance a move to its next status and re-derive the mission status.
    pub fn cycle_move_status(
        &mut self,
        mission_id: &str,
        move_id: &str,
    ) -> Result<MissionStatus, DomainError> {
        let mission = self.mission_mut(mission_id)?;
        let strategic_move = mission
            .strategic_move_mut(move_id)
            .ok_or(DomainError::NotFound("Move"))?;
        strategic_move.status = strategic_move.status.next();
        let status = strategic_move.status;
        mission.status = mission.derived_status();
        Ok(status)
    }

    /// Flip the archived flag of a move, returning the new value.
    pub fn toggle_move_archived(
        &mut self,
        mission_id: &str,
        move_id: &str,
    ) -> Result<bool, DomainError> {
        let mission = self.mission_mut(mission_id)?;
        let strategic_move = mission
            .strategic_move_mut(move_id)
            .ok_or(DomainError::NotFound("Move"))?;
        strategic_move.archived = !strategic_move.archived;
        Ok(strategic_move.archived)
    }

    pub fn remove_move(&mut self, mission_id: &str, move_id: &str) -> Result<(), DomainError> {
        let mission = self.mission_mut(mission_id)?;
        let before = mission.strategic_moves.len();
        mission.strategic_moves.retain(|m| m.id != move_id);
        if mission.strategic_moves.len() == before {
            return Err(DomainError::NotFound("Move"));
        }
        mission.status = mission.derived_status();
        Ok(())
    }

    /// Count non-archived moves per leverage type, in declaration order.
    pub fn leverage_counts(&self) -> Vec<(LeverageType, usize)> {
        LeverageType::ALL
            .iter()
            .map(|&kind| {
                let count = self
                    .missions
                    .iter()
                    .flat_map(|m| &m.strategic_moves)
                    .filter(|m| !m.archived && m.leverage_type == kind)
                    .count();
                (kind, count)
            })
            .collect()
    }

    // ============================================================
    // Risks
    // ============================================================

    pub fn add_risk(&mut self, input: CreateRiskInput) -> Result<RiskPoint, DomainError> {
        let title = required_title(&input.title, "Risk")?;
        let probability = in_range(input.probability, MIN_RISK_SCORE, MAX_RISK_SCORE, "Probability")?;
        let impact = in_range(input.impact, MIN_RISK_SCORE, MAX_RISK_SCORE, "Impact")?;

        let risk = RiskPoint {
            id: new_id(),
            title,
            probability,
            impact,
            created_at: Some(now()),
        };
        self.risk_points.insert(0, risk.clone());
        Ok(risk)
    }

    pub fn remove_risk(&mut self, id: &str) -> Result<(), DomainError> {
        let before = self.risk_points.len();
        self.risk_points.retain(|r| r.id != id);
        if self.risk_points.len() == before {
            return Err(DomainError::NotFound("Risk"));
        }
        Ok(())
    }

    // ============================================================
    // Momentum
    // ============================================================

    /// Insert or update the log for a week. Logs stay sorted by week.
    pub fn log_momentum(&mut self, input: LogMomentumInput) -> Result<MomentumLog, DomainError> {
        let week = input.week.trim();
        NaiveDate::parse_from_str(week, "%Y-%m-%d")
            .map_err(|_| DomainError::Invalid("Week must be an ISO date (YYYY-MM-DD)".into()))?;
        let score = in_range(input.score, 0, MAX_MOMENTUM_SCORE, "Score")?;
        let now = now();

        let log = match self.momentum_logs.iter_mut().find(|l| l.week == week) {
            Some(existing) => {
                existing.score = score;
                existing.updated_at = Some(now);
                existing.clone()
            }
            None => {
                let log = MomentumLog {
                    id: new_id(),
                    week: week.to_string(),
                    score,
                    created_at: Some(now),
                    updated_at: None,
                };
                self.momentum_logs.push(log.clone());
                log
            }
        };
        self.momentum_logs.sort_by(|a, b| a.week.cmp(&b.week));
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launch() -> CreateMissionInput {
        CreateMissionInput {
            title: "Launch".into(),
            horizon_years: 3,
        }
    }

    #[test]
    fn serializes_all_three_collections() {
        let json = serde_json::to_string(&AppState::default()).unwrap();
        assert_eq!(json, r#"{"missions":[],"riskPoints":[],"momentumLogs":[]}"#);
    }

    #[test]
    fn add_mission_validates_title_and_horizon() {
        let mut state = AppState::default();
        assert!(state
            .add_mission(CreateMissionInput { title: "  ".into(), horizon_years: 3 })
            .is_err());
        assert!(state
            .add_mission(CreateMissionInput { title: "A".into(), horizon_years: 6 })
            .is_err());
        assert!(state.missions.is_empty());

        let first = state.add_mission(launch()).unwrap();
        let second = state
            .add_mission(CreateMissionInput { title: "Expand".into(), horizon_years: 5 })
            .unwrap();
        assert_eq!(state.missions[0].id, second.id);
        assert_eq!(state.missions[1].id, first.id);
    }

    #[test]
    fn moves_require_an_existing_phase() {
        let mut state = AppState::default();
        let mission = state.add_mission(launch()).unwrap();
        let input = CreateMoveInput {
            title: "Hire".into(),
            leverage_type: LeverageType::Network,
            phase_id: "missing".into(),
            tags: Some("People, Growth".into()),
            priority: None,
            deadline: None,
            progress: Some(140),
            color: None,
        };
        assert_eq!(
            state.add_move(&mission.id, input.clone()),
            Err(DomainError::NotFound("Phase"))
        );

        let phase = state
            .add_phase(&mission.id, CreatePhaseInput { title: "Seed".into() })
            .unwrap();
        let created = state
            .add_move(&mission.id, CreateMoveInput { phase_id: phase.id, ..input })
            .unwrap();
        assert_eq!(created.tags, vec!["people", "growth"]);
        assert_eq!(created.progress, 100);
        assert_eq!(created.priority, Priority::Medium);
        assert_eq!(created.color, DEFAULT_MOVE_COLOR);
    }

    #[test]
    fn cycling_a_move_rederives_the_mission() {
        let mut state = AppState::default();
        let mission = state.add_mission(launch()).unwrap();
        let phase = state
            .add_phase(&mission.id, CreatePhaseInput { title: "Seed".into() })
            .unwrap();
        let created = state
            .add_move(
                &mission.id,
                CreateMoveInput {
                    title: "Ship".into(),
                    leverage_type: LeverageType::Technology,
                    phase_id: phase.id,
                    tags: None,
                    priority: Some(Priority::High),
                    deadline: None,
                    progress: None,
                    color: None,
                },
            )
            .unwrap();

        let status = state.cycle_move_status(&mission.id, &created.id).unwrap();
        assert_eq!(status, MissionStatus::Active);
        assert_eq!(state.missions[0].status, MissionStatus::Active);
    }

    #[test]
    fn momentum_upserts_by_week() {
        let mut state = AppState::default();
        state
            .log_momentum(LogMomentumInput { week: "2024-03-11".into(), score: 4 })
            .unwrap();
        state
            .log_momentum(LogMomentumInput { week: "2024-03-04".into(), score: 6 })
            .unwrap();
        let updated = state
            .log_momentum(LogMomentumInput { week: "2024-03-11".into(), score: 9 })
            .unwrap();

        assert_eq!(state.momentum_logs.len(), 2);
        assert_eq!(state.momentum_logs[0].week, "2024-03-04");
        assert_eq!(state.momentum_logs[1].score, 9);
        assert!(updated.updated_at.is_some());
        assert!(state
            .log_momentum(LogMomentumInput { week: "2024-03-18".into(), score: 11 })
            .is_err());
    }

    #[test]
    fn risks_are_scored_within_bounds() {
        let mut state = AppState::default();
        let risk = state
            .add_risk(CreateRiskInput { title: "Burnout".into(), probability: 4, impact: 7 })
            .unwrap();
        assert_eq!(risk.exposure(), 28);
        assert!(state
            .add_risk(CreateRiskInput { title: "x".into(), probability: 0, impact: 7 })
            .is_err());
        state.remove_risk(&risk.id).unwrap();
        assert_eq!(state.remove_risk(&risk.id), Err(DomainError::NotFound("Risk")));
    }
}
