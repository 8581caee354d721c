use serde::{Deserialize, Serialize};

use super::mission::{LeverageType, MissionStatus};
use super::momentum::{momentum_trend, stagnation, MomentumTrend, Stagnation};
use super::risk::RiskSummary;
use super::state::AppState;

/// Number of non-archived moves for one leverage type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeverageCount {
    pub leverage_type: LeverageType,
    pub count: usize,
}

/// Key figures shown on the dashboard, computed from the unlocked document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_missions: usize,
    pub total_phases: usize,
    /// Non-archived moves across all missions.
    pub total_moves: usize,
    pub momentum_average: f64,
    pub momentum_trend: MomentumTrend,
    pub stagnation: Stagnation,
    pub risk: RiskSummary,
    pub leverage: Vec<LeverageCount>,
    /// Leverage types with the fewest moves.
    pub strategic_gaps: Vec<LeverageType>,
}

impl DashboardSummary {
    pub fn from_state(state: &AppState) -> Self {
        let counts = state.leverage_counts();
        let min = counts.iter().map(|(_, c)| *c).min().unwrap_or(0);
        let strategic_gaps = counts
            .iter()
            .filter(|(_, c)| *c == min)
            .map(|(kind, _)| *kind)
            .collect();

        let logs = &state.momentum_logs;
        let momentum_average = if logs.is_empty() {
            0.0
        } else {
            logs.iter().map(|l| f64::from(l.score)).sum::<f64>() / logs.len() as f64
        };

        Self {
            active_missions: state
                .missions
                .iter()
                .filter(|m| m.status == MissionStatus::Active)
                .count(),
            total_phases: state.missions.iter().map(|m| m.phases.len()).sum(),
            total_moves: counts.iter().map(|(_, c)| c).sum(),
            momentum_average,
            momentum_trend: momentum_trend(logs),
            stagnation: stagnation(logs),
            risk: RiskSummary::from_risks(&state.risk_points),
            leverage: counts
                .into_iter()
                .map(|(leverage_type, count)| LeverageCount {
                    leverage_type,
                    count,
                })
                .collect(),
            strategic_gaps,
        }
    }
}
