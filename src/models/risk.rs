use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_RISK_SCORE: u8 = 1;
pub const MAX_RISK_SCORE: u8 = 10;

/// A tracked risk, scored on a 10x10 probability/impact grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskPoint {
    pub id: String,
    pub title: String,
    pub probability: u8,
    pub impact: u8,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RiskPoint {
    /// Probability times impact. Derived on demand and never stored.
    pub fn exposure(&self) -> u32 {
        u32::from(self.probability) * u32::from(self.impact)
    }
}

/// Input for logging a new risk. Both scores must be within `1..=10`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRiskInput {
    pub title: String,
    pub probability: i64,
    pub impact: i64,
}

/// Aggregate exposure over all risks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub total: usize,
    pub average_exposure: f64,
    pub peak_exposure: u32,
}

impl RiskSummary {
    pub fn from_risks(risks: &[RiskPoint]) -> Self {
        let sum: u32 = risks.iter().map(RiskPoint::exposure).sum();
        let peak_exposure = risks.iter().map(RiskPoint::exposure).max().unwrap_or(0);
        let average_exposure = if risks.is_empty() {
            0.0
        } else {
            f64::from(sum) / risks.len() as f64
        };
        Self {
            total: risks.len(),
            average_exposure,
            peak_exposure,
        }
    }
}
