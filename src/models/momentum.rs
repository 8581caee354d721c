use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_MOMENTUM_SCORE: u8 = 10;

/// A momentum score for one week.
///
/// `week` is an ISO date key (`YYYY-MM-DD`) and is unique within the
/// document: logging the same week again updates the existing entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MomentumLog {
    pub id: String,
    pub week: String,
    /// Score within `0..=10`.
    pub score: u8,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for logging a week's momentum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMomentumInput {
    pub week: String,
    pub score: i64,
}

/// Direction of the last three scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MomentumTrend {
    InsufficientData,
    Accelerating,
    Decelerating,
    Steady,
}

/// Whether the last four scores have flat-lined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stagnation {
    InsufficientData,
    Alert,
    Clear,
}

/// Classify the trend of week-ordered logs from their last three scores.
pub fn momentum_trend(logs: &[MomentumLog]) -> MomentumTrend {
    if logs.len() < 3 {
        return MomentumTrend::InsufficientData;
    }
    let last: Vec<i16> = logs[logs.len() - 3..]
        .iter()
        .map(|l| i16::from(l.score))
        .collect();
    let first_step = last[1] - last[0];
    let second_step = last[2] - last[1];

    if first_step > 0 && second_step > 0 {
        MomentumTrend::Accelerating
    } else if first_step < 0 && second_step < 0 {
        MomentumTrend::Decelerating
    } else {
        MomentumTrend::Steady
    }
}

/// Raise an alert when the last four scores stay within one point.
pub fn stagnation(logs: &[MomentumLog]) -> Stagnation {
    if logs.len() < 4 {
        return Stagnation::InsufficientData;
    }
    let window = &logs[logs.len() - 4..];
    let min = window.iter().map(|l| l.score).min().unwrap_or(0);
    let max = window.iter().map(|l| l.score).max().unwrap_or(0);
    if max - min <= 1 {
        Stagnation::Alert
    } else {
        Stagnation::Clear
    }
}
