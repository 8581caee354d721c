use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_HORIZON_YEARS: u8 = 1;
pub const MAX_HORIZON_YEARS: u8 = 5;
pub const DEFAULT_HORIZON_YEARS: u8 = 3;

/// Maximum number of tags kept on a strategic move.
pub const MAX_TAGS: usize = 8;

/// Color tag given to moves that were never colored.
pub const DEFAULT_MOVE_COLOR: &str = "default";

/// A long-horizon objective broken down into phases and strategic moves.
///
/// Phases and moves are owned by their mission and have no lifecycle of their
/// own. A move points at a phase through `phase_id`, which is only a lookup
/// key: deleting a phase does not delete the moves that reference it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    /// Planning horizon in years, always within `1..=5`.
    pub horizon_years: u8,
    pub status: MissionStatus,
    pub phases: Vec<Phase>,
    pub strategic_moves: Vec<StrategicMove>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Mission {
    pub fn phase(&self, phase_id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == phase_id)
    }

    pub fn strategic_move_mut(&mut self, move_id: &str) -> Option<&mut StrategicMove> {
        self.strategic_moves.iter_mut().find(|m| m.id == move_id)
    }

    /// Status implied by the moves of this mission.
    ///
    /// A mission without moves is still being planned. Any active move makes
    /// the mission active; it is only completed or abandoned once every move
    /// is.
    pub fn derived_status(&self) -> MissionStatus {
        let moves = &self.strategic_moves;
        if moves.is_empty() {
            return MissionStatus::Planning;
        }
        if moves.iter().all(|m| m.status == MissionStatus::Completed) {
            return MissionStatus::Completed;
        }
        if moves.iter().any(|m| m.status == MissionStatus::Active) {
            return MissionStatus::Active;
        }
        if moves.iter().all(|m| m.status == MissionStatus::Abandoned) {
            return MissionStatus::Abandoned;
        }
        MissionStatus::Planning
    }
}

/// The lifecycle status shared by missions and strategic moves.
///
/// Statuses cycle in declaration order: `Planning` → `Active` → `Completed`
/// → `Abandoned` → `Planning`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MissionStatus {
    #[default]
    Planning,
    Active,
    Completed,
    Abandoned,
}

impl MissionStatus {
    pub const ALL: [MissionStatus; 4] = [
        Self::Planning,
        Self::Active,
        Self::Completed,
        Self::Abandoned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Abandoned => "Abandoned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Planning" => Some(Self::Planning),
            "Active" => Some(Self::Active),
            "Completed" => Some(Self::Completed),
            "Abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub title: String,
}

/// A concrete move inside a mission, classified by the kind of leverage it
/// builds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StrategicMove {
    pub id: String,
    pub title: String,
    /// Lower-cased, trimmed, at most [`MAX_TAGS`] entries.
    pub tags: Vec<String>,
    pub leverage_type: LeverageType,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
    /// Completion percentage within `0..=100`.
    pub progress: u8,
    pub color: String,
    /// Identity of the phase this move belongs to. Lookup key only.
    pub phase_id: String,
    pub archived: bool,
    pub status: MissionStatus,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LeverageType {
    #[default]
    Skill,
    Network,
    Capital,
    Distribution,
    Technology,
}

impl LeverageType {
    pub const ALL: [LeverageType; 5] = [
        Self::Skill,
        Self::Network,
        Self::Capital,
        Self::Distribution,
        Self::Technology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "Skill",
            Self::Network => "Network",
            Self::Capital => "Capital",
            Self::Distribution => "Distribution",
            Self::Technology => "Technology",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Skill" => Some(Self::Skill),
            "Network" => Some(Self::Network),
            "Capital" => Some(Self::Capital),
            "Distribution" => Some(Self::Distribution),
            "Technology" => Some(Self::Technology),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }
}

/// Split a comma-separated tag list into normalized tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

/// Trim, lower-case and drop empty tags, keeping at most [`MAX_TAGS`].
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .collect()
}

/// Input for creating a new mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissionInput {
    pub title: String,
    /// Must be within `1..=5`.
    pub horizon_years: i64,
}

/// Input for adding a phase to a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePhaseInput {
    pub title: String,
}

/// Input for adding a strategic move to a mission.
///
/// Optional fields fall back to the same defaults normalization applies to
/// stored moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMoveInput {
    pub title: String,
    pub leverage_type: LeverageType,
    pub phase_id: String,
    /// Comma-separated tag list.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub color: Option<String>,
}
