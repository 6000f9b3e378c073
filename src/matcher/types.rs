// types.rs

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::types::{FeatureId, MatchSetId, TextId, UnitId};

pub use crate::config::subsystems::matcher::{
    DistanceMetricKind, ScoreStrategyKind, SearchConfig,
};

/// Parameters of one match run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    pub config: SearchConfig,
    pub texts: Vec<TextId>,
}

/// Lifecycle of one match run, for drivers that poll progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Initialized,
    Running,
    Done,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Initialized => "Initialized",
            RunStatus::Running => "Running",
            RunStatus::Done => "Done",
            RunStatus::Failed => "Failed",
        }
    }
}

/// Metadata and ownership container for one match run. Disposable: deleting
/// a set and its matches never affects the rest of the corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSet {
    pub id: MatchSetId,
    pub params: SearchParams,
    pub status: RunStatus,
    pub message: String,
    pub created: DateTime<Utc>,
}

/// A scored pairing of two units from two different texts. The source side
/// is always the lesser (text, unit) pair so output ordering is stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub match_set: MatchSetId,
    pub score: f64,
    pub source_text: TextId,
    pub source_unit: UnitId,
    pub target_text: TextId,
    pub target_unit: UnitId,
    /// Features that produced the score, ascending by id.
    pub shared_features: Vec<FeatureId>,
}

impl Match {
    /// Serializes the match as one JSON line, for JSONL result dumps.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
