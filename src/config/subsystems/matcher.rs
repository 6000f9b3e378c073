// src/config/subsystems/matcher.rs

use serde::{Serialize, Deserialize};

use crate::config::FromIni;
use crate::error::{Error, Result};
use crate::types::{FeatureKind, UnitKind};

/// Strategy for measuring how dispersed shared features are within a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceMetricKind {
    /// Token-index span covering all matched positions.
    Span,
    /// Span between the two rarest matched words.
    Frequency,
}

impl DistanceMetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetricKind::Span => "span",
            DistanceMetricKind::Frequency => "frequency",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "span" => Some(Self::Span),
            "frequency" | "freq" => Some(Self::Frequency),
            _ => None,
        }
    }
}

impl Default for DistanceMetricKind {
    fn default() -> Self {
        Self::Frequency
    }
}

/// Strategy combining raw shared-feature weight with proximity distance
/// into a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreStrategyKind {
    /// ln of summed inverse frequencies over summed distances.
    LogRatio,
    /// Raw inverse-frequency weight, ignoring distance.
    RawWeight,
}

impl ScoreStrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStrategyKind::LogRatio => "log_ratio",
            ScoreStrategyKind::RawWeight => "raw_weight",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "log_ratio" => Some(Self::LogRatio),
            "raw_weight" => Some(Self::RawWeight),
            _ => None,
        }
    }
}

impl Default for ScoreStrategyKind {
    fn default() -> Self {
        Self::LogRatio
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Comparison granularity.
    pub unit_kind: UnitKind,
    /// Feature type the index is built over.
    pub feature_kind: FeatureKind,
    pub distance_metric: DistanceMetricKind,
    pub score_strategy: ScoreStrategyKind,
    /// Number of most corpus-frequent features excluded from candidate
    /// generation.
    pub stopword_count: usize,
    /// Cap on the matched-feature span inside each unit.
    pub max_distance: usize,
    /// Minimum number of distinct shared features for a candidate pair.
    pub min_shared_features: usize,
    /// Safety bound on feature-index postings.
    pub max_index_entries: usize,
    /// Safety bound on accumulated candidate pairs.
    pub max_candidate_pairs: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            unit_kind: UnitKind::Line,
            feature_kind: FeatureKind::Form,
            distance_metric: DistanceMetricKind::default(),
            score_strategy: ScoreStrategyKind::default(),
            stopword_count: 10,
            max_distance: 10,
            min_shared_features: 2,
            max_index_entries: 5_000_000,
            max_candidate_pairs: 2_000_000,
        }
    }
}

impl FromIni for SearchConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "matcher" {
            return None;
        }

        match key {
            "unit_kind" => match UnitKind::from_str(value) {
                Some(kind) => {
                    self.unit_kind = kind;
                    Some(Ok(()))
                }
                None => Some(Err(Error::config(format!("Invalid unit_kind: {}", value)))),
            },
            "feature_kind" => match FeatureKind::from_str(value) {
                Some(kind) => {
                    self.feature_kind = kind;
                    Some(Ok(()))
                }
                None => Some(Err(Error::config(format!("Invalid feature_kind: {}", value)))),
            },
            "distance_metric" => match DistanceMetricKind::from_str(value) {
                Some(metric) => {
                    self.distance_metric = metric;
                    Some(Ok(()))
                }
                None => Some(Err(Error::config(format!(
                    "Invalid distance_metric: {}",
                    value
                )))),
            },
            "score_strategy" => match ScoreStrategyKind::from_str(value) {
                Some(strategy) => {
                    self.score_strategy = strategy;
                    Some(Ok(()))
                }
                None => Some(Err(Error::config(format!(
                    "Invalid score_strategy: {}",
                    value
                )))),
            },
            "stopword_count" => match value.parse() {
                Ok(n) => {
                    self.stopword_count = n;
                    Some(Ok(()))
                }
                Err(_) => Some(Err(Error::config(format!(
                    "Invalid stopword_count value: {}",
                    value
                )))),
            },
            "max_distance" => match value.parse() {
                Ok(n) => {
                    self.max_distance = n;
                    Some(Ok(()))
                }
                Err(_) => Some(Err(Error::config(format!(
                    "Invalid max_distance value: {}",
                    value
                )))),
            },
            "min_shared_features" => match value.parse() {
                Ok(n) => {
                    self.min_shared_features = n;
                    Some(Ok(()))
                }
                Err(_) => Some(Err(Error::config(format!(
                    "Invalid min_shared_features value: {}",
                    value
                )))),
            },
            "max_index_entries" => match value.parse() {
                Ok(n) => {
                    self.max_index_entries = n;
                    Some(Ok(()))
                }
                Err(_) => Some(Err(Error::config(format!(
                    "Invalid max_index_entries value: {}",
                    value
                )))),
            },
            "max_candidate_pairs" => match value.parse() {
                Ok(n) => {
                    self.max_candidate_pairs = n;
                    Some(Ok(()))
                }
                Err(_) => Some(Err(Error::config(format!(
                    "Invalid max_candidate_pairs value: {}",
                    value
                )))),
            },
            _ => None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_shared_features < 1 {
            return Err(Error::config("min_shared_features must be at least 1"));
        }
        if self.max_index_entries == 0 {
            return Err(Error::config("max_index_entries must be at least 1"));
        }
        if self.max_candidate_pairs == 0 {
            return Err(Error::config("max_candidate_pairs must be at least 1"));
        }
        Ok(())
    }
}
