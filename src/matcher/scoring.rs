use super::types::ScoreStrategyKind;

/// Combines the raw shared-feature weight with the per-unit proximity
/// distances into a final score. Any implementation must be deterministic
/// and monotonic: more weight never lowers the score, more distance never
/// raises it.
pub trait ScoreStrategy: Send + Sync {
    fn kind(&self) -> ScoreStrategyKind;

    fn score(&self, weight: f64, source_distance: usize, target_distance: usize) -> f64;
}

/// ln(weight / (d_source + d_target)), the classic intertext score: weight
/// is the summed inverse frequency of the shared features in both units, so
/// rare vocabulary in close proximity scores highest.
pub struct LogRatioStrategy;

impl ScoreStrategy for LogRatioStrategy {
    fn kind(&self) -> ScoreStrategyKind {
        ScoreStrategyKind::LogRatio
    }

    fn score(&self, weight: f64, source_distance: usize, target_distance: usize) -> f64 {
        let denominator = (source_distance + target_distance).max(1) as f64;
        (weight / denominator).ln()
    }
}

/// Raw inverse-frequency weight, for callers that filter by distance but do
/// not want it in the ranking.
pub struct RawWeightStrategy;

impl ScoreStrategy for RawWeightStrategy {
    fn kind(&self) -> ScoreStrategyKind {
        ScoreStrategyKind::RawWeight
    }

    fn score(&self, weight: f64, _source_distance: usize, _target_distance: usize) -> f64 {
        weight
    }
}

pub struct ScoreStrategyFactory;

impl ScoreStrategyFactory {
    pub fn create(kind: ScoreStrategyKind) -> Box<dyn ScoreStrategy> {
        match kind {
            ScoreStrategyKind::LogRatio => Box::new(LogRatioStrategy),
            ScoreStrategyKind::RawWeight => Box::new(RawWeightStrategy),
        }
    }
}
