use super::types::DistanceMetricKind;

/// Matched-feature occurrences inside one unit: distinct token positions in
/// ascending order, each paired with the normalized frequency of the rarest
/// shared feature at that position.
#[derive(Debug)]
pub struct MatchedPositions<'a> {
    pub positions: &'a [usize],
    pub frequencies: &'a [f64],
}

/// Measures how dispersed the shared features are within a unit. Smaller
/// is denser; a single matched position has distance 1.
pub trait DistanceMetric: Send + Sync {
    fn kind(&self) -> DistanceMetricKind;

    fn distance(&self, matched: &MatchedPositions) -> usize;
}

/// Token span covering all matched positions.
pub struct SpanDistance;

impl DistanceMetric for SpanDistance {
    fn kind(&self) -> DistanceMetricKind {
        DistanceMetricKind::Span
    }

    fn distance(&self, matched: &MatchedPositions) -> usize {
        match (matched.positions.first(), matched.positions.last()) {
            (Some(first), Some(last)) => last - first + 1,
            _ => 0,
        }
    }
}

/// Span between the two rarest matched words. Rare shared vocabulary close
/// together signals a denser parallel than the full span does.
pub struct FrequencyDistance;

impl DistanceMetric for FrequencyDistance {
    fn kind(&self) -> DistanceMetricKind {
        DistanceMetricKind::Frequency
    }

    fn distance(&self, matched: &MatchedPositions) -> usize {
        if matched.positions.len() < 2 {
            return if matched.positions.is_empty() { 0 } else { 1 };
        }

        // Two positions with the smallest frequencies; ties resolved by
        // earlier position so the result is deterministic.
        let mut order: Vec<usize> = (0..matched.positions.len()).collect();
        order.sort_by(|a, b| {
            matched.frequencies[*a]
                .partial_cmp(&matched.frequencies[*b])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| matched.positions[*a].cmp(&matched.positions[*b]))
        });

        let p1 = matched.positions[order[0]];
        let p2 = matched.positions[order[1]];
        p1.abs_diff(p2) + 1
    }
}

pub struct DistanceMetricFactory;

impl DistanceMetricFactory {
    pub fn create(kind: DistanceMetricKind) -> Box<dyn DistanceMetric> {
        match kind {
            DistanceMetricKind::Span => Box::new(SpanDistance),
            DistanceMetricKind::Frequency => Box::new(FrequencyDistance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_covers_first_to_last() {
        let metric = SpanDistance;
        let matched = MatchedPositions {
            positions: &[1, 4, 7],
            frequencies: &[0.2, 0.1, 0.3],
        };
        assert_eq!(metric.distance(&matched), 7);
    }

    #[test]
    fn span_of_single_position_is_one() {
        let metric = SpanDistance;
        let matched = MatchedPositions {
            positions: &[3],
            frequencies: &[0.5],
        };
        assert_eq!(metric.distance(&matched), 1);
    }

    #[test]
    fn frequency_picks_two_rarest_words() {
        let metric = FrequencyDistance;
        // Rarest features at positions 0 and 7; the common word at 4 is
        // ignored.
        let matched = MatchedPositions {
            positions: &[0, 4, 7],
            frequencies: &[0.01, 0.9, 0.02],
        };
        assert_eq!(metric.distance(&matched), 8);
    }

    #[test]
    fn frequency_tie_break_is_positional() {
        let metric = FrequencyDistance;
        let matched = MatchedPositions {
            positions: &[2, 3, 9],
            frequencies: &[0.1, 0.1, 0.1],
        };
        assert_eq!(metric.distance(&matched), 2);
    }

    #[test]
    fn factory_covers_every_kind() {
        for kind in [DistanceMetricKind::Span, DistanceMetricKind::Frequency] {
            assert_eq!(DistanceMetricFactory::create(kind).kind(), kind);
        }
    }
}
