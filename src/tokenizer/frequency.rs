use std::sync::atomic::{AtomicU64, Ordering};

use ahash::{AHashMap, AHashSet};
use dashmap::DashMap;
use log::debug;

use crate::types::{Feature, FeatureId, FeatureKind, TextId};

/// Corpus-wide feature statistics. Features are deduplicated by
/// (kind, token); counts are scoped per contributing text so re-tokenizing
/// one text replaces its contribution instead of double-counting.
///
/// Increments are concurrent (tokenization runs per text in parallel); a
/// matching run takes a [`FrequencySnapshot`] before stopword filtering so
/// it never observes partially updated counts.
pub struct FrequencyTable {
    by_key: DashMap<(FeatureKind, String), FeatureId>,
    stats: DashMap<FeatureId, FeatureStats>,
    text_totals: DashMap<TextId, u64>,
    next_id: AtomicU64,
}

#[derive(Debug, Clone)]
struct FeatureStats {
    kind: FeatureKind,
    token: String,
    counts: AHashMap<TextId, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self {
            by_key: DashMap::new(),
            stats: DashMap::new(),
            text_totals: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Record one occurrence of a feature within `text`, creating the
    /// feature entity on first sight. Returns the stable feature id.
    pub fn register(&self, text: TextId, kind: FeatureKind, token: &str) -> FeatureId {
        let id = *self
            .by_key
            .entry((kind, token.to_string()))
            .or_insert_with(|| FeatureId(self.next_id.fetch_add(1, Ordering::Relaxed)));

        let mut entry = self.stats.entry(id).or_insert_with(|| FeatureStats {
            kind,
            token: token.to_string(),
            counts: AHashMap::new(),
        });
        *entry.counts.entry(text).or_insert(0) += 1;
        id
    }

    /// Record the total token count of a text, used to normalize per-text
    /// frequencies.
    pub fn set_text_total(&self, text: TextId, total: u64) {
        self.text_totals.insert(text, total);
    }

    /// Drop every count contributed by `text`. Called before re-tokenizing
    /// so repeated runs are idempotent.
    pub fn clear_text(&self, text: TextId) {
        let mut cleared = 0;
        for mut entry in self.stats.iter_mut() {
            if entry.counts.remove(&text).is_some() {
                cleared += 1;
            }
        }
        self.text_totals.remove(&text);
        if cleared > 0 {
            debug!("Cleared {} feature counts for text {}", cleared, text);
        }
    }

    pub fn lookup(&self, kind: FeatureKind, token: &str) -> Option<FeatureId> {
        self.by_key.get(&(kind, token.to_string())).map(|id| *id)
    }

    /// Materialize one feature entity with its current statistics.
    pub fn feature(&self, id: FeatureId) -> Option<Feature> {
        self.stats.get(&id).map(|stats| Feature {
            id,
            kind: stats.kind,
            token: stats.token.clone(),
            counts: stats.counts.clone(),
            corpus_count: stats.counts.values().sum(),
        })
    }

    pub fn feature_count(&self) -> usize {
        self.stats.len()
    }

    /// Take a consistent point-in-time view of one feature kind's
    /// statistics, ranked for stopword filtering.
    pub fn snapshot(&self, kind: FeatureKind) -> FrequencySnapshot {
        let mut counts: AHashMap<FeatureId, FeatureCounts> = AHashMap::new();
        for entry in self.stats.iter() {
            if entry.kind != kind {
                continue;
            }
            let corpus: u64 = entry.counts.values().sum();
            if corpus == 0 {
                continue;
            }
            counts.insert(
                *entry.key(),
                FeatureCounts {
                    corpus,
                    by_text: entry.counts.clone(),
                },
            );
        }

        // Descending corpus count; ties broken by ascending id so the
        // stopword cut is deterministic.
        let mut ranked: Vec<FeatureId> = counts.keys().copied().collect();
        ranked.sort_by(|a, b| {
            counts[b]
                .corpus
                .cmp(&counts[a].corpus)
                .then_with(|| a.cmp(b))
        });

        let totals = self
            .text_totals
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();

        FrequencySnapshot {
            kind,
            ranked,
            counts,
            totals,
        }
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct FeatureCounts {
    corpus: u64,
    by_text: AHashMap<TextId, u64>,
}

/// Immutable per-run view of one feature kind's frequency statistics.
#[derive(Debug, Clone)]
pub struct FrequencySnapshot {
    kind: FeatureKind,
    ranked: Vec<FeatureId>,
    counts: AHashMap<FeatureId, FeatureCounts>,
    totals: AHashMap<TextId, u64>,
}

impl FrequencySnapshot {
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// The `n` most corpus-frequent features of this kind.
    pub fn stopwords(&self, n: usize) -> AHashSet<FeatureId> {
        self.ranked.iter().take(n).copied().collect()
    }

    pub fn corpus_count(&self, id: FeatureId) -> u64 {
        self.counts.get(&id).map(|c| c.corpus).unwrap_or(0)
    }

    /// Frequency of a feature within one text, normalized by that text's
    /// token count. Zero when either side is unknown.
    pub fn text_frequency(&self, id: FeatureId, text: TextId) -> f64 {
        let total = self.totals.get(&text).copied().unwrap_or(0);
        if total == 0 {
            return 0.0;
        }
        let count = self
            .counts
            .get(&id)
            .and_then(|c| c.by_text.get(&text).copied())
            .unwrap_or(0);
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_by_kind_and_token() {
        let table = FrequencyTable::new();
        let a = table.register(TextId(1), FeatureKind::Form, "cano");
        let b = table.register(TextId(2), FeatureKind::Form, "cano");
        let c = table.register(TextId(1), FeatureKind::Lemma, "cano");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.feature(a).unwrap().corpus_count, 2);
    }

    #[test]
    fn clear_text_removes_only_that_texts_counts() {
        let table = FrequencyTable::new();
        let id = table.register(TextId(1), FeatureKind::Form, "uirumque");
        table.register(TextId(2), FeatureKind::Form, "uirumque");
        table.clear_text(TextId(1));
        assert_eq!(table.feature(id).unwrap().corpus_count, 1);
        assert!(!table.feature(id).unwrap().counts.contains_key(&TextId(1)));
    }

    #[test]
    fn snapshot_ranks_by_corpus_count_with_id_tiebreak() {
        let table = FrequencyTable::new();
        let rare = table.register(TextId(1), FeatureKind::Form, "arma");
        let common = table.register(TextId(1), FeatureKind::Form, "que");
        table.register(TextId(2), FeatureKind::Form, "que");
        // Lemma counts must not leak into a form snapshot.
        table.register(TextId(1), FeatureKind::Lemma, "armum");

        let snapshot = table.snapshot(FeatureKind::Form);
        let top = snapshot.stopwords(1);
        assert!(top.contains(&common));
        assert!(!top.contains(&rare));
        assert_eq!(snapshot.corpus_count(common), 2);
    }

    #[test]
    fn text_frequency_uses_text_totals() {
        let table = FrequencyTable::new();
        let id = table.register(TextId(1), FeatureKind::Form, "cano");
        table.register(TextId(1), FeatureKind::Form, "cano");
        table.set_text_total(TextId(1), 8);

        let snapshot = table.snapshot(FeatureKind::Form);
        assert!((snapshot.text_frequency(id, TextId(1)) - 0.25).abs() < 1e-12);
        assert_eq!(snapshot.text_frequency(id, TextId(9)), 0.0);
    }
}
