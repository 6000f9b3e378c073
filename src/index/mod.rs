use ahash::{AHashMap, AHashSet};
use log::{debug, info};

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::matcher::CancelToken;
use crate::tokenizer::FrequencySnapshot;
use crate::types::{FeatureId, FeatureKind, TextId, UnitId, UnitKind};

/// Sparse unit-by-feature matrix for one match run, stored as postings:
/// feature id to the ordered list of (unit, text) occurrences. Only
/// non-zero cells exist; the dense space would be unit_count * feature_count
/// with low occupancy.
#[derive(Debug)]
pub struct FeatureIndex {
    postings: AHashMap<FeatureId, Vec<(UnitId, TextId)>>,
    stopwords: AHashSet<FeatureId>,
}

impl FeatureIndex {
    /// Build the index over the participating texts for one unit and
    /// feature kind. The `stopword_count` most corpus-frequent features of
    /// the snapshot are excluded entirely. Fails fast when postings exceed
    /// `max_entries`.
    pub fn build(
        corpus: &Corpus,
        unit_kind: UnitKind,
        feature_kind: FeatureKind,
        texts: &[TextId],
        snapshot: &FrequencySnapshot,
        stopword_count: usize,
        max_entries: usize,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let stopwords = snapshot.stopwords(stopword_count);
        if !stopwords.is_empty() {
            debug!(
                "Excluding {} stopword features from the index",
                stopwords.len()
            );
        }

        let mut postings: AHashMap<FeatureId, Vec<(UnitId, TextId)>> = AHashMap::new();
        let mut entries = 0usize;

        // Deterministic build order regardless of caller ordering.
        let mut ordered_texts: Vec<TextId> = texts.to_vec();
        ordered_texts.sort();
        ordered_texts.dedup();

        for text in ordered_texts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            for unit_id in corpus.units(text, unit_kind) {
                let unit = corpus.unit(*unit_id).ok_or_else(|| {
                    Error::integrity(format!("Text {} lists missing unit {}", text, unit_id))
                })?;
                let mut seen: AHashSet<FeatureId> = AHashSet::new();
                for token_id in &unit.tokens {
                    let token = corpus.token(*token_id).ok_or_else(|| {
                        Error::integrity(format!(
                            "Unit {} of text {} references missing token {}",
                            unit_id, text, token_id
                        ))
                    })?;
                    if token.text != text {
                        return Err(Error::integrity(format!(
                            "Unit {} of text {} holds token {} owned by text {}",
                            unit_id, text, token_id, token.text
                        )));
                    }
                    let Some(features) = token.features.get(&feature_kind) else {
                        continue;
                    };
                    for feature in features {
                        if stopwords.contains(feature) || !seen.insert(*feature) {
                            continue;
                        }
                        postings.entry(*feature).or_default().push((*unit_id, text));
                        entries += 1;
                        if entries > max_entries {
                            return Err(Error::exhausted(format!(
                                "Feature index exceeded {} postings while indexing text {}",
                                max_entries, text
                            )));
                        }
                    }
                }
            }
        }

        info!(
            "Built feature index: {} features, {} postings ({} {} units kind)",
            postings.len(),
            entries,
            feature_kind.as_str(),
            unit_kind.as_str()
        );
        Ok(Self {
            postings,
            stopwords,
        })
    }

    /// Retained feature ids in ascending order, for deterministic
    /// partitioning across workers.
    pub fn features(&self) -> Vec<FeatureId> {
        let mut ids: Vec<FeatureId> = self.postings.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn occurrences(&self, feature: FeatureId) -> &[(UnitId, TextId)] {
        self.postings
            .get(&feature)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_stopword(&self, feature: FeatureId) -> bool {
        self.stopwords.contains(&feature)
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{LineSource, TextMeta};
    use crate::language::latin::LatinProfile;
    use crate::types::Language;
    use crate::unitizer::Unitizer;

    fn corpus_with(texts: &[(&str, &str)]) -> (Corpus, Vec<TextId>) {
        let mut corpus = Corpus::new();
        let profile = LatinProfile::new_with_defaults();
        let unitizer = Unitizer::new_with_defaults();
        let ids = texts
            .iter()
            .map(|(title, content)| {
                let meta = TextMeta {
                    title: title.to_string(),
                    author: "t".into(),
                    language: Language::Latin,
                    year: 0,
                    path: title.to_string(),
                };
                corpus
                    .ingest(
                        meta,
                        &LineSource::from_tagged_str(*title, content),
                        &profile,
                        &unitizer,
                    )
                    .unwrap()
            })
            .collect();
        (corpus, ids)
    }

    #[test]
    fn index_restricted_to_participating_texts() {
        let (corpus, ids) = corpus_with(&[
            ("a", "<1> arma cano"),
            ("b", "<1> arma venit"),
            ("c", "<1> arma alta"),
        ]);
        let snapshot = corpus.frequency_table().snapshot(FeatureKind::Form);
        let index = FeatureIndex::build(
            &corpus,
            UnitKind::Line,
            FeatureKind::Form,
            &ids[..2],
            &snapshot,
            0,
            1_000,
            &CancelToken::new(),
        )
        .unwrap();

        let arma = corpus
            .frequency_table()
            .lookup(FeatureKind::Form, "arma")
            .unwrap();
        let texts: Vec<TextId> = index.occurrences(arma).iter().map(|(_, t)| *t).collect();
        assert_eq!(texts, vec![ids[0], ids[1]]);
    }

    #[test]
    fn stopwords_are_excluded_entirely() {
        let (corpus, ids) = corpus_with(&[("a", "<1> arma cano arma"), ("b", "<1> arma venit")]);
        let snapshot = corpus.frequency_table().snapshot(FeatureKind::Form);
        let index = FeatureIndex::build(
            &corpus,
            UnitKind::Line,
            FeatureKind::Form,
            &ids,
            &snapshot,
            1,
            1_000,
            &CancelToken::new(),
        )
        .unwrap();

        let arma = corpus
            .frequency_table()
            .lookup(FeatureKind::Form, "arma")
            .unwrap();
        assert!(index.is_stopword(arma));
        assert!(index.occurrences(arma).is_empty());
        let cano = corpus
            .frequency_table()
            .lookup(FeatureKind::Form, "cano")
            .unwrap();
        assert_eq!(index.occurrences(cano).len(), 1);
    }

    #[test]
    fn repeated_feature_in_one_unit_posts_once() {
        let (corpus, ids) = corpus_with(&[("a", "<1> arma arma arma")]);
        let snapshot = corpus.frequency_table().snapshot(FeatureKind::Form);
        let index = FeatureIndex::build(
            &corpus,
            UnitKind::Line,
            FeatureKind::Form,
            &ids,
            &snapshot,
            0,
            1_000,
            &CancelToken::new(),
        )
        .unwrap();
        let arma = corpus
            .frequency_table()
            .lookup(FeatureKind::Form, "arma")
            .unwrap();
        assert_eq!(index.occurrences(arma).len(), 1);
    }

    #[test]
    fn postings_cap_fails_fast() {
        let (corpus, ids) = corpus_with(&[("a", "<1> arma cano venit"), ("b", "<1> alta moenia")]);
        let snapshot = corpus.frequency_table().snapshot(FeatureKind::Form);
        let err = FeatureIndex::build(
            &corpus,
            UnitKind::Line,
            FeatureKind::Form,
            &ids,
            &snapshot,
            0,
            2,
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ResourceExhaustion(_)));
    }

    #[test]
    fn cancelled_build_aborts() {
        let (corpus, ids) = corpus_with(&[("a", "<1> arma cano")]);
        let snapshot = corpus.frequency_table().snapshot(FeatureKind::Form);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = FeatureIndex::build(
            &corpus,
            UnitKind::Line,
            FeatureKind::Form,
            &ids,
            &snapshot,
            0,
            1_000,
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
