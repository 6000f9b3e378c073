use std::time::Instant;

use ahash::{AHashMap, AHashSet};
use chrono::Utc;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::index::FeatureIndex;
use crate::tokenizer::FrequencySnapshot;
use crate::types::{FeatureId, FeatureKind, MatchSetId, TextId, UnitId};

use super::distance::{DistanceMetric, DistanceMetricFactory, MatchedPositions};
use super::scoring::{ScoreStrategy, ScoreStrategyFactory};
use super::types::{Match, MatchSet, RunStatus, SearchParams};
use super::CancelToken;

type UnitKey = (TextId, UnitId);
type PairKey = (UnitKey, UnitKey);
type PairMap = AHashMap<PairKey, AHashSet<FeatureId>>;

/// Runs one match search over the corpus: build the feature index for the
/// run's parameters, enumerate cross-text unit pairs per feature, filter by
/// proximity distance, score, rank, and persist the resulting match set.
pub struct SearchEngine;

impl SearchEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn search(
        &self,
        corpus: &mut Corpus,
        params: SearchParams,
        cancel: &CancelToken,
    ) -> Result<MatchSetId> {
        // Parameter problems are reported before any index work starts.
        params.config.validate()?;
        let metric = DistanceMetricFactory::create(params.config.distance_metric);
        let strategy = ScoreStrategyFactory::create(params.config.score_strategy);
        let start = Instant::now();

        let mut texts: Vec<TextId> = params
            .texts
            .iter()
            .copied()
            .filter(|id| {
                if corpus.text(*id).is_none() {
                    warn!("Ignoring unknown text {} in search parameters", id);
                    false
                } else {
                    true
                }
            })
            .collect();
        texts.sort();
        texts.dedup();

        if texts.len() < 2 {
            info!(
                "Search over {} participating text(s): nothing to compare",
                texts.len()
            );
            let set = finished_set(&params, "Fewer than two distinct participating texts");
            return Ok(corpus.insert_match_set(set, Vec::new()));
        }

        // Snapshot before stopword filtering so a concurrent ingest cannot
        // shift the ranking mid-run.
        let snapshot = corpus.frequency_table().snapshot(params.config.feature_kind);
        let index = FeatureIndex::build(
            corpus,
            params.config.unit_kind,
            params.config.feature_kind,
            &texts,
            &snapshot,
            params.config.stopword_count,
            params.config.max_index_entries,
            cancel,
        )?;

        let pairs = accumulate_pairs(&index, params.config.max_candidate_pairs, cancel)?;
        debug!("Accumulated {} candidate unit pairs", pairs.len());

        let mut ordered: Vec<(PairKey, Vec<FeatureId>)> = pairs
            .into_iter()
            .filter(|(_, shared)| shared.len() >= params.config.min_shared_features)
            .map(|(key, shared)| {
                let mut shared: Vec<FeatureId> = shared.into_iter().collect();
                shared.sort();
                (key, shared)
            })
            .collect();
        ordered.sort_by_key(|(key, _)| *key);

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let kind = params.config.feature_kind;
        let max_distance = params.config.max_distance;
        let mut matches: Vec<Match> = ordered
            .par_iter()
            .map(|(key, shared)| {
                score_pair(
                    corpus,
                    &snapshot,
                    kind,
                    metric.as_ref(),
                    strategy.as_ref(),
                    max_distance,
                    *key,
                    shared,
                )
            })
            .collect::<Result<Vec<Option<Match>>>>()?
            .into_iter()
            .flatten()
            .collect();

        // Descending score; ties broken by ascending text/unit ids so the
        // ranking is reproducible.
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    (a.source_text, a.source_unit, a.target_text, a.target_unit).cmp(&(
                        b.source_text,
                        b.source_unit,
                        b.target_text,
                        b.target_unit,
                    ))
                })
        });

        let elapsed = start.elapsed().as_secs_f64();
        info!(
            "Search over {} texts produced {} matches in {:.3}s",
            texts.len(),
            matches.len(),
            elapsed
        );
        let set = finished_set(&params, &format!("Done in {:.3} seconds", elapsed));
        Ok(corpus.insert_match_set(set, matches))
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn finished_set(params: &SearchParams, message: &str) -> MatchSet {
    MatchSet {
        id: MatchSetId(0), // assigned on insert
        params: params.clone(),
        status: RunStatus::Done,
        message: message.to_string(),
        created: Utc::now(),
    }
}

fn order_pair(a: UnitKey, b: UnitKey) -> PairKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Enumerate, per retained feature, all unit pairs drawn from different
/// texts, accumulating the shared feature set per pair. Features are
/// partitioned across rayon workers; each worker owns a disjoint subset and
/// emits a local map merged afterwards.
fn accumulate_pairs(
    index: &FeatureIndex,
    max_pairs: usize,
    cancel: &CancelToken,
) -> Result<PairMap> {
    let features = index.features();
    if features.is_empty() {
        return Ok(PairMap::new());
    }

    let workers = rayon::current_num_threads().max(1);
    let chunk = (features.len() / (workers * 4)).max(1);

    let locals: Vec<PairMap> = features
        .par_chunks(chunk)
        .map(|part| -> Result<PairMap> {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let mut local = PairMap::new();
            for feature in part {
                let occurrences = index.occurrences(*feature);
                for (i, (unit_a, text_a)) in occurrences.iter().enumerate() {
                    for (unit_b, text_b) in &occurrences[i + 1..] {
                        if text_a == text_b {
                            continue;
                        }
                        let key = order_pair((*text_a, *unit_a), (*text_b, *unit_b));
                        local.entry(key).or_default().insert(*feature);
                    }
                }
                // Popular features make pair growth combinatorial; fail
                // fast instead of risking unbounded memory.
                if local.len() > max_pairs {
                    return Err(Error::exhausted(format!(
                        "Candidate pairs exceeded {} while enumerating feature {}",
                        max_pairs, feature
                    )));
                }
            }
            Ok(local)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut merged = PairMap::new();
    for local in locals {
        for (key, shared) in local {
            merged.entry(key).or_default().extend(shared);
        }
        if merged.len() > max_pairs {
            return Err(Error::exhausted(format!(
                "Candidate pairs exceeded {} during merge",
                max_pairs
            )));
        }
    }
    Ok(merged)
}

#[allow(clippy::too_many_arguments)]
fn score_pair(
    corpus: &Corpus,
    snapshot: &FrequencySnapshot,
    kind: FeatureKind,
    metric: &dyn DistanceMetric,
    strategy: &dyn ScoreStrategy,
    max_distance: usize,
    key: PairKey,
    shared: &[FeatureId],
) -> Result<Option<Match>> {
    let ((source_text, source_unit), (target_text, target_unit)) = key;

    let source = matched_positions(corpus, source_unit, kind, shared, snapshot)?;
    let target = matched_positions(corpus, target_unit, kind, shared, snapshot)?;

    let source_distance = metric.distance(&MatchedPositions {
        positions: &source.0,
        frequencies: &source.1,
    });
    let target_distance = metric.distance(&MatchedPositions {
        positions: &target.0,
        frequencies: &target.1,
    });
    if source_distance > max_distance || target_distance > max_distance {
        return Ok(None);
    }

    // Rarer shared features contribute more: sum of inverse normalized
    // frequencies on both sides.
    let mut weight = 0.0;
    for feature in shared {
        let fs = snapshot.text_frequency(*feature, source_text);
        let ft = snapshot.text_frequency(*feature, target_text);
        if fs > 0.0 {
            weight += 1.0 / fs;
        }
        if ft > 0.0 {
            weight += 1.0 / ft;
        }
    }

    let score = strategy.score(weight, source_distance, target_distance);
    Ok(Some(Match {
        match_set: MatchSetId(0), // assigned on insert
        score,
        source_text,
        source_unit,
        target_text,
        target_unit,
        shared_features: shared.to_vec(),
    }))
}

/// Distinct in-unit positions carrying any shared feature, with the rarest
/// frequency observed at each position.
fn matched_positions(
    corpus: &Corpus,
    unit_id: UnitId,
    kind: FeatureKind,
    shared: &[FeatureId],
    snapshot: &FrequencySnapshot,
) -> Result<(Vec<usize>, Vec<f64>)> {
    let unit = corpus
        .unit(unit_id)
        .ok_or_else(|| Error::integrity(format!("Candidate references missing unit {}", unit_id)))?;

    let mut positions = Vec::new();
    let mut frequencies = Vec::new();
    for (offset, token_id) in unit.tokens.iter().enumerate() {
        let token = corpus.token(*token_id).ok_or_else(|| {
            Error::integrity(format!(
                "Unit {} references missing token {}",
                unit_id, token_id
            ))
        })?;
        let Some(token_features) = token.features.get(&kind) else {
            continue;
        };
        let mut rarest: Option<f64> = None;
        for feature in token_features {
            if shared.contains(feature) {
                let freq = snapshot.text_frequency(*feature, unit.text);
                rarest = Some(match rarest {
                    Some(current) => current.min(freq),
                    None => freq,
                });
            }
        }
        if let Some(freq) = rarest {
            positions.push(offset);
            frequencies.push(freq);
        }
    }
    Ok((positions, frequencies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{LineSource, TextMeta};
    use crate::language::latin::LatinProfile;
    use crate::matcher::types::SearchConfig;
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

    fn params(texts: Vec<TextId>) -> SearchParams {
        let mut config = SearchConfig::default();
        config.stopword_count = 0;
        config.max_distance = 100;
        SearchParams { config, texts }
    }

    #[test]
    fn single_text_yields_empty_set_without_error() {
        let (mut corpus, ids) = corpus_with(&[("a", "<1> arma virumque cano")]);
        let set_id = SearchEngine::new()
            .search(&mut corpus, params(vec![ids[0]]), &CancelToken::new())
            .unwrap();
        assert!(corpus.matches_for(set_id).is_empty());
        assert_eq!(corpus.match_set(set_id).unwrap().status, RunStatus::Done);
    }

    #[test]
    fn duplicate_text_ids_collapse_to_one() {
        let (mut corpus, ids) = corpus_with(&[("a", "<1> arma virumque cano")]);
        let set_id = SearchEngine::new()
            .search(&mut corpus, params(vec![ids[0], ids[0]]), &CancelToken::new())
            .unwrap();
        assert!(corpus.matches_for(set_id).is_empty());
    }

    #[test]
    fn unknown_text_ids_are_filtered_with_warning() {
        let (mut corpus, ids) =
            corpus_with(&[("a", "<1> arma virumque cano"), ("b", "<1> musa virumque cano")]);
        let mut p = params(vec![ids[0], ids[1], TextId(999)]);
        p.config.stopword_count = 0;
        let set_id = SearchEngine::new()
            .search(&mut corpus, p, &CancelToken::new())
            .unwrap();
        assert_eq!(corpus.matches_for(set_id).len(), 1);
    }

    #[test]
    fn cancelled_search_persists_nothing() {
        let (mut corpus, ids) =
            corpus_with(&[("a", "<1> arma virumque cano"), ("b", "<1> musa virumque cano")]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = SearchEngine::new()
            .search(&mut corpus, params(ids), &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(corpus.match_set(MatchSetId(1)).is_none());
    }

    #[test]
    fn pair_cap_reports_exhaustion() {
        let (mut corpus, ids) = corpus_with(&[
            ("a", "<1> arma cano\n<2> arma cano\n<3> arma cano"),
            ("b", "<1> arma cano\n<2> arma cano\n<3> arma cano"),
        ]);
        let mut p = params(ids);
        p.config.max_candidate_pairs = 2;
        let err = SearchEngine::new()
            .search(&mut corpus, p, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::ResourceExhaustion(_)));
    }

    #[test]
    fn invalid_config_rejected_before_any_work() {
        let (mut corpus, ids) =
            corpus_with(&[("a", "<1> arma cano"), ("b", "<1> arma cano")]);
        let mut p = params(ids);
        p.config.min_shared_features = 0;
        let err = SearchEngine::new()
            .search(&mut corpus, p, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
