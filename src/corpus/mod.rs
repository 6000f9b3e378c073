pub mod source;

use std::hash::BuildHasher;

use ahash::AHashMap;
use log::{info, warn};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::language::LanguageProfile;
use crate::matcher::types::{Match, MatchSet};
use crate::tokenizer::{FrequencyTable, TokenDraft, Tokenizer};
use crate::types::{
    Language, MatchSetId, Text, TextId, Token, TokenId, Unit, UnitId, UnitKind,
};
use crate::unitizer::{UnitDraft, Unitizer};

pub use source::{LineSource, RawTextSource};

/// Ingestion-time metadata for one text.
#[derive(Debug, Clone)]
pub struct TextMeta {
    pub title: String,
    pub author: String,
    pub language: Language,
    pub year: i32,
    pub path: String,
}

/// Arena of corpus entities: one indexed collection per entity kind,
/// cross-referenced by stable ids rather than ownership pointers.
pub struct Corpus {
    texts: AHashMap<TextId, Text>,
    tokens: AHashMap<TokenId, Token>,
    units: AHashMap<UnitId, Unit>,
    units_by_text: AHashMap<(TextId, UnitKind), Vec<UnitId>>,
    match_sets: AHashMap<MatchSetId, MatchSet>,
    matches_by_set: AHashMap<MatchSetId, Vec<Match>>,
    freqs: FrequencyTable,
    next_text: u64,
    next_token: u64,
    next_unit: u64,
    next_match_set: u64,
}

struct PreparedText {
    id: TextId,
    meta: TextMeta,
    checksum: u64,
    drafts: Vec<TokenDraft>,
    lines: Vec<UnitDraft>,
    phrases: Vec<UnitDraft>,
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            texts: AHashMap::new(),
            tokens: AHashMap::new(),
            units: AHashMap::new(),
            units_by_text: AHashMap::new(),
            match_sets: AHashMap::new(),
            matches_by_set: AHashMap::new(),
            freqs: FrequencyTable::new(),
            next_text: 1,
            next_token: 1,
            next_unit: 1,
            next_match_set: 1,
        }
    }

    /// Ingest one text: tokenize, unitize, integrity-check, store.
    /// Re-ingesting a text with the same (language, title, author) replaces
    /// its previous tokens, units, and frequency contributions.
    pub fn ingest<P: LanguageProfile>(
        &mut self,
        meta: TextMeta,
        source: &dyn RawTextSource,
        profile: &P,
        unitizer: &Unitizer,
    ) -> Result<TextId> {
        let id = self.allocate_text_id(&meta);
        let prepared = prepare_text(id, meta, source, profile, unitizer, &self.freqs)?;
        self.store_prepared(prepared)
    }

    /// Ingest a batch of same-language texts, tokenizing and unitizing in
    /// parallel. The frequency table supports the concurrent increments;
    /// arena insertion happens serially afterwards.
    pub fn ingest_all<P: LanguageProfile>(
        &mut self,
        batch: Vec<(TextMeta, Box<dyn RawTextSource>)>,
        profile: &P,
        unitizer: &Unitizer,
    ) -> Result<Vec<TextId>> {
        let assigned: Vec<(TextId, TextMeta, Box<dyn RawTextSource>)> = batch
            .into_iter()
            .map(|(meta, source)| (self.allocate_text_id(&meta), meta, source))
            .collect();

        let freqs = &self.freqs;
        let prepared: Vec<PreparedText> = assigned
            .into_par_iter()
            .map(|(id, meta, source)| {
                prepare_text(id, meta, source.as_ref(), profile, unitizer, freqs)
            })
            .collect::<Result<Vec<_>>>()?;

        prepared
            .into_iter()
            .map(|p| self.store_prepared(p))
            .collect()
    }

    fn allocate_text_id(&mut self, meta: &TextMeta) -> TextId {
        if let Some(existing) = self.find_text(meta.language, &meta.title, &meta.author) {
            info!(
                "Re-ingesting {} / {} ({}), replacing text {}",
                meta.author,
                meta.title,
                meta.language.as_str(),
                existing
            );
            return existing;
        }
        let id = TextId(self.next_text);
        self.next_text += 1;
        id
    }

    fn store_prepared(&mut self, prepared: PreparedText) -> Result<TextId> {
        let id = prepared.id;
        self.remove_text_entities(id);

        let token_count = prepared.drafts.len();
        let mut token_ids = Vec::with_capacity(token_count);
        for draft in prepared.drafts {
            let token_id = TokenId(self.next_token);
            self.next_token += 1;
            self.tokens.insert(
                token_id,
                Token {
                    id: token_id,
                    text: id,
                    position: draft.position,
                    display: draft.display,
                    normalized: draft.normalized,
                    features: draft.features,
                },
            );
            token_ids.push(token_id);
        }

        for unit_draft in prepared.lines.into_iter().chain(prepared.phrases) {
            self.store_unit(id, unit_draft, &token_ids, token_count)?;
        }

        self.texts.insert(
            id,
            Text {
                id,
                title: prepared.meta.title,
                author: prepared.meta.author,
                language: prepared.meta.language,
                year: prepared.meta.year,
                path: prepared.meta.path,
                checksum: prepared.checksum,
            },
        );
        info!(
            "Stored text {}: {} tokens, {} line units, {} phrase units",
            id,
            token_count,
            self.units_by_text
                .get(&(id, UnitKind::Line))
                .map(|v| v.len())
                .unwrap_or(0),
            self.units_by_text
                .get(&(id, UnitKind::Phrase))
                .map(|v| v.len())
                .unwrap_or(0)
        );
        Ok(id)
    }

    fn store_unit(
        &mut self,
        text: TextId,
        draft: UnitDraft,
        token_ids: &[TokenId],
        token_count: usize,
    ) -> Result<UnitId> {
        if draft.members.is_empty() {
            return Err(Error::integrity(format!(
                "Empty {} unit in text {}",
                draft.kind.as_str(),
                text
            )));
        }
        let mut tokens = Vec::with_capacity(draft.members.len());
        for member in &draft.members {
            if *member >= token_count {
                return Err(Error::integrity(format!(
                    "Unit in text {} references token index {} beyond {} tokens",
                    text, member, token_count
                )));
            }
            tokens.push(token_ids[*member]);
        }

        let unit_id = UnitId(self.next_unit);
        self.next_unit += 1;
        self.units.insert(
            unit_id,
            Unit {
                id: unit_id,
                kind: draft.kind,
                text,
                tokens,
                tag: draft.tag,
            },
        );
        self.units_by_text
            .entry((text, draft.kind))
            .or_default()
            .push(unit_id);
        Ok(unit_id)
    }

    fn remove_text_entities(&mut self, text: TextId) {
        self.tokens.retain(|_, token| token.text != text);
        self.units.retain(|_, unit| unit.text != text);
        self.units_by_text.remove(&(text, UnitKind::Line));
        self.units_by_text.remove(&(text, UnitKind::Phrase));
    }

    // ---- lookup surface ----

    pub fn text(&self, id: TextId) -> Option<&Text> {
        self.texts.get(&id)
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(&id)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn texts(&self) -> impl Iterator<Item = &Text> {
        self.texts.values()
    }

    pub fn find_text(&self, language: Language, title: &str, author: &str) -> Option<TextId> {
        self.texts
            .values()
            .find(|t| t.language == language && t.title == title && t.author == author)
            .map(|t| t.id)
    }

    /// Unit ids of one kind for one text, in source order.
    pub fn units(&self, text: TextId, kind: UnitKind) -> &[UnitId] {
        self.units_by_text
            .get(&(text, kind))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn frequency_table(&self) -> &FrequencyTable {
        &self.freqs
    }

    /// Concatenated display forms of a unit's tokens, for presentation and
    /// for verifying that units reconstruct their source span.
    pub fn unit_display(&self, id: UnitId) -> Option<String> {
        let unit = self.units.get(&id)?;
        let words: Vec<&str> = unit
            .tokens
            .iter()
            .filter_map(|t| self.tokens.get(t).map(|token| token.display.as_str()))
            .collect();
        Some(words.join(" "))
    }

    // ---- match run persistence ----

    /// Store one run's MatchSet and its matches, assigning the set id.
    pub fn insert_match_set(&mut self, mut set: MatchSet, mut matches: Vec<Match>) -> MatchSetId {
        let id = MatchSetId(self.next_match_set);
        self.next_match_set += 1;
        set.id = id;
        for m in &mut matches {
            m.match_set = id;
        }
        info!("Stored match set {} with {} matches", id, matches.len());
        self.match_sets.insert(id, set);
        self.matches_by_set.insert(id, matches);
        id
    }

    pub fn match_set(&self, id: MatchSetId) -> Option<&MatchSet> {
        self.match_sets.get(&id)
    }

    pub fn matches_for(&self, id: MatchSetId) -> &[Match] {
        self.matches_by_set
            .get(&id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Match runs are disposable; deleting one never touches the rest of
    /// the corpus.
    pub fn delete_match_set(&mut self, id: MatchSetId) {
        if self.match_sets.remove(&id).is_none() {
            warn!("Deleting unknown match set {}", id);
        }
        self.matches_by_set.remove(&id);
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

fn prepare_text<P: LanguageProfile>(
    id: TextId,
    meta: TextMeta,
    source: &dyn RawTextSource,
    profile: &P,
    unitizer: &Unitizer,
    freqs: &FrequencyTable,
) -> Result<PreparedText> {
    if meta.language != profile.language() {
        return Err(Error::config(format!(
            "Text {} is {} but the profile handles {}",
            meta.title,
            meta.language.as_str(),
            profile.language().as_str()
        )));
    }
    let lines = source.read_lines()?;
    let checksum = content_checksum(&lines);
    let tokenizer = Tokenizer::new(profile);
    let drafts = tokenizer.tokenize(id, &lines, freqs)?;
    let unitized = unitizer.unitize(&drafts)?;
    Ok(PreparedText {
        id,
        meta,
        checksum,
        drafts,
        lines: unitized.lines,
        phrases: unitized.phrases,
    })
}

fn content_checksum(lines: &[(String, String)]) -> u64 {
    // Fixed seeds keep the checksum stable across processes.
    let state = ahash::RandomState::with_seeds(0x74657373, 0x656c6c61, 0x636f7270, 0x75734943);
    state.hash_one(lines)
}
