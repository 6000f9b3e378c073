use std::fmt;

use ahash::AHashMap;
use serde::{Serialize, Deserialize};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
                 Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(TextId);
entity_id!(TokenId);
entity_id!(FeatureId);
entity_id!(UnitId);
entity_id!(MatchSetId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Latin,
    Greek,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Latin => "latin",
            Language::Greek => "greek",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "latin" => Some(Self::Latin),
            "greek" => Some(Self::Greek),
            _ => None,
        }
    }
}

/// Kind of linguistic feature attached to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Form,
    Lemma,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Form => "form",
            FeatureKind::Lemma => "lemma",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "form" => Some(Self::Form),
            "lemma" | "lemmata" => Some(Self::Lemma),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Line,
    Phrase,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Line => "line",
            UnitKind::Phrase => "phrase",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').to_lowercase().as_str() {
            "line" => Some(Self::Line),
            "phrase" => Some(Self::Phrase),
            _ => None,
        }
    }
}

/// Metadata for one corpus document. Tokens and units reference back to it
/// by id; the record itself owns nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub id: TextId,
    pub title: String,
    pub author: String,
    pub language: Language,
    pub year: i32,
    pub path: String,
    /// 64-bit hash of the raw content, set at ingest.
    pub checksum: u64,
}

/// One lexical unit of a text. Tokens with identical normalized forms remain
/// distinct instances; shared linguistic identity lives in Feature entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub text: TextId,
    /// Positional index within the owning text. Empty source lines advance
    /// this counter without producing tokens.
    pub position: usize,
    pub display: String,
    pub normalized: String,
    /// Empty for unrecognized words; never an error.
    pub features: AHashMap<FeatureKind, Vec<FeatureId>>,
}

/// A corpus-deduplicated linguistic feature with per-text and corpus-wide
/// occurrence statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub kind: FeatureKind,
    pub token: String,
    /// Occurrence count per contributing text.
    pub counts: AHashMap<TextId, u64>,
    /// Total across the corpus, used for stopword ranking.
    pub corpus_count: u64,
}

impl Feature {
    /// Occurrence frequency of this feature within one text, normalized by
    /// that text's token count.
    pub fn text_frequency(&self, text: TextId, text_token_count: u64) -> f64 {
        if text_token_count == 0 {
            return 0.0;
        }
        let count = self.counts.get(&text).copied().unwrap_or(0);
        count as f64 / text_token_count as f64
    }
}

/// A contiguous ordered run of tokens forming a line or a phrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub text: TextId,
    /// Never empty; preserves source order.
    pub tokens: Vec<TokenId>,
    /// Citation tag, e.g. "1.123" for a line or "1.123-1.125" for a phrase
    /// spanning several source lines.
    pub tag: String,
}
