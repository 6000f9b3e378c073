//! tessella is a library for detecting intertextual parallels across
//! classical-language corpora. It tokenizes Latin and Greek texts into
//! feature-bearing tokens, groups them into line and phrase units, and runs
//! a sparse feature-index search that ranks cross-text unit pairs sharing
//! distinctive vocabulary.

// Module declarations
pub mod error;
pub mod types;
pub mod config;
pub mod language;
pub mod tokenizer;
pub mod unitizer;
pub mod index;
pub mod matcher;
pub mod corpus;

// Re-exports
pub use error::{Error, Result};
pub use corpus::{Corpus, LineSource, RawTextSource, TextMeta};
pub use language::{LanguageProfile, latin::LatinProfile, greek::GreekProfile};
pub use matcher::{CancelToken, Match, MatchSet, RunStatus, SearchEngine, SearchParams};
pub use unitizer::Unitizer;

// Re-export the config from config module
pub use config::TessellaConfig;
