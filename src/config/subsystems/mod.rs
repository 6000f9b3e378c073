pub mod language;
pub mod unitizer;
pub mod matcher;

pub use language::LanguageConfig;
pub use unitizer::UnitizerConfig;
pub use matcher::SearchConfig;
