// src/config/subsystems/language.rs

use std::path::PathBuf;

use serde::{Serialize, Deserialize};

use crate::config::FromIni;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Merge orthographic variants during normalization (u/v and i/j for
    /// Latin, final sigma for Greek).
    pub fold_orthography: bool,

    /// Optional lemma lookup table.
    pub lexicon_file: Option<PathBuf>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            fold_orthography: true,
            lexicon_file: None,
        }
    }
}

impl FromIni for LanguageConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "language" {
            return None;
        }

        match key {
            "fold_orthography" => match value.parse() {
                Ok(flag) => {
                    self.fold_orthography = flag;
                    Some(Ok(()))
                }
                Err(_) => Some(Err(crate::error::Error::config(format!(
                    "Invalid fold_orthography value (must be true/false): {}",
                    value
                )))),
            },
            "lexicon_file" => {
                self.lexicon_file = Some(PathBuf::from(value.trim_matches('"')));
                Some(Ok(()))
            }
            _ => None,
        }
    }
}

impl LanguageConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.lexicon_file {
            // Only warn if the file does not exist, don't fail
            if !path.exists() {
                log::warn!("Lexicon file not found: {:?}", path);
            }
        }
        Ok(())
    }
}
