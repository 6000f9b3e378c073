// src/config/subsystems/unitizer.rs

use serde::{Serialize, Deserialize};

use crate::config::FromIni;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitizerConfig {
    /// Cap on phrase length in tokens, so unpunctuated verse cannot produce
    /// an unbounded phrase.
    pub max_phrase_length: usize,
}

impl Default for UnitizerConfig {
    fn default() -> Self {
        Self {
            max_phrase_length: 50,
        }
    }
}

impl FromIni for UnitizerConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "unitizer" {
            return None;
        }

        match key {
            "max_phrase_length" => match value.parse() {
                Ok(n) => {
                    self.max_phrase_length = n;
                    Some(Ok(()))
                }
                Err(_) => Some(Err(Error::config(format!(
                    "Invalid max_phrase_length value: {}",
                    value
                )))),
            },
            _ => None,
        }
    }
}

impl UnitizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_phrase_length == 0 {
            return Err(Error::config("max_phrase_length must be at least 1"));
        }
        Ok(())
    }
}
