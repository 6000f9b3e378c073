pub mod subsystems;

use std::fs;
use std::path::Path;

use log::{trace, warn};
use serde::{Serialize, Deserialize};

use crate::error::Result;

pub trait FromIni {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TessellaConfig {
    pub language: subsystems::LanguageConfig,
    pub unitizer: subsystems::UnitizerConfig,
    pub matcher: subsystems::SearchConfig,
}

impl TessellaConfig {
    pub fn validate(&self) -> Result<()> {
        self.language.validate()?;
        self.unitizer.validate()?;
        self.matcher.validate()?;
        Ok(())
    }

    pub fn from_ini<P: AsRef<Path>>(path: P) -> Result<Self> {
        let absolute_path = std::fs::canonicalize(&path)
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        trace!("Loading configuration from: {:?}", absolute_path);

        let content = fs::read_to_string(&path)?;

        let mut config = Self::default();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].to_string();
                trace!("  Line {}: Found section: [{}]", line_num + 1, current_section);
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                // Delegate to the appropriate subsystem config
                if let Some(result) = match current_section.as_str() {
                    "language" => config.language.from_ini_section(&current_section, key, value),
                    "unitizer" => config.unitizer.from_ini_section(&current_section, key, value),
                    "matcher" => config.matcher.from_ini_section(&current_section, key, value),
                    _ => None,
                } {
                    result?;
                } else {
                    warn!(
                        "Unrecognized config key: {}={} in section [{}]",
                        key, value, current_section
                    );
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for TessellaConfig {
    fn default() -> Self {
        Self {
            language: subsystems::LanguageConfig::default(),
            unitizer: subsystems::UnitizerConfig::default(),
            matcher: subsystems::SearchConfig::default(),
        }
    }
}
