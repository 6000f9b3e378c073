pub mod latin;
pub mod greek;

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use ahash::AHashMap;
use log::{info, warn};

use crate::error::Result;
use crate::types::{FeatureKind, Language};

/// Per-language rules consumed by the tokenizer: alphabet membership,
/// normalization, and feature extraction. Adding a language means adding a
/// new implementation, never branching on language name in shared logic.
pub trait LanguageProfile: Send + Sync {
    fn language(&self) -> Language;

    /// Fold a raw word into its normalized form (case, diacritics,
    /// orthographic variants). An empty result means the span carried no
    /// alphabet characters.
    fn normalize(&self, raw: &str) -> String;

    /// Ordered mapping of feature kind to feature tokens for one normalized
    /// word. An unrecognized word yields an empty mapping, never an error.
    fn extract_features(&self, normalized: &str) -> Vec<(FeatureKind, Vec<String>)>;

    /// Whether a character belongs to this language's alphabet for the
    /// purpose of word splitting.
    fn is_word_char(&self, c: char) -> bool;
}

/// Lemma lookup table shared by the concrete profiles. One entry per line:
/// normalized form, whitespace, comma-separated lemmata. Lines starting with
/// '#' are comments.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: AHashMap<String, Vec<String>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, form: &str, lemmata: Vec<String>) {
        self.entries.insert(form.to_string(), lemmata);
    }

    pub fn lookup(&self, form: &str) -> Option<&[String]> {
        self.entries.get(form).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load entries from a lexicon file. A missing file is tolerated with a
    /// warning so a profile without morphological data still tokenizes.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let file = match File::open(path_ref) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Lexicon file not found: {:?}", path_ref);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let reader = io::BufReader::new(file);
        let mut count = 0;
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if let Some((form, lemmata)) = trimmed.split_once(char::is_whitespace) {
                let lemmata: Vec<String> = lemmata
                    .split(',')
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect();
                if !lemmata.is_empty() {
                    self.entries.insert(form.trim().to_string(), lemmata);
                    count += 1;
                }
            }
        }

        info!("Loaded {} lexicon entries from {:?}", count, path_ref);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lexicon_loads_entries_and_skips_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "arma\tarma").unwrap();
        writeln!(file, "cano cano,canus").unwrap();
        writeln!(file).unwrap();

        let mut lexicon = Lexicon::new();
        lexicon.load(file.path()).unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.lookup("arma"), Some(&["arma".to_string()][..]));
        assert_eq!(
            lexicon.lookup("cano"),
            Some(&["cano".to_string(), "canus".to_string()][..])
        );
        assert_eq!(lexicon.lookup("uirum"), None);
    }

    #[test]
    fn lexicon_tolerates_missing_file() {
        let mut lexicon = Lexicon::new();
        lexicon.load("no/such/lexicon.tsv").unwrap();
        assert!(lexicon.is_empty());
    }
}
