use unicode_normalization::UnicodeNormalization;

use crate::config::subsystems::LanguageConfig;
use crate::error::Result;
use crate::types::{FeatureKind, Language};

use super::{LanguageProfile, Lexicon};

// Enclitics stripped during lemma lookup when the bare form is unknown.
const ENCLITICS: [&str; 3] = ["que", "ue", "ne"];

/// Latin orthographic profile: case folding, u/v and i/j merging, macron
/// stripping, enclitic-aware lemma lookup.
pub struct LatinProfile {
    settings: LanguageConfig,
    lexicon: Lexicon,
}

impl LatinProfile {
    pub fn new(settings: LanguageConfig) -> Result<Self> {
        let mut lexicon = Lexicon::new();
        if let Some(path) = &settings.lexicon_file {
            lexicon.load(path)?;
        }
        Ok(Self { settings, lexicon })
    }

    pub fn new_with_defaults() -> Self {
        Self {
            settings: LanguageConfig::default(),
            lexicon: Lexicon::new(),
        }
    }

    pub fn lexicon_mut(&mut self) -> &mut Lexicon {
        &mut self.lexicon
    }

    fn normalize_char(&self, c: char) -> Option<char> {
        match c {
            'v' => Some('u'),
            'j' => Some('i'),
            c if c.is_alphabetic() => Some(c),
            _ => None,
        }
    }

    fn lemmata_for(&self, normalized: &str) -> Vec<String> {
        if let Some(found) = self.lexicon.lookup(normalized) {
            return found.to_vec();
        }
        // Unknown form: retry without a trailing enclitic.
        for enclitic in ENCLITICS {
            if let Some(stem) = normalized.strip_suffix(enclitic) {
                if !stem.is_empty() {
                    if let Some(found) = self.lexicon.lookup(stem) {
                        return found.to_vec();
                    }
                }
            }
        }
        Vec::new()
    }
}

impl LanguageProfile for LatinProfile {
    fn language(&self) -> Language {
        Language::Latin
    }

    fn normalize(&self, raw: &str) -> String {
        // NFD first so macrons and other marks decompose into combining
        // characters that can be dropped wholesale.
        raw.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .filter_map(|c| {
                if self.settings.fold_orthography {
                    self.normalize_char(c)
                } else if c.is_alphabetic() {
                    Some(c)
                } else {
                    None
                }
            })
            .collect()
    }

    fn extract_features(&self, normalized: &str) -> Vec<(FeatureKind, Vec<String>)> {
        if normalized.is_empty() {
            return Vec::new();
        }
        let mut features = vec![(FeatureKind::Form, vec![normalized.to_string()])];
        let lemmata = self.lemmata_for(normalized);
        if !lemmata.is_empty() {
            features.push((FeatureKind::Lemma, lemmata));
        }
        features
    }

    fn is_word_char(&self, c: char) -> bool {
        c.is_alphabetic() || is_combining_mark(c)
    }
}

pub(crate) fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' | '\u{1DC0}'..='\u{1DFF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_orthographic_variants() {
        let profile = LatinProfile::new_with_defaults();
        assert_eq!(profile.normalize("Arma"), "arma");
        assert_eq!(profile.normalize("virumque"), "uirumque");
        assert_eq!(profile.normalize("Juppiter"), "iuppiter");
        assert_eq!(profile.normalize("cano,"), "cano");
    }

    #[test]
    fn strips_macrons() {
        let profile = LatinProfile::new_with_defaults();
        assert_eq!(profile.normalize("cānō"), "cano");
    }

    #[test]
    fn form_feature_always_present_for_nonempty_word() {
        let profile = LatinProfile::new_with_defaults();
        let features = profile.extract_features("arma");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].0, FeatureKind::Form);
        assert_eq!(features[0].1, vec!["arma".to_string()]);
    }

    #[test]
    fn empty_word_yields_empty_mapping() {
        let profile = LatinProfile::new_with_defaults();
        assert!(profile.extract_features("").is_empty());
    }

    #[test]
    fn lemma_lookup_falls_back_to_enclitic_stem() {
        let mut profile = LatinProfile::new_with_defaults();
        profile.lexicon_mut().insert("uirum", vec!["uir".to_string()]);
        let features = profile.extract_features("uirumque");
        let lemmata = features
            .iter()
            .find(|(kind, _)| *kind == FeatureKind::Lemma)
            .map(|(_, l)| l.clone())
            .unwrap();
        assert_eq!(lemmata, vec!["uir".to_string()]);
    }
}
