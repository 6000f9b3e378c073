use unicode_normalization::UnicodeNormalization;

use crate::config::subsystems::LanguageConfig;
use crate::error::Result;
use crate::types::{FeatureKind, Language};

use super::latin::is_combining_mark;
use super::{LanguageProfile, Lexicon};

// Marks used for elision in polytonic editions (koronis, right single
// quote, modifier apostrophe, plain apostrophe).
const ELISION_MARKS: [char; 4] = ['\u{1FBD}', '\u{2019}', '\u{02BC}', '\''];

/// Greek polytonic profile: diacritic folding via NFD, final-sigma
/// unification, elision mark handling.
pub struct GreekProfile {
    settings: LanguageConfig,
    lexicon: Lexicon,
}

impl GreekProfile {
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
}

impl LanguageProfile for GreekProfile {
    fn language(&self) -> Language {
        Language::Greek
    }

    fn normalize(&self, raw: &str) -> String {
        raw.nfd()
            .filter(|c| !is_combining_mark(*c) && !ELISION_MARKS.contains(c))
            .flat_map(char::to_lowercase)
            .filter(|c| c.is_alphabetic())
            .map(|c| {
                if self.settings.fold_orthography && c == 'ς' {
                    'σ'
                } else {
                    c
                }
            })
            .collect()
    }

    fn extract_features(&self, normalized: &str) -> Vec<(FeatureKind, Vec<String>)> {
        if normalized.is_empty() {
            return Vec::new();
        }
        let mut features = vec![(FeatureKind::Form, vec![normalized.to_string()])];
        if let Some(lemmata) = self.lexicon.lookup(normalized) {
            features.push((FeatureKind::Lemma, lemmata.to_vec()));
        }
        features
    }

    fn is_word_char(&self, c: char) -> bool {
        c.is_alphabetic() || is_combining_mark(c) || ELISION_MARKS.contains(&c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_diacritics_and_case() {
        let profile = GreekProfile::new_with_defaults();
        assert_eq!(profile.normalize("Μῆνιν"), "μηνιν");
        assert_eq!(profile.normalize("ἄειδε"), "αειδε");
    }

    #[test]
    fn unifies_final_sigma() {
        let profile = GreekProfile::new_with_defaults();
        assert_eq!(profile.normalize("θεᾶς"), "θεασ");
    }

    #[test]
    fn drops_elision_marks() {
        let profile = GreekProfile::new_with_defaults();
        assert_eq!(profile.normalize("δ\u{1FBD}"), "δ");
    }

    #[test]
    fn unknown_word_has_form_but_no_lemma() {
        let profile = GreekProfile::new_with_defaults();
        let features = profile.extract_features("μηνιν");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].0, FeatureKind::Form);
    }
}
