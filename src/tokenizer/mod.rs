pub mod frequency;

use ahash::AHashMap;
use log::{debug, info};

use crate::error::Result;
use crate::language::LanguageProfile;
use crate::types::{FeatureId, FeatureKind, TextId};

pub use frequency::{FrequencyTable, FrequencySnapshot};

// Sentence-terminal punctuation, including the Greek ano teleia.
const SENTENCE_END: [char; 5] = ['.', ';', '?', '!', '\u{0387}'];

/// One tokenized word before entity ids are assigned. Drafts stay aligned
/// with their source line so the unitizer can rebuild lines and citation
/// tags.
#[derive(Debug, Clone)]
pub struct TokenDraft {
    pub display: String,
    pub normalized: String,
    /// Positional index within the text. Empty source lines advance this
    /// counter without producing a draft.
    pub position: usize,
    /// Index of the source line the draft came from.
    pub line_index: usize,
    pub tag: String,
    /// Sentence-terminal punctuation follows this word in the source.
    pub ends_sentence: bool,
    pub features: AHashMap<FeatureKind, Vec<FeatureId>>,
}

/// Converts citation-tagged raw lines into token drafts, registering every
/// extracted feature in the corpus-wide frequency table.
pub struct Tokenizer<'p, P: LanguageProfile> {
    profile: &'p P,
}

struct RawSpan {
    word: String,
    ends_sentence: bool,
    hyphen_at_eol: bool,
}

impl<'p, P: LanguageProfile> Tokenizer<'p, P> {
    pub fn new(profile: &'p P) -> Self {
        Self { profile }
    }

    /// Tokenize one text. Clears the text's previous frequency
    /// contributions first, so repeated runs recompute the same statistics.
    pub fn tokenize(
        &self,
        text: TextId,
        lines: &[(String, String)],
        freqs: &FrequencyTable,
    ) -> Result<Vec<TokenDraft>> {
        freqs.clear_text(text);

        let mut drafts: Vec<TokenDraft> = Vec::new();
        let mut position = 0usize;
        // Word split by a line-end hyphen, waiting for its continuation.
        let mut pending: Option<TokenDraft> = None;

        for (line_index, (tag, raw)) in lines.iter().enumerate() {
            if raw.trim().is_empty() {
                // Keep citation alignment across blank lines.
                position += 1;
                continue;
            }

            let spans = self.scan_line(raw);
            let span_count = spans.len();
            for (span_index, span) in spans.into_iter().enumerate() {
                let mut draft = TokenDraft {
                    display: span.word,
                    normalized: String::new(),
                    position,
                    line_index,
                    tag: tag.clone(),
                    ends_sentence: span.ends_sentence,
                    features: AHashMap::new(),
                };

                if span_index == 0 {
                    if let Some(head) = pending.take() {
                        // The joined word keeps the first half's position
                        // and citation.
                        draft.display = format!("{}{}", head.display, draft.display);
                        draft.position = head.position;
                        draft.line_index = head.line_index;
                        draft.tag = head.tag;
                    } else {
                        position += 1;
                    }
                } else {
                    position += 1;
                }

                if span.hyphen_at_eol && span_index == span_count - 1 {
                    pending = Some(draft);
                    continue;
                }

                self.finish_draft(text, &mut draft, freqs);
                drafts.push(draft);
            }
        }

        // A trailing hyphen with no continuation line is emitted as-is.
        if let Some(mut draft) = pending.take() {
            debug!("Unresolved line-end hyphen in text {}: {}", text, draft.display);
            self.finish_draft(text, &mut draft, freqs);
            drafts.push(draft);
        }

        freqs.set_text_total(text, drafts.len() as u64);
        info!(
            "Tokenized text {}: {} tokens from {} lines",
            text,
            drafts.len(),
            lines.len()
        );
        Ok(drafts)
    }

    fn finish_draft(&self, text: TextId, draft: &mut TokenDraft, freqs: &FrequencyTable) {
        draft.normalized = self.profile.normalize(&draft.display);
        for (kind, tokens) in self.profile.extract_features(&draft.normalized) {
            let ids: Vec<FeatureId> = tokens
                .iter()
                .map(|token| freqs.register(text, kind, token))
                .collect();
            if !ids.is_empty() {
                draft.features.insert(kind, ids);
            }
        }
    }

    /// Split one raw line into word spans, recording for each whether
    /// sentence-terminal punctuation follows it and whether it runs into a
    /// line-end hyphen.
    fn scan_line(&self, raw: &str) -> Vec<RawSpan> {
        let chars: Vec<char> = raw.chars().collect();
        let mut spans = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if !self.profile.is_word_char(chars[i]) {
                i += 1;
                continue;
            }

            let start = i;
            while i < chars.len() && self.profile.is_word_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();

            // Inspect the separator run after the word.
            let mut ends_sentence = false;
            let mut saw_hyphen = false;
            let mut j = i;
            while j < chars.len() && !self.profile.is_word_char(chars[j]) {
                if SENTENCE_END.contains(&chars[j]) {
                    ends_sentence = true;
                }
                if chars[j] == '-' {
                    saw_hyphen = true;
                }
                j += 1;
            }
            let hyphen_at_eol = saw_hyphen && j == chars.len() && !ends_sentence;

            spans.push(RawSpan {
                word,
                ends_sentence,
                hyphen_at_eol,
            });
        }

        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::latin::LatinProfile;

    fn lines(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(tag, raw)| (tag.to_string(), raw.to_string()))
            .collect()
    }

    #[test]
    fn tokenizes_words_with_positions_and_tags() {
        let profile = LatinProfile::new_with_defaults();
        let tokenizer = Tokenizer::new(&profile);
        let freqs = FrequencyTable::new();

        let drafts = tokenizer
            .tokenize(
                TextId(1),
                &lines(&[("1.1", "Arma virumque cano,"), ("1.2", "Troiae qui primus")]),
                &freqs,
            )
            .unwrap();

        assert_eq!(drafts.len(), 6);
        assert_eq!(drafts[0].display, "Arma");
        assert_eq!(drafts[0].normalized, "arma");
        assert_eq!(drafts[0].position, 0);
        assert_eq!(drafts[0].tag, "1.1");
        assert_eq!(drafts[3].tag, "1.2");
        assert_eq!(drafts[3].line_index, 1);
        assert!(drafts[0].features.contains_key(&FeatureKind::Form));
    }

    #[test]
    fn sentence_end_flag_set_by_terminal_punctuation() {
        let profile = LatinProfile::new_with_defaults();
        let tokenizer = Tokenizer::new(&profile);
        let freqs = FrequencyTable::new();

        let drafts = tokenizer
            .tokenize(TextId(1), &lines(&[("1", "cano. arma virumque")]), &freqs)
            .unwrap();

        assert!(drafts[0].ends_sentence);
        assert!(!drafts[1].ends_sentence);
        assert!(!drafts[2].ends_sentence);
    }

    #[test]
    fn empty_lines_advance_position() {
        let profile = LatinProfile::new_with_defaults();
        let tokenizer = Tokenizer::new(&profile);
        let freqs = FrequencyTable::new();

        let drafts = tokenizer
            .tokenize(TextId(1), &lines(&[("1", "arma"), ("2", ""), ("3", "cano")]), &freqs)
            .unwrap();

        assert_eq!(drafts[0].position, 0);
        assert_eq!(drafts[1].position, 2);
    }

    #[test]
    fn joins_hyphenated_line_breaks() {
        let profile = LatinProfile::new_with_defaults();
        let tokenizer = Tokenizer::new(&profile);
        let freqs = FrequencyTable::new();

        let drafts = tokenizer
            .tokenize(TextId(1), &lines(&[("1", "lavinia-"), ("2", "que venit")]), &freqs)
            .unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].display, "laviniaque");
        assert_eq!(drafts[0].tag, "1");
        assert_eq!(drafts[1].display, "venit");
    }

    #[test]
    fn retokenizing_is_idempotent() {
        let profile = LatinProfile::new_with_defaults();
        let tokenizer = Tokenizer::new(&profile);
        let freqs = FrequencyTable::new();
        let input = lines(&[("1", "arma arma cano")]);

        tokenizer.tokenize(TextId(1), &input, &freqs).unwrap();
        tokenizer.tokenize(TextId(1), &input, &freqs).unwrap();

        let id = freqs.lookup(FeatureKind::Form, "arma").unwrap();
        assert_eq!(freqs.feature(id).unwrap().corpus_count, 2);
    }
}
