use log::debug;

use crate::config::subsystems::UnitizerConfig;
use crate::error::Result;
use crate::tokenizer::TokenDraft;
use crate::types::UnitKind;

/// A structural unit before entity ids are assigned. `members` are indices
/// into the text's token draft sequence, in source order.
#[derive(Debug, Clone)]
pub struct UnitDraft {
    pub kind: UnitKind,
    pub members: Vec<usize>,
    pub tag: String,
}

#[derive(Debug, Clone)]
pub struct UnitizedText {
    pub lines: Vec<UnitDraft>,
    pub phrases: Vec<UnitDraft>,
}

/// Groups a token stream into lines (by source line) and phrases (by
/// sentence-terminal punctuation, capped at a configured length).
pub struct Unitizer {
    config: UnitizerConfig,
}

impl Unitizer {
    pub fn new(config: UnitizerConfig) -> Self {
        Self { config }
    }

    pub fn new_with_defaults() -> Self {
        Self::new(UnitizerConfig::default())
    }

    pub fn unitize(&self, drafts: &[TokenDraft]) -> Result<UnitizedText> {
        let lines = self.build_lines(drafts);
        let phrases = self.build_phrases(drafts);
        debug!(
            "Unitized {} tokens into {} lines and {} phrases",
            drafts.len(),
            lines.len(),
            phrases.len()
        );
        Ok(UnitizedText { lines, phrases })
    }

    fn build_lines(&self, drafts: &[TokenDraft]) -> Vec<UnitDraft> {
        let mut lines: Vec<UnitDraft> = Vec::new();
        let mut current: Option<(usize, UnitDraft)> = None;

        for (index, draft) in drafts.iter().enumerate() {
            match &mut current {
                Some((line_index, unit)) if *line_index == draft.line_index => {
                    unit.members.push(index);
                }
                _ => {
                    if let Some((_, unit)) = current.take() {
                        lines.push(unit);
                    }
                    current = Some((
                        draft.line_index,
                        UnitDraft {
                            kind: UnitKind::Line,
                            members: vec![index],
                            tag: draft.tag.clone(),
                        },
                    ));
                }
            }
        }
        if let Some((_, unit)) = current.take() {
            lines.push(unit);
        }
        lines
    }

    fn build_phrases(&self, drafts: &[TokenDraft]) -> Vec<UnitDraft> {
        let mut phrases: Vec<UnitDraft> = Vec::new();
        let mut members: Vec<usize> = Vec::new();

        for (index, draft) in drafts.iter().enumerate() {
            members.push(index);
            if draft.ends_sentence || members.len() >= self.config.max_phrase_length {
                phrases.push(self.close_phrase(drafts, std::mem::take(&mut members)));
            }
        }
        // Trailing partial phrase at end-of-text is still emitted.
        if !members.is_empty() {
            phrases.push(self.close_phrase(drafts, members));
        }
        phrases
    }

    fn close_phrase(&self, drafts: &[TokenDraft], members: Vec<usize>) -> UnitDraft {
        let first_tag = &drafts[members[0]].tag;
        let last_tag = &drafts[*members.last().unwrap()].tag;
        let tag = if first_tag == last_tag {
            first_tag.clone()
        } else {
            format!("{}-{}", first_tag, last_tag)
        };
        UnitDraft {
            kind: UnitKind::Phrase,
            members,
            tag,
        }
    }
}
