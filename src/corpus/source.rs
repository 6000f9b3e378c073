use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;

lazy_static! {
    // Citation-tagged source line, e.g. "<verg. aen. 1.1> Arma virumque cano".
    static ref TAGGED_LINE: Regex = Regex::new(r"^<([^>]*)>\s*(.*)$").unwrap();
}

/// Boundary to whatever holds raw corpus content. Implementations must be
/// re-readable so a text can be tokenized repeatedly.
pub trait RawTextSource: Send + Sync {
    /// Ordered (citation_tag, raw_line_text) pairs.
    fn read_lines(&self) -> Result<Vec<(String, String)>>;

    /// Stable locator for error reporting.
    fn locator(&self) -> &str;
}

/// In-memory source used by tests and embedding drivers. File-format
/// readers live outside this crate and hand their lines to this type.
#[derive(Debug, Clone)]
pub struct LineSource {
    locator: String,
    lines: Vec<(String, String)>,
}

impl LineSource {
    pub fn new<S: Into<String>>(locator: S, lines: Vec<(String, String)>) -> Self {
        Self {
            locator: locator.into(),
            lines,
        }
    }

    /// Parse newline-delimited content where each line may carry a leading
    /// `<tag>` citation marker. Untagged lines get their 1-based line
    /// number as tag.
    pub fn from_tagged_str<S: Into<String>>(locator: S, content: &str) -> Self {
        let lines = content
            .lines()
            .enumerate()
            .map(|(i, line)| match TAGGED_LINE.captures(line) {
                Some(caps) => (caps[1].trim().to_string(), caps[2].to_string()),
                None => ((i + 1).to_string(), line.to_string()),
            })
            .collect();
        Self::new(locator, lines)
    }
}

impl RawTextSource for LineSource {
    fn read_lines(&self) -> Result<Vec<(String, String)>> {
        Ok(self.lines.clone())
    }

    fn locator(&self) -> &str {
        &self.locator
    }
}
