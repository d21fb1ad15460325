//! # IOB Tags and Text Reconstruction
//!
//! Parses Inside-Outside-Begin tags, extracts labelled chunks, and rebuilds
//! text from a token sequence and its tags.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::config::{TaggerConfig, Unit};
use crate::error::Result;
use crate::text::tokenize;

/// A single IOB tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IobTag {
    /// Starts a chunk, e.g. `B-LOC`
    Begin(String),
    /// Continues a chunk, e.g. `I-LOC`
    Inside(String),
    /// Outside any chunk
    Outside,
}

impl IobTag {
    /// Check if this is a "Begin" tag.
    pub fn is_begin(&self) -> bool {
        matches!(self, Self::Begin(_))
    }

    /// The chunk label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Begin(label) | Self::Inside(label) => Some(label),
            Self::Outside => None,
        }
    }
}

impl From<&str> for IobTag {
    /// Only the first character is significant: `B…` begins, `I…` continues,
    /// anything else is outside. The label follows the first `-`.
    fn from(s: &str) -> Self {
        let label = || s.split_once('-').map_or("", |(_, l)| l).to_string();
        match s.chars().next() {
            Some('B') => Self::Begin(label()),
            Some('I') => Self::Inside(label()),
            _ => Self::Outside,
        }
    }
}

impl FromStr for IobTag {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for IobTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin(l) if l.is_empty() => write!(f, "B"),
            Self::Inside(l) if l.is_empty() => write!(f, "I"),
            Self::Begin(l) => write!(f, "B-{l}"),
            Self::Inside(l) => write!(f, "I-{l}"),
            Self::Outside => write!(f, "O"),
        }
    }
}

/// A labelled span of tokens, `start..end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// Extract labelled chunks from a tag sequence.
///
/// An `I-X` tag that does not continue an `X` chunk opens a new one.
pub fn chunks<S: AsRef<str>>(tags: &[S]) -> Vec<Chunk> {
    let mut out: Vec<Chunk> = Vec::new();
    let mut open = false;

    for (i, tag) in tags.iter().enumerate() {
        match IobTag::from(tag.as_ref()) {
            IobTag::Begin(label) => {
                out.push(Chunk { label, start: i, end: i + 1 });
                open = true;
            }
            IobTag::Inside(label) => {
                let current = out.last_mut().filter(|last| open && last.label == label);
                match current {
                    Some(last) => last.end = i + 1,
                    None => {
                        out.push(Chunk { label, start: i, end: i + 1 });
                        open = true;
                    }
                }
            }
            IobTag::Outside => open = false,
        }
    }

    out
}

/// Rebuilds text from tokens and IOB tags.
pub struct IobDecoder {
    config: TaggerConfig,
    re_tagged: Regex,
    re_tag_suffix: Regex,
}

impl IobDecoder {
    /// Constructs a new `IobDecoder` with pre-compiled patterns.
    ///
    /// # Errors
    ///
    /// Returns `SeqTagError::Regex` if a pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new(config: TaggerConfig) -> Result<Self> {
        Ok(Self {
            config,
            re_tagged: Regex::new(r"^(\S+/\S+( |$))+")?,
            re_tag_suffix: Regex::new(r"/[^ /]+\b")?,
        })
    }

    /// Group tokens at every `B` tag and join them back into text.
    ///
    /// `text` may be plain or in `token/tag` form; tag suffixes are removed
    /// before tokenizing. Tokens within a group are joined with nothing in
    /// `Unit::Char` mode and with a space in `Unit::Word` mode; groups are
    /// joined with a space (char) or a newline (word). Tokens and tags are
    /// paired up to the shorter of the two.
    pub fn iob_to_txt<S: AsRef<str>>(&self, text: &str, tags: &[S]) -> String {
        let text = if self.re_tagged.is_match(text) {
            self.re_tag_suffix.replace_all(text, "")
        } else {
            text.into()
        };

        let mut groups: Vec<Vec<String>> = vec![Vec::new()];
        for (i, (token, tag)) in tokenize(&self.config, &text, false)
            .into_iter()
            .zip(tags)
            .enumerate()
        {
            if i > 0 && tag.as_ref().starts_with('B') {
                groups.push(Vec::new());
            }
            if let Some(group) = groups.last_mut() {
                group.push(token);
            }
        }

        let (within, between) = match self.config.unit {
            Unit::Char => ("", " "),
            Unit::Word => (" ", "\n"),
        };

        groups
            .iter()
            .map(|group| group.join(within))
            .collect::<Vec<_>>()
            .join(between)
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }
}

/// Convenience function: decode with a one-off `IobDecoder`.
pub fn iob_to_txt<S: AsRef<str>>(config: &TaggerConfig, text: &str, tags: &[S]) -> Result<String> {
    Ok(IobDecoder::new(config.clone())?.iob_to_txt(text, tags))
}
