//! # Text Normalization and Tokenization

use crate::config::{TaggerConfig, Unit};

/// Normalize raw text by:
/// - Collapsing whitespace runs into a single space
/// - Trimming leading and trailing whitespace
/// - Converting to lowercase
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Split text into tokens according to the configured unit.
///
/// In `Unit::Char` mode spaces are dropped and every remaining character is
/// a token. In `Unit::Word` mode the text is split on single spaces.
///
/// # Examples
/// ```
/// use seqtag_core::{text::tokenize, TaggerConfig};
///
/// let tokens = tokenize(&TaggerConfig::default(), "  New   York ", true);
/// assert_eq!(tokens, vec!["new", "york"]);
/// ```
pub fn tokenize(config: &TaggerConfig, text: &str, normalization: bool) -> Vec<String> {
    let text = if normalization {
        normalize(text)
    } else {
        text.to_string()
    };

    match config.unit {
        Unit::Char => text
            .chars()
            .filter(|&c| c != ' ')
            .map(String::from)
            .collect(),
        Unit::Word => text.split(' ').map(str::to_string).collect(),
    }
}
