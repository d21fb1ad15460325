//! # Tagger Configuration
//!
//! The tokenization unit and the special vocabulary entries shared by the
//! batching, vocabulary and IOB utilities. A `TaggerConfig` is passed
//! explicitly to every function that depends on it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeqTagError};

/// Unit of tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// One token per character, spaces dropped.
    Char,
    /// One token per space-separated word.
    #[default]
    Word,
}

impl FromStr for Unit {
    type Err = SeqTagError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "char" => Ok(Self::Char),
            "word" => Ok(Self::Word),
            other => Err(SeqTagError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char => write!(f, "char"),
            Self::Word => write!(f, "word"),
        }
    }
}

/// Configuration for tokenization and special indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Tokenization unit
    pub unit: Unit,
    /// Padding index
    pub pad_idx: u32,
    /// Start-of-sequence index
    pub sos_idx: u32,
    /// End-of-sequence index
    pub eos_idx: u32,
    /// Unknown-token index
    pub unk_idx: u32,
    /// Token stored at `pad_idx` when building a vocabulary
    pub pad_token: String,
    /// Start-of-sequence token
    pub sos_token: String,
    /// End-of-sequence token
    pub eos_token: String,
    /// Stands in for tokens missing from the vocabulary
    pub unk_token: String,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            unit: Unit::Word,
            pad_idx: 0,
            sos_idx: 1,
            eos_idx: 2,
            unk_idx: 3,
            pad_token: "<PAD>".into(),
            sos_token: "<SOS>".into(),
            eos_token: "<EOS>".into(),
            unk_token: "<UNK>".into(),
        }
    }
}

impl TaggerConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the tokenization unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Set the padding index.
    pub fn with_pad_idx(mut self, idx: u32) -> Self {
        self.pad_idx = idx;
        self
    }

    /// Set the start-of-sequence index.
    pub fn with_sos_idx(mut self, idx: u32) -> Self {
        self.sos_idx = idx;
        self
    }

    /// Set the end-of-sequence index.
    pub fn with_eos_idx(mut self, idx: u32) -> Self {
        self.eos_idx = idx;
        self
    }

    /// Set the unknown-token index.
    pub fn with_unk_idx(mut self, idx: u32) -> Self {
        self.unk_idx = idx;
        self
    }

    /// Special tokens paired with their indices, ordered by index.
    pub fn special_tokens(&self) -> Vec<(&str, u32)> {
        let mut specials = vec![
            (self.pad_token.as_str(), self.pad_idx),
            (self.sos_token.as_str(), self.sos_idx),
            (self.eos_token.as_str(), self.eos_idx),
            (self.unk_token.as_str(), self.unk_idx),
        ];
        specials.sort_by_key(|&(_, idx)| idx);
        specials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_indices() {
        let config = TaggerConfig::default();
        assert_eq!(config.unit, Unit::Word);
        assert_eq!(config.pad_idx, 0);
        assert_eq!(config.sos_idx, 1);
        assert_eq!(config.eos_idx, 2);
        assert_eq!(config.unk_idx, 3);
        assert_eq!(config.pad_token, "<PAD>");
        assert_eq!(config.sos_token, "<SOS>");
        assert_eq!(config.eos_token, "<EOS>");
        assert_eq!(config.unk_token, "<UNK>");
    }

    #[test]
    fn test_builder() {
        let config = TaggerConfig::new()
            .with_unit(Unit::Char)
            .with_pad_idx(9)
            .with_sos_idx(7)
            .with_eos_idx(8)
            .with_unk_idx(1);
        assert_eq!(config.unit, Unit::Char);
        assert_eq!(config.pad_idx, 9);
        assert_eq!(config.sos_idx, 7);
        assert_eq!(config.eos_idx, 8);
        assert_eq!(config.unk_idx, 1);
    }

    #[test]
    fn test_partial_json() {
        let config = TaggerConfig::from_json_str(r#"{"unit": "char", "pad_idx": 5}"#).unwrap();
        assert_eq!(config.unit, Unit::Char);
        assert_eq!(config.pad_idx, 5);
        assert_eq!(config.sos_idx, 1);
        assert_eq!(config.unk_token, "<UNK>");
    }

    #[test]
    fn test_bad_unit_json() {
        assert!(TaggerConfig::from_json_str(r#"{"unit": "byte"}"#).is_err());
    }

    #[test]
    fn test_unit_from_str() {
        assert_eq!("char".parse::<Unit>().unwrap(), Unit::Char);
        assert_eq!("word".parse::<Unit>().unwrap(), Unit::Word);
        assert!(matches!(
            "subword".parse::<Unit>(),
            Err(SeqTagError::UnknownUnit(_))
        ));
        assert_eq!(Unit::Char.to_string(), "char");
    }

    #[test]
    fn test_special_tokens_ordered() {
        let config = TaggerConfig::new().with_pad_idx(3).with_unk_idx(0);
        let specials = config.special_tokens();
        assert_eq!(specials[0], ("<UNK>", 0));
        assert_eq!(specials[3], ("<PAD>", 3));
    }
}
