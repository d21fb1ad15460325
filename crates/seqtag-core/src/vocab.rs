//! # Vocabulary Files
//!
//! Plain-text vocabularies with one token per line. The line number (0-based)
//! is the token index.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::config::TaggerConfig;
use crate::error::Result;

/// Load a token-to-index mapping from a vocabulary file.
///
/// A token repeated on several lines is reassigned the mapping size at that line.
pub fn load_tkn_to_idx<P: AsRef<Path>>(path: P) -> Result<HashMap<String, u32>> {
    info!("loading {}", path.as_ref().display());
    let reader = BufReader::new(File::open(path)?);

    let mut tkn_to_idx = HashMap::new();
    for line in reader.lines() {
        let idx = tkn_to_idx.len() as u32;
        tkn_to_idx.insert(line?, idx);
    }

    Ok(tkn_to_idx)
}

/// Load an index-to-token list from a vocabulary file.
pub fn load_idx_to_tkn<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    info!("loading {}", path.as_ref().display());
    let reader = BufReader::new(File::open(path)?);

    Ok(reader.lines().collect::<std::io::Result<Vec<_>>>()?)
}

/// Write a token-to-index mapping, one token per line in index order.
pub fn save_tkn_to_idx<P: AsRef<Path>>(path: P, tkn_to_idx: &HashMap<String, u32>) -> Result<()> {
    let mut entries: Vec<_> = tkn_to_idx.iter().collect();
    entries.sort_by_key(|&(_, idx)| *idx);

    let mut out = BufWriter::new(File::create(path)?);
    for (tkn, _) in entries {
        writeln!(out, "{tkn}")?;
    }
    out.flush()?;
    Ok(())
}

/// Write tokenized sequences, one space-joined sequence per line.
pub fn save_data<P, S>(path: P, data: &[Vec<S>]) -> Result<()>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let mut out = BufWriter::new(File::create(path)?);
    for seq in data {
        let line: Vec<&str> = seq.iter().map(AsRef::as_ref).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()?;
    Ok(())
}

/// Bidirectional token vocabulary.
#[derive(Debug, Clone, Default)]
pub struct Vocab {
    tkn_to_idx: HashMap<String, u32>,
    idx_to_tkn: Vec<String>,
    unk_idx: Option<u32>,
}

impl Vocab {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vocabulary pre-filled with the configured special tokens.
    ///
    /// Special indices are expected to be contiguous from zero; gaps are
    /// filled in insertion order.
    pub fn with_specials(config: &TaggerConfig) -> Self {
        let mut vocab = Self::new();
        for (token, _) in config.special_tokens() {
            vocab.insert(token);
        }
        vocab.unk_idx = vocab.get(&config.unk_token);
        vocab
    }

    /// Load a vocabulary file. Unknown tokens encode to `config.unk_idx`.
    pub fn load<P: AsRef<Path>>(path: P, config: &TaggerConfig) -> Result<Self> {
        let idx_to_tkn = load_idx_to_tkn(path)?;
        let tkn_to_idx = idx_to_tkn
            .iter()
            .enumerate()
            .map(|(idx, tkn)| (tkn.clone(), idx as u32))
            .collect();

        Ok(Self {
            tkn_to_idx,
            idx_to_tkn,
            unk_idx: Some(config.unk_idx),
        })
    }

    /// Write the vocabulary in index order.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_tkn_to_idx(path, &self.tkn_to_idx)
    }

    /// Add a token if absent and return its index.
    pub fn insert(&mut self, token: &str) -> u32 {
        if let Some(&idx) = self.tkn_to_idx.get(token) {
            return idx;
        }
        let idx = self.idx_to_tkn.len() as u32;
        self.tkn_to_idx.insert(token.to_string(), idx);
        self.idx_to_tkn.push(token.to_string());
        idx
    }

    /// Look up a token's index.
    pub fn get(&self, token: &str) -> Option<u32> {
        self.tkn_to_idx.get(token).copied()
    }

    /// Look up the token stored at `idx`.
    pub fn token(&self, idx: u32) -> Option<&str> {
        self.idx_to_tkn.get(idx as usize).map(String::as_str)
    }

    /// Encode tokens to indices, mapping unknown tokens to the UNK index.
    ///
    /// Without an UNK index, unknown tokens are skipped.
    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<u32> {
        tokens
            .iter()
            .filter_map(|t| self.get(t.as_ref()).or(self.unk_idx))
            .collect()
    }

    /// Decode indices back to tokens; out-of-range indices are skipped.
    pub fn decode(&self, indices: &[u32]) -> Vec<String> {
        indices
            .iter()
            .filter_map(|&idx| self.token(idx))
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.idx_to_tkn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx_to_tkn.is_empty()
    }

    /// Token-to-index view.
    pub fn tkn_to_idx(&self) -> &HashMap<String, u32> {
        &self.tkn_to_idx
    }
}
