//! # Batch Padding
//!
//! Turns variable-length word-index sequences, and optionally their
//! per-word character sequences, into rectangular batches ready for
//! tensor consumption. Padding lengths are reduced over the whole batch:
//! one long sequence or word widens every row.

use candle_core::{Device, Tensor};
use serde::Serialize;
use tracing::debug;

use crate::config::TaggerConfig;
use crate::error::{Result, SeqTagError};

/// Options controlling sentinel insertion and minimum padded length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Prepend the start-of-sequence index
    pub sos: bool,
    /// Append the end-of-sequence index
    pub eos: bool,
    /// Lower bound for both the word and character lengths
    pub minlen: usize,
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend SOS to every sequence.
    pub fn with_sos(mut self, sos: bool) -> Self {
        self.sos = sos;
        self
    }

    /// Append EOS to every sequence.
    pub fn with_eos(mut self, eos: bool) -> Self {
        self.eos = eos;
        self
    }

    /// Pad to at least `minlen` words and characters.
    pub fn with_minlen(mut self, minlen: usize) -> Self {
        self.minlen = minlen;
        self
    }
}

/// A padded batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    /// Character indices, shape `[batch, words, chars]`, if character input was given
    pub chars: Option<Vec<Vec<Vec<u32>>>>,
    /// Word indices, shape `[batch, words]`
    pub words: Vec<Vec<u32>>,
    #[serde(skip)]
    options: BatchOptions,
    #[serde(skip)]
    char_len: Option<usize>,
}

/// Pad a batch of word sequences and optional character sequences.
///
/// Each sequence in `xw` becomes
/// `[SOS]? + seq + [EOS]? + PAD * (xw_len - len(seq))` where
/// `xw_len = max(minlen, longest sequence)`.
///
/// When `xc` is non-empty, every word is wrapped as
/// `[SOS] + chars + [EOS] + PAD * (xc_len - len(word))` with
/// `xc_len = max(minlen, longest word)`, and every sequence of wrapped
/// words is filled with all-PAD words so that it lines up with its word
/// row, including the SOS/EOS positions.
///
/// # Errors
///
/// Returns `SeqTagError::EmptyBatch` if `xw` is empty, and
/// `SeqTagError::BatchShape` if `xc` does not line up with `xw`.
///
/// # Examples
/// ```
/// use seqtag_core::{batchify, BatchOptions, TaggerConfig};
///
/// let config = TaggerConfig::default();
/// let batch = batchify(&config, &[], &[vec![7, 8, 9], vec![7]], BatchOptions::new()).unwrap();
/// assert_eq!(batch.words, vec![vec![7, 8, 9], vec![7, 0, 0]]);
/// assert!(batch.chars.is_none());
/// ```
pub fn batchify(
    config: &TaggerConfig,
    xc: &[Vec<Vec<u32>>],
    xw: &[Vec<u32>],
    options: BatchOptions,
) -> Result<Batch> {
    let longest = xw
        .iter()
        .map(Vec::len)
        .max()
        .ok_or(SeqTagError::EmptyBatch)?;
    let xw_len = options.minlen.max(longest);

    let (chars, char_len) = if xc.is_empty() {
        (None, None)
    } else {
        let longest_word = xc.iter().flatten().map(Vec::len).max().unwrap_or(0);
        let xc_len = options.minlen.max(longest_word);
        let padded = pad_chars(config, xc, xw, xw_len, xc_len, options)?;
        (Some(padded), Some(xc_len + 2))
    };

    let words = xw
        .iter()
        .map(|seq| {
            let mut row = Vec::with_capacity(xw_len + 2);
            if options.sos {
                row.push(config.sos_idx);
            }
            row.extend_from_slice(seq);
            if options.eos {
                row.push(config.eos_idx);
            }
            row.resize(row.len() + (xw_len - seq.len()), config.pad_idx);
            row
        })
        .collect();

    debug!(
        batch_size = xw.len(),
        xw_len,
        has_chars = chars.is_some(),
        "padded batch"
    );

    Ok(Batch {
        chars,
        words,
        options,
        char_len,
    })
}

fn pad_chars(
    config: &TaggerConfig,
    xc: &[Vec<Vec<u32>>],
    xw: &[Vec<u32>],
    xw_len: usize,
    xc_len: usize,
    options: BatchOptions,
) -> Result<Vec<Vec<Vec<u32>>>> {
    if xc.len() != xw.len() {
        return Err(SeqTagError::BatchShape(format!(
            "{} character sequences for {} word sequences",
            xc.len(),
            xw.len()
        )));
    }

    let pad_word = vec![config.pad_idx; xc_len + 2];

    xc.iter()
        .enumerate()
        .map(|(i, seq)| {
            if seq.len() > xw_len {
                return Err(SeqTagError::BatchShape(format!(
                    "sequence {i} has {} character words but at most {xw_len} word positions",
                    seq.len()
                )));
            }

            let outer_len = xw_len + usize::from(options.sos) + usize::from(options.eos);
            let mut row = Vec::with_capacity(outer_len);
            if options.sos {
                row.push(pad_word.clone());
            }
            for word in seq {
                let mut wrapped = Vec::with_capacity(xc_len + 2);
                wrapped.push(config.sos_idx);
                wrapped.extend_from_slice(word);
                wrapped.push(config.eos_idx);
                wrapped.resize(xc_len + 2, config.pad_idx);
                row.push(wrapped);
            }
            row.resize(outer_len, pad_word.clone());
            Ok(row)
        })
        .collect()
}

impl Batch {
    /// Number of sequences in the batch.
    pub fn batch_size(&self) -> usize {
        self.words.len()
    }

    /// Padded length of every word row, sentinels included.
    pub fn word_len(&self) -> usize {
        self.words.first().map_or(0, Vec::len)
    }

    /// Padded length of every character word, sentinels included.
    pub fn char_len(&self) -> Option<usize> {
        self.char_len
    }

    /// Options the batch was padded with.
    pub fn options(&self) -> BatchOptions {
        self.options
    }

    /// 1 where the word row holds a non-PAD index, 0 elsewhere.
    pub fn word_mask(&self, config: &TaggerConfig) -> Vec<Vec<u32>> {
        self.words
            .iter()
            .map(|row| row.iter().map(|&idx| u32::from(idx != config.pad_idx)).collect())
            .collect()
    }

    /// Strip sentinels and padding from the word rows, recovering the
    /// unpadded sequences (provided they did not end in PAD themselves).
    pub fn unpad_words(&self, config: &TaggerConfig) -> Vec<Vec<u32>> {
        self.words
            .iter()
            .map(|row| {
                let mut seq: &[u32] = row;
                if self.options.sos {
                    seq = &seq[1..];
                }
                while let [rest @ .., last] = seq {
                    if *last != config.pad_idx {
                        break;
                    }
                    seq = rest;
                }
                if self.options.eos {
                    if let [rest @ .., last] = seq {
                        if *last == config.eos_idx {
                            seq = rest;
                        }
                    }
                }
                seq.to_vec()
            })
            .collect()
    }

    /// Convert the batch into `U32` tensors on `device`.
    ///
    /// Returns the character tensor of shape `[batch, words, chars]` (if
    /// present) and the word tensor of shape `[batch, words]`.
    pub fn to_tensors(&self, device: &Device) -> Result<(Option<Tensor>, Tensor)> {
        let (n, len) = (self.batch_size(), self.word_len());
        let flat: Vec<u32> = self.words.iter().flatten().copied().collect();
        let words = Tensor::from_vec(flat, (n, len), device)?;

        let chars = match (&self.chars, self.char_len) {
            (Some(chars), Some(char_len)) => {
                let flat: Vec<u32> = chars.iter().flatten().flatten().copied().collect();
                Some(Tensor::from_vec(flat, (n, len, char_len), device)?)
            }
            _ => None,
        };

        Ok((chars, words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAD: u32 = 0;
    const SOS: u32 = 1;
    const EOS: u32 = 2;

    fn sample_words() -> Vec<Vec<u32>> {
        vec![vec![10, 11, 12], vec![13], vec![14, 15]]
    }

    fn sample_chars() -> Vec<Vec<Vec<u32>>> {
        vec![
            vec![vec![20, 21], vec![22], vec![23, 24, 25]],
            vec![vec![26]],
            vec![vec![27, 28], vec![29]],
        ]
    }

    #[test]
    fn test_words_only() {
        let config = TaggerConfig::default();
        let batch = batchify(&config, &[], &sample_words(), BatchOptions::new()).unwrap();

        assert!(batch.chars.is_none());
        assert_eq!(
            batch.words,
            vec![vec![10, 11, 12], vec![13, PAD, PAD], vec![14, 15, PAD]]
        );
    }

    #[test]
    fn test_words_with_sentinels() {
        let config = TaggerConfig::default();
        let options = BatchOptions::new().with_sos(true).with_eos(true);
        let batch = batchify(&config, &[], &sample_words(), options).unwrap();

        assert_eq!(
            batch.words,
            vec![
                vec![SOS, 10, 11, 12, EOS],
                vec![SOS, 13, EOS, PAD, PAD],
                vec![SOS, 14, 15, EOS, PAD],
            ]
        );
    }

    #[test]
    fn test_minlen_extends_padding() {
        let config = TaggerConfig::default();
        let options = BatchOptions::new().with_minlen(5);
        let batch = batchify(&config, &[], &[vec![10, 11]], options).unwrap();

        assert_eq!(batch.words, vec![vec![10, 11, PAD, PAD, PAD]]);
    }

    #[test]
    fn test_chars_wrapped_and_padded() {
        let config = TaggerConfig::default();
        let batch = batchify(&config, &sample_chars(), &sample_words(), BatchOptions::new()).unwrap();

        let chars = batch.chars.unwrap();
        // xc_len = 3, so every word is 5 wide
        assert_eq!(chars[0][0], vec![SOS, 20, 21, EOS, PAD]);
        assert_eq!(chars[0][2], vec![SOS, 23, 24, 25, EOS]);
        assert_eq!(chars[1][0], vec![SOS, 26, EOS, PAD, PAD]);
        assert_eq!(chars[1][1], vec![PAD; 5]);
        assert_eq!(chars[1][2], vec![PAD; 5]);
    }

    #[test]
    fn test_chars_with_sentinels_line_up_with_words() {
        let config = TaggerConfig::default();
        let options = BatchOptions::new().with_sos(true).with_eos(true);
        let batch = batchify(&config, &sample_chars(), &sample_words(), options).unwrap();

        let chars = batch.chars.as_ref().unwrap();
        for (char_row, word_row) in chars.iter().zip(&batch.words) {
            assert_eq!(char_row.len(), word_row.len());
            assert_eq!(char_row[0], vec![PAD; 5]);
        }
        assert_eq!(chars[0][1], vec![SOS, 20, 21, EOS, PAD]);
        assert_eq!(chars[0][4], vec![PAD; 5]);
    }

    #[test]
    fn test_rectangular_invariant() {
        let config = TaggerConfig::default();
        let words: Vec<Vec<u32>> = (1..8).map(|n| (0..n).map(|i| 10 + i).collect()).collect();
        let chars: Vec<Vec<Vec<u32>>> = words
            .iter()
            .map(|seq| seq.iter().map(|&w| vec![30; (w % 4) as usize + 1]).collect())
            .collect();

        for sos in [false, true] {
            for eos in [false, true] {
                let options = BatchOptions::new().with_sos(sos).with_eos(eos).with_minlen(2);
                let batch = batchify(&config, &chars, &words, options).unwrap();

                let word_len = batch.word_len();
                assert!(batch.words.iter().all(|row| row.len() == word_len));

                let char_len = batch.char_len().unwrap();
                for row in batch.chars.as_ref().unwrap() {
                    assert_eq!(row.len(), word_len);
                    assert!(row.iter().all(|w| w.len() == char_len));
                }
            }
        }
    }

    #[test]
    fn test_unpad_recovers_sequences() {
        let config = TaggerConfig::default();
        let words = sample_words();

        for sos in [false, true] {
            for eos in [false, true] {
                let options = BatchOptions::new().with_sos(sos).with_eos(eos).with_minlen(4);
                let batch = batchify(&config, &[], &words, options).unwrap();
                assert_eq!(batch.unpad_words(&config), words);
            }
        }
    }

    #[test]
    fn test_word_mask() {
        let config = TaggerConfig::default();
        let batch = batchify(&config, &[], &sample_words(), BatchOptions::new()).unwrap();

        assert_eq!(
            batch.word_mask(&config),
            vec![vec![1, 1, 1], vec![1, 0, 0], vec![1, 1, 0]]
        );
    }

    #[test]
    fn test_empty_batch_rejected() {
        let config = TaggerConfig::default();
        let result = batchify(&config, &[], &[], BatchOptions::new());
        assert!(matches!(result, Err(SeqTagError::EmptyBatch)));
    }

    #[test]
    fn test_mismatched_char_batch_rejected() {
        let config = TaggerConfig::default();
        let chars = vec![vec![vec![20]]];
        let result = batchify(&config, &chars, &sample_words(), BatchOptions::new());
        assert!(matches!(result, Err(SeqTagError::BatchShape(_))));
    }

    #[test]
    fn test_too_many_char_words_rejected() {
        let config = TaggerConfig::default();
        let chars = vec![vec![vec![20], vec![21], vec![22]]];
        let result = batchify(&config, &chars, &[vec![10]], BatchOptions::new());
        assert!(matches!(result, Err(SeqTagError::BatchShape(_))));
    }

    #[test]
    fn test_custom_special_indices() {
        let config = TaggerConfig::default()
            .with_pad_idx(99)
            .with_sos_idx(97)
            .with_eos_idx(98);
        let options = BatchOptions::new().with_sos(true).with_eos(true);
        let batch = batchify(&config, &[], &[vec![5], vec![5, 6]], options).unwrap();

        assert_eq!(batch.words, vec![vec![97, 5, 98, 99], vec![97, 5, 6, 98]]);
    }

    #[test]
    fn test_to_tensors_shapes() {
        let config = TaggerConfig::default();
        let options = BatchOptions::new().with_sos(true);
        let batch = batchify(&config, &sample_chars(), &sample_words(), options).unwrap();

        let (chars, words) = batch.to_tensors(&Device::Cpu).unwrap();
        assert_eq!(words.dims(), &[3, 4]);
        assert_eq!(chars.unwrap().dims(), &[3, 4, 5]);
        assert_eq!(words.to_vec2::<u32>().unwrap(), batch.words);
    }

    #[test]
    fn test_to_tensors_keeps_chars_for_empty_rows() {
        let config = TaggerConfig::default();
        let batch = batchify(&config, &[vec![]], &[vec![]], BatchOptions::new()).unwrap();
        assert_eq!(batch.char_len(), Some(2));

        let (chars, words) = batch.to_tensors(&Device::Cpu).unwrap();
        assert_eq!(words.dims(), &[1, 0]);
        assert_eq!(chars.unwrap().dims(), &[1, 0, 2]);
    }

    #[test]
    fn test_char_len_follows_minlen_without_words() {
        let config = TaggerConfig::default();
        let options = BatchOptions::new().with_minlen(3).with_sos(true);
        let batch = batchify(&config, &[vec![], vec![]], &[vec![], vec![]], options).unwrap();

        assert_eq!(batch.char_len(), Some(5));
        let (chars, _) = batch.to_tensors(&Device::Cpu).unwrap();
        assert_eq!(chars.unwrap().dims(), &[2, 4, 5]);
        assert!(batch.chars.unwrap().iter().flatten().all(|w| w == &vec![PAD; 5]));
    }
}
