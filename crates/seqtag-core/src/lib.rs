//! # Seqtag Core
//!
//! Utilities around a neural sequence tagger: tokenization, vocabulary
//! files, batch padding, checkpoint I/O, IOB-to-text reconstruction,
//! log-sum-exp and F1 scoring.
//!
//! ## Quick Start
//!
//! ```rust
//! use seqtag_core::{batchify, iob_to_txt, BatchOptions, TaggerConfig};
//!
//! let config = TaggerConfig::default();
//! let batch = batchify(
//!     &config,
//!     &[],
//!     &[vec![4, 5], vec![6]],
//!     BatchOptions::new().with_eos(true),
//! )
//! .unwrap();
//! assert_eq!(batch.words, vec![vec![4, 5, 2], vec![6, 2, 0]]);
//!
//! let text = iob_to_txt(&config, "Seoul is big", &["B-LOC", "B-O", "I-O"]).unwrap();
//! assert_eq!(text, "Seoul\nis big");
//! ```
pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod iob;
pub mod math;
pub mod text;
pub mod vocab;

// Re-export primary API
pub use batch::{Batch, BatchOptions, batchify};
pub use checkpoint::{Checkpoint, load_checkpoint, save_checkpoint};
pub use config::{TaggerConfig, Unit};
pub use error::{Result, SeqTagError};
pub use iob::{Chunk, IobDecoder, IobTag, chunks, iob_to_txt};
pub use math::{Scores, f1, log_sum_exp, log_sum_exp_slice};
pub use text::{normalize, tokenize};
pub use vocab::{Vocab, load_idx_to_tkn, load_tkn_to_idx, save_data, save_tkn_to_idx};
