//! Seqtag command-line tool
//!
//! Exposes the seqtag-core utilities over files and stdin.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candle_core::Device;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use seqtag_core::{
    Batch, BatchOptions, IobDecoder, Scores, TaggerConfig, Unit, Vocab, batchify, chunks,
    load_checkpoint, tokenize,
};

/// CLI arguments
#[derive(Parser)]
#[command(name = "seqtag")]
#[command(about = "Tokenize, pad and decode data for sequence taggers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON tagger configuration
    #[arg(short, long, env = "SEQTAG_CONFIG")]
    config: Option<PathBuf>,

    /// Override the tokenization unit (char or word)
    #[arg(short, long)]
    unit: Option<Unit>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize stdin lines
    Tokenize {
        /// Skip whitespace and case normalization
        #[arg(long)]
        raw: bool,
    },
    /// Rebuild text from `text<TAB>tags` lines on stdin
    Iob,
    /// Span precision/recall/F1 from `gold<TAB>predicted` tag lines on stdin
    Score,
    /// Build a vocabulary from a tokenized data file
    Vocab {
        /// Data file, one space-joined sequence per line
        data: PathBuf,
        /// Output vocabulary file
        out: PathBuf,
    },
    /// Encode and pad a tokenized data file, printing the batch as JSON
    Pad {
        /// Data file, one space-joined sequence per line
        data: PathBuf,
        /// Word vocabulary file
        #[arg(long)]
        vocab: PathBuf,
        /// Character vocabulary file; enables character padding
        #[arg(long)]
        char_vocab: Option<PathBuf>,
        #[arg(long)]
        sos: bool,
        #[arg(long)]
        eos: bool,
        #[arg(long, default_value_t = 0)]
        minlen: usize,
    },
    /// Show the epoch and loss stored in a checkpoint
    Checkpoint {
        file: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct ScoreOutput {
    correct: usize,
    predicted: usize,
    gold: usize,
    precision: f64,
    recall: f64,
    f1: f64,
}

impl From<&Scores> for ScoreOutput {
    fn from(scores: &Scores) -> Self {
        Self {
            correct: scores.correct,
            predicted: scores.predicted,
            gold: scores.gold,
            precision: scores.precision(),
            recall: scores.recall(),
            f1: scores.f1(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckpointOutput {
    file: PathBuf,
    epoch: usize,
    loss: f64,
    tensors: usize,
}

fn load_config(cli: &Cli) -> Result<TaggerConfig> {
    let config = match &cli.config {
        Some(path) => TaggerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TaggerConfig::default(),
    };
    Ok(match cli.unit {
        Some(unit) => config.with_unit(unit),
        None => config,
    })
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file).lines().collect::<io::Result<_>>()?)
}

fn run_vocab(config: &TaggerConfig, data: &Path, out: &Path) -> Result<()> {
    let mut vocab = Vocab::with_specials(config);
    for line in read_lines(data)? {
        for token in line.split(' ').filter(|t| !t.is_empty()) {
            vocab.insert(token);
        }
    }
    vocab
        .save(out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!("wrote {} tokens to {}", vocab.len(), out.display());
    Ok(())
}

fn run_pad(
    config: &TaggerConfig,
    data: &Path,
    vocab_path: &Path,
    char_vocab_path: Option<&Path>,
    options: BatchOptions,
) -> Result<Batch> {
    let vocab = Vocab::load(vocab_path, config)?;
    let char_vocab = char_vocab_path
        .map(|path| Vocab::load(path, config))
        .transpose()?;

    let lines = read_lines(data)?;
    let sequences: Vec<Vec<&str>> = lines
        .iter()
        .map(|line| line.split(' ').filter(|t| !t.is_empty()).collect())
        .collect();

    let xw: Vec<Vec<u32>> = sequences.iter().map(|seq| vocab.encode(seq)).collect();
    let xc: Vec<Vec<Vec<u32>>> = match &char_vocab {
        Some(chars) => sequences
            .iter()
            .map(|seq| {
                seq.iter()
                    .map(|word| {
                        let letters: Vec<String> = word.chars().map(String::from).collect();
                        chars.encode(&letters)
                    })
                    .collect()
            })
            .collect(),
        None => Vec::new(),
    };

    let batch = batchify(config, &xc, &xw, options)?;
    info!("padded {} sequences to length {}", batch.batch_size(), batch.word_len());
    Ok(batch)
}

/// Decode `text<TAB>tags` lines; lines without a tab are skipped.
fn decode_lines<R: BufRead>(decoder: &IobDecoder, reader: R) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let Some((text, tags)) = line.split_once('\t') else {
            continue;
        };
        let tags: Vec<&str> = tags.split_whitespace().collect();
        out.push(decoder.iob_to_txt(text, &tags));
    }
    Ok(out)
}

/// Accumulate span counts over `gold<TAB>predicted` tag lines.
fn score_lines<R: BufRead>(reader: R) -> Result<Scores> {
    let mut scores = Scores::new();
    for line in reader.lines() {
        let line = line?;
        let Some((gold, pred)) = line.split_once('\t') else {
            continue;
        };
        let gold = chunks(&gold.split_whitespace().collect::<Vec<_>>());
        let pred = chunks(&pred.split_whitespace().collect::<Vec<_>>());
        let correct = pred.iter().filter(|c| gold.contains(c)).count();
        scores.add(correct, pred.len(), gold.len());
    }
    Ok(scores)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let stdin = io::stdin();

    match &cli.command {
        Commands::Tokenize { raw } => {
            for line in stdin.lock().lines() {
                let line = line?;
                println!("{}", tokenize(&config, &line, !raw).join(" "));
            }
        }
        Commands::Iob => {
            let decoder = IobDecoder::new(config)?;
            for text in decode_lines(&decoder, stdin.lock())? {
                println!("{text}");
            }
        }
        Commands::Score => {
            let scores = score_lines(stdin.lock())?;
            println!("{}", serde_json::to_string_pretty(&ScoreOutput::from(&scores))?);
        }
        Commands::Vocab { data, out } => run_vocab(&config, data, out)?,
        Commands::Pad {
            data,
            vocab,
            char_vocab,
            sos,
            eos,
            minlen,
        } => {
            let options = BatchOptions::new()
                .with_sos(*sos)
                .with_eos(*eos)
                .with_minlen(*minlen);
            let batch = run_pad(&config, data, vocab, char_vocab.as_deref(), options)?;
            println!("{}", serde_json::to_string_pretty(&batch)?);
        }
        Commands::Checkpoint { file } => {
            let checkpoint = load_checkpoint(file, None, &Device::Cpu)
                .with_context(|| format!("Failed to load checkpoint {}", file.display()))?;
            let output = CheckpointOutput {
                file: file.clone(),
                epoch: checkpoint.epoch,
                loss: checkpoint.loss,
                tensors: checkpoint.state.len(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
