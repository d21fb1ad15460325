//! # Model Checkpoints
//!
//! A checkpoint is a safetensors file holding the model's variables plus
//! `epoch` and `loss` entries in the header metadata.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use safetensors::SafeTensors;
use tracing::info;

use crate::error::{Result, SeqTagError};

const EPOCH_KEY: &str = "epoch";
const LOSS_KEY: &str = "loss";

/// A loaded checkpoint.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub epoch: usize,
    pub loss: f64,
    /// Stored model variables by name
    pub state: HashMap<String, Tensor>,
}

/// Path a checkpoint for `epoch` is written to: `<path>.epoch<N>`.
pub fn checkpoint_path<P: AsRef<Path>>(path: P, epoch: usize) -> PathBuf {
    let mut name = path.as_ref().as_os_str().to_owned();
    name.push(format!(".epoch{epoch}"));
    PathBuf::from(name)
}

/// Log training progress and, if a model and a non-empty path are given,
/// save its variables.
///
/// Returns the written file, or `None` when only the progress line was logged.
pub fn save_checkpoint<P: AsRef<Path>>(
    path: P,
    model: Option<&VarMap>,
    epoch: usize,
    loss: f64,
    elapsed: f64,
) -> Result<Option<PathBuf>> {
    info!("epoch = {epoch}, loss = {loss:.6}, time = {elapsed:.6}");

    let Some(varmap) = model else {
        return Ok(None);
    };
    if path.as_ref().as_os_str().is_empty() {
        return Ok(None);
    }

    let target = checkpoint_path(path, epoch);
    info!("saving {}", target.display());

    let tensors: Vec<(String, Tensor)> = {
        let data = varmap
            .data()
            .lock()
            .map_err(|e| SeqTagError::Candle(format!("variable map poisoned: {e}")))?;
        data.iter()
            .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
            .collect()
    };

    let metadata = HashMap::from([
        (EPOCH_KEY.to_string(), epoch.to_string()),
        (LOSS_KEY.to_string(), loss.to_string()),
    ]);
    safetensors::serialize_to_file(tensors, &Some(metadata), &target)?;

    info!("saved model at epoch {epoch}");
    Ok(Some(target))
}

/// Load a checkpoint, copying its variables into `model` when given.
///
/// # Errors
///
/// Returns `SeqTagError::MissingField` if the file lacks `epoch`, `loss`,
/// any stored variables, or a variable that `model` expects.
pub fn load_checkpoint<P: AsRef<Path>>(
    path: P,
    model: Option<&mut VarMap>,
    device: &Device,
) -> Result<Checkpoint> {
    let path = path.as_ref();
    info!("loading {}", path.display());

    let buffer = std::fs::read(path)?;
    let (_, header) = SafeTensors::read_metadata(&buffer)?;
    let metadata = header.metadata().clone().unwrap_or_default();

    let missing = |field: &str| SeqTagError::MissingField {
        path: path.to_path_buf(),
        field: field.to_string(),
    };
    let field = |key: &str| metadata.get(key).ok_or_else(|| missing(key));

    let epoch_raw = field(EPOCH_KEY)?;
    let epoch = epoch_raw.parse::<usize>().map_err(|_| SeqTagError::InvalidField {
        field: EPOCH_KEY.into(),
        value: epoch_raw.clone(),
    })?;
    let loss_raw = field(LOSS_KEY)?;
    let loss = loss_raw.parse::<f64>().map_err(|_| SeqTagError::InvalidField {
        field: LOSS_KEY.into(),
        value: loss_raw.clone(),
    })?;

    let state = candle_core::safetensors::load_buffer(&buffer, device)?;
    if state.is_empty() {
        return Err(missing("state_dict"));
    }

    if let Some(varmap) = model {
        let data = varmap
            .data()
            .lock()
            .map_err(|e| SeqTagError::Candle(format!("variable map poisoned: {e}")))?;
        for (name, var) in data.iter() {
            let tensor = state.get(name).ok_or_else(|| missing(name.as_str()))?;
            var.set(tensor)?;
        }
    }

    info!("saved model: epoch = {epoch}, loss = {loss:.6}");
    Ok(Checkpoint { epoch, loss, state })
}
