
use ndarray_npy::{ReadNpyError, WriteNpyError};
use thiserror::Error;

/// Every failure surfaced by the crate. Nothing is recovered internally,
/// errors travel up to the caller unmodified.
#[derive(Debug, Error)]
pub enum Error {

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read npy file: {0}")]
    ReadNpy(#[from] ReadNpyError),

    #[error("could not write npy file: {0}")]
    WriteNpy(#[from] WriteNpyError),

    #[error("could not reduce array: {0}")]
    MinMax(#[from] ndarray_stats::errors::MinMaxError),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The vocabulary ended up empty, e.g. an empty corpus or a `min_count`
    /// that filters every token away.
    #[error("vocabulary is empty, cannot {0}")]
    EmptyVocabulary(&'static str),

    #[error("token: {0} is not in the vocabulary")]
    KeyNotFound(String),

    #[error("corpus is empty, cannot {0}")]
    EmptyCorpus(&'static str),

    #[error("{0} must be called before {1}")]
    NotBuilt(&'static str, &'static str),

    #[error("could not build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
