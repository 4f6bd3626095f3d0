//! Application-wide error types.
//!
//! [`AppError`] ends the process; [`InteractionError`] ends a single console
//! interaction and is printed inline while the loop keeps running.

use thiserror::Error;

use crate::llm::ProviderError;

#[cfg(feature = "section-data")]
use crate::dataset::DatasetError;
#[cfg(feature = "section-docs")]
use crate::extract::ParseError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of one user interaction with a section.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("nothing to send: input is empty")]
    EmptyInput,

    #[cfg(feature = "section-docs")]
    #[error("could not read document: {0}")]
    ParseFailure(#[from] ParseError),

    #[error("model request failed: {0}")]
    ModelRequestFailure(#[from] ProviderError),

    #[error("no document loaded; use /upload <file.pdf|file.docx> first")]
    NoDocument,

    #[error("no dataset loaded; use /upload <file.csv|file.xlsx|file.txt> first")]
    NoDataset,

    #[cfg(feature = "section-data")]
    #[error("{0}")]
    Dataset(#[from] DatasetError),

    #[error("cannot upload '{0}': expected .pdf/.docx (docs) or .csv/.xlsx/.txt (data)")]
    UnsupportedUpload(String),

    #[error("the {0} section is not enabled in this build")]
    SectionDisabled(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
