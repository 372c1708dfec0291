use thiserror::Error;

/// Faults that abort a single extraction request.
///
/// Missing labels, scores or handles are not errors; they surface as empty
/// fields of the outcome.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Text recognition failed")]
    Recognition(#[source] anyhow::Error),

    #[error("Recognition worker failed")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Admission gate is closed")]
    GateClosed,
}

pub type Result<T> = std::result::Result<T, ExtractError>;
