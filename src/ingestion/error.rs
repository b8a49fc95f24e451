use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// A configured root collection is absent; nothing was written.
    #[error("Missing content root: {0}")]
    MissingRoot(String),

    #[error("Content store error: {0:#}")]
    Store(#[from] anyhow::Error),

    #[error("An ingestion run is already in progress")]
    RunInProgress,
}
