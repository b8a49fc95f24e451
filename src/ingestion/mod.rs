//! Album ingestion: turning aggregated source records into catalog entries.

mod error;
mod pipeline;
mod reconciler;

pub use error::IngestError;
pub use pipeline::{IngestionPipeline, RunTrigger};
pub use reconciler::{AlbumReconciler, ReconcileReport, TRACKS_NODE};
