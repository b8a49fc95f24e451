//! Album ingestion server library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod background_jobs;
pub mod catalog;
pub mod catalog_view;
pub mod config;
pub mod content_store;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog::{Album, Artist, Track};
pub use content_store::{ContentSession, ContentStore, MemoryContentStore, SqliteContentStore};
pub use ingestion::{IngestError, IngestionPipeline, RunTrigger};
pub use providers::{AlbumSource, Aggregator};
pub use server::{run_server, RequestsLoggingLevel};
