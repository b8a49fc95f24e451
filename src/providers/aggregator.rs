use super::AlbumSource;
use crate::catalog::Album;
use crate::server::metrics;
use std::sync::Arc;
use tracing::{info, warn};

/// Fans a run out to every registered source and concatenates the results.
#[derive(Clone, Default)]
pub struct Aggregator {
    sources: Vec<Arc<dyn AlbumSource>>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn AlbumSource>>) -> Self {
        Self { sources }
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    /// Albums from all sources, in registration order. Invalid records are
    /// passed through untouched. A failing source contributes nothing.
    pub fn collect(&self) -> Vec<Album> {
        let mut albums = Vec::new();
        for source in &self.sources {
            match source.fetch_albums() {
                Ok(fetched) => {
                    info!("Source {} returned {} albums", source.id(), fetched.len());
                    metrics::record_source_fetch(source.id(), "ok", fetched.len());
                    albums.extend(fetched);
                }
                Err(err) => {
                    warn!("Source {} failed: {:#}", source.id(), err);
                    metrics::record_source_fetch(source.id(), "error", 0);
                }
            }
        }
        albums
    }
}
