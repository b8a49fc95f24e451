//! Album sources and their aggregation.

mod aggregator;
mod html_scraper;
pub mod parser;
mod static_source;

pub use aggregator::Aggregator;
pub use html_scraper::{HtmlScraperConfig, HtmlScraperSource};
pub use static_source::StaticAlbumSource;

use crate::catalog::Album;
use anyhow::Result;

/// One external origin of candidate albums.
///
/// Implementations are invoked from a blocking thread and may perform
/// blocking I/O.
pub trait AlbumSource: Send + Sync {
    /// Short identifier used in logs and metrics.
    fn id(&self) -> &str;

    /// Fetch the current candidate albums. Records may be incomplete; the
    /// caller filters invalid ones.
    fn fetch_albums(&self) -> Result<Vec<Album>>;
}
