use super::AlbumSource;
use crate::catalog::{Album, Artist};
use anyhow::Result;

/// Serves a fixed list of albums. Useful as a smoke-test source.
pub struct StaticAlbumSource {
    albums: Vec<Album>,
}

impl StaticAlbumSource {
    pub fn new(albums: Vec<Album>) -> Self {
        Self { albums }
    }

    pub fn placeholder() -> Self {
        Self::new(vec![Album::new(
            "Non-existing album",
            Some(Artist::new("No one", "")),
            2000,
            vec![],
        )])
    }
}

impl AlbumSource for StaticAlbumSource {
    fn id(&self) -> &str {
        "static"
    }

    fn fetch_albums(&self) -> Result<Vec<Album>> {
        Ok(self.albums.clone())
    }
}
