use super::slug::album_slug;
use super::{Artist, Track};
use serde::Serialize;

/// Candidate album record produced by an album source.
///
/// Records are immutable once built; the reconciler only reads them.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct Album {
    title: String,
    artist: Option<Artist>,
    year: u32,
    image_url: Option<String>,
    tracks: Vec<Track>,
}

impl Album {
    pub fn new(title: impl Into<String>, artist: Option<Artist>, year: u32, tracks: Vec<Track>) -> Self {
        Self {
            title: title.into(),
            artist,
            year,
            image_url: None,
            tracks,
        }
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|url| !url.trim().is_empty());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> Option<&Artist> {
        self.artist.as_ref()
    }

    /// Release year, 0 when unknown.
    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn slug(&self) -> String {
        let artist_slug = self.artist.as_ref().map(Artist::slug).unwrap_or_default();
        album_slug(&artist_slug, &self.title, self.year)
    }

    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && self.artist.as_ref().is_some_and(Artist::is_valid)
    }
}
