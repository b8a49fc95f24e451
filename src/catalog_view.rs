//! Read-side views over the ingested catalog.

use crate::content_store::{validate_name, ContentSession, ContentStore, Entry};
use crate::ingestion::TRACKS_NODE;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArtistView {
    pub slug: String,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackView {
    pub title: String,
    pub duration: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumView {
    pub slug: String,
    pub title: String,
    pub artist_id: Option<String>,
    pub artist: Option<ArtistView>,
    pub year: Option<u64>,
    pub image_url: Option<String>,
    /// Omitted in brief mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<TrackView>>,
}

#[derive(Clone)]
pub struct CatalogReader {
    store: Arc<dyn ContentStore>,
    albums_root: String,
    artists_root: String,
    identity: String,
}

impl CatalogReader {
    pub fn new(
        store: Arc<dyn ContentStore>,
        albums_root: impl Into<String>,
        artists_root: impl Into<String>,
        identity: impl Into<String>,
    ) -> Self {
        Self {
            store,
            albums_root: albums_root.into(),
            artists_root: artists_root.into(),
            identity: identity.into(),
        }
    }

    /// Slugs of all albums, in creation order. Empty if the root is missing.
    pub fn list_albums(&self) -> Result<Vec<String>> {
        let session = self.store.open_session(&self.identity)?;
        let Some(root) = session.resolve(&self.albums_root)? else {
            return Ok(vec![]);
        };
        Ok(session
            .list_children(&root)?
            .into_iter()
            .map(|entry| entry.name().to_string())
            .collect())
    }

    pub fn get_album(&self, slug: &str, brief: bool) -> Result<Option<AlbumView>> {
        let session = self.store.open_session(&self.identity)?;
        let Some(entry) = child_of(session.as_ref(), &self.albums_root, slug)? else {
            return Ok(None);
        };

        let artist_id = entry.property_str("artistId").map(str::to_string);
        let artist = match &artist_id {
            Some(artist_id) => child_of(session.as_ref(), &self.artists_root, artist_id)?
                .map(|artist| artist_view(&artist)),
            None => None,
        };

        let tracks = if brief {
            None
        } else {
            let tracks = match session.get_child(&entry, TRACKS_NODE)? {
                Some(node) => session
                    .list_children(&node)?
                    .iter()
                    .map(|track| TrackView {
                        title: track.property_str("title").unwrap_or_default().to_string(),
                        duration: track.property_str("duration").unwrap_or_default().to_string(),
                    })
                    .collect(),
                None => vec![],
            };
            Some(tracks)
        };

        Ok(Some(AlbumView {
            slug: entry.name().to_string(),
            title: entry.property_str("title").unwrap_or_default().to_string(),
            artist_id,
            artist,
            year: entry.properties().get("year").and_then(|y| y.as_u64()),
            image_url: entry.property_str("imageUrl").map(str::to_string),
            tracks,
        }))
    }

    pub fn get_artist(&self, slug: &str) -> Result<Option<ArtistView>> {
        let session = self.store.open_session(&self.identity)?;
        Ok(child_of(session.as_ref(), &self.artists_root, slug)?.map(|entry| artist_view(&entry)))
    }
}

/// Child `name` of the collection at `root`; `None` for unknown or malformed
/// names.
fn child_of(session: &dyn ContentSession, root: &str, name: &str) -> Result<Option<Entry>> {
    if validate_name(name).is_err() {
        return Ok(None);
    }
    match session.resolve(root)? {
        Some(root) => session.get_child(&root, name),
        None => Ok(None),
    }
}

fn artist_view(entry: &Entry) -> ArtistView {
    ArtistView {
        slug: entry.name().to_string(),
        name: entry.property_str("name").unwrap_or_default().to_string(),
        description: entry.property_str("description").unwrap_or_default().to_string(),
    }
}
