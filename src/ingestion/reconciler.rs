use super::IngestError;
use crate::catalog::{Album, Artist};
use crate::content_store::{ContentSession, Entry, Properties};
use crate::server::metrics;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

pub const TRACKS_NODE: &str = "tracks";

/// Outcome counters of one reconcile pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub artists_created: usize,
}

/// Materializes candidate albums under the albums root, and their artists
/// under the artists root, keyed by slug.
#[derive(Clone, Debug)]
pub struct AlbumReconciler {
    albums_root: String,
    artists_root: String,
}

impl AlbumReconciler {
    pub fn new(albums_root: impl Into<String>, artists_root: impl Into<String>) -> Self {
        Self {
            albums_root: albums_root.into(),
            artists_root: artists_root.into(),
        }
    }

    pub fn albums_root(&self) -> &str {
        &self.albums_root
    }

    pub fn artists_root(&self) -> &str {
        &self.artists_root
    }

    /// Create or update one entry per valid album, committing after each.
    ///
    /// The first store failure aborts the batch: albums already processed
    /// stay committed, the failing one is discarded with the session.
    pub fn reconcile(
        &self,
        session: &mut dyn ContentSession,
        albums: &[Album],
    ) -> Result<ReconcileReport, IngestError> {
        let albums_root = session
            .resolve(&self.albums_root)?
            .ok_or_else(|| IngestError::MissingRoot(self.albums_root.clone()))?;
        let artists_root = session
            .resolve(&self.artists_root)?
            .ok_or_else(|| IngestError::MissingRoot(self.artists_root.clone()))?;

        let mut report = ReconcileReport::default();
        for album in albums {
            if !album.is_valid() {
                debug!("Skipping invalid album {:?}", album);
                report.skipped += 1;
                metrics::record_album_outcome("skipped");
                continue;
            }

            let slug = album.slug();
            match session.get_child(&albums_root, &slug)? {
                Some(existing) => {
                    session.update_properties(&existing, album_properties(album))?;
                    debug!("Updated album {}", existing.path());
                    report.updated += 1;
                    metrics::record_album_outcome("updated");
                }
                None => {
                    let created = self.create_album(session, &albums_root, &slug, album)?;
                    info!("Created album {}", created.path());
                    report.created += 1;
                    metrics::record_album_outcome("created");

                    if let Some(artist) = album.artist() {
                        if ensure_artist(session, &artists_root, artist)? {
                            report.artists_created += 1;
                            metrics::record_artist_created();
                        }
                    }
                }
            }
            session.commit()?;
        }

        Ok(report)
    }

    fn create_album(
        &self,
        session: &mut dyn ContentSession,
        albums_root: &Entry,
        slug: &str,
        album: &Album,
    ) -> anyhow::Result<Entry> {
        let entry = session.create(albums_root, slug, album_properties(album))?;
        if album.tracks().is_empty() {
            return Ok(entry);
        }

        let tracks_node = session.create(&entry, TRACKS_NODE, object(json!({ "type": "collection" })))?;
        for (index, track) in album.tracks().iter().enumerate() {
            session.create(
                &tracks_node,
                &format!("track_{}", index + 1),
                object(json!({
                    "type": "track",
                    "title": track.title(),
                    "duration": track.duration(),
                })),
            )?;
        }
        Ok(entry)
    }
}

/// Create the artist entry unless one already exists. Returns whether it was
/// created.
fn ensure_artist(
    session: &mut dyn ContentSession,
    artists_root: &Entry,
    artist: &Artist,
) -> anyhow::Result<bool> {
    let slug = artist.slug();
    if session.get_child(artists_root, &slug)?.is_some() {
        return Ok(false);
    }
    let created = session.create(
        artists_root,
        &slug,
        object(json!({
            "type": "artist",
            "name": artist.name(),
            "description": artist.description(),
        })),
    )?;
    info!("Created artist {}", created.path());
    Ok(true)
}

fn album_properties(album: &Album) -> Properties {
    let mut properties = Properties::new();
    properties.insert("type".to_string(), json!("album"));
    properties.insert("title".to_string(), json!(album.title()));
    if let Some(artist) = album.artist() {
        properties.insert("artistId".to_string(), json!(artist.slug()));
    }
    if album.year() > 0 {
        properties.insert("year".to_string(), json!(album.year()));
    }
    if let Some(image_url) = album.image_url() {
        properties.insert("imageUrl".to_string(), json!(image_url));
    }
    properties
}

fn object(value: serde_json::Value) -> Properties {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Properties::new(),
    }
}
