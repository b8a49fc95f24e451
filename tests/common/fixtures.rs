//! Fixture web site for end-to-end tests
//!
//! Serves a listing page and album detail pages shaped like the scraped site,
//! so the real scraper source can run against it.

use super::constants::*;
use axum::{extract::Path, http::StatusCode, response::Html, routing::get, Router};
use tokio::net::TcpListener;

/// Href patterns the scraper is configured with against the fixture site
pub const ALBUM_LINK_PATTERN: &str = r"/artist-albums/\d+/[\w-]+$";
pub const TRACK_LINK_PATTERN: &str = r"/download-mp3/\d+/[\w-]+$";

/// Fixture site running in the background until dropped
pub struct FixtureSite {
    pub base_url: String,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FixtureSite {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fixture site");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let app = Router::new()
            .route("/artist-albums", get(listing_page))
            .route("/artist-albums/{id}/{slug}", get(album_page));

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fixture site failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn listing_url(&self) -> String {
        format!("{}/artist-albums", self.base_url)
    }
}

impl Drop for FixtureSite {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// Links are relative on purpose; the scraper resolves them against the
// listing url. Page 4 does not exist.
async fn listing_page() -> Html<&'static str> {
    Html(
        r#"<html><body>
            <nav><a href="/about">About</a></nav>
            <div class="albums">
              <a href="/artist-albums/1/discovery">Discovery</a>
              <a href="/artist-albums/3/untitled-bootleg">Untitled Bootleg</a>
              <a href="/artist-albums/4/gone">Gone</a>
              <a href="/artist-albums/2/homework">Homework</a>
            </div>
        </body></html>"#,
    )
}

async fn album_page(Path((id, _slug)): Path<(u32, String)>) -> Result<Html<String>, StatusCode> {
    match id {
        1 => Ok(Html(detail_page(
            ALBUM_1_TITLE,
            Some(ARTIST_NAME),
            ALBUM_1_YEAR,
            Some(ALBUM_1_IMAGE),
            &ALBUM_1_TRACKS,
        ))),
        2 => Ok(Html(detail_page(
            ALBUM_2_TITLE,
            Some(ARTIST_NAME),
            1997,
            None,
            &ALBUM_2_TRACKS,
        ))),
        3 => Ok(Html(detail_page(
            INCOMPLETE_ALBUM_TITLE,
            None,
            2010,
            None,
            &["Hidden Track"],
        ))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

fn detail_page(
    title: &str,
    artist: Option<&str>,
    year: u64,
    image: Option<&str>,
    tracks: &[&str],
) -> String {
    let artist = artist
        .map(|name| {
            let spans: Vec<String> = name
                .split_whitespace()
                .map(|part| format!("<span>{}</span>", part))
                .collect();
            format!(r#"<p id="artistname">{}</p>"#, spans.join(" "))
        })
        .unwrap_or_default();
    let image = image
        .map(|src| format!(r#"<img alt="Download {}" src="{}">"#, title, src))
        .unwrap_or_default();
    let tracks: String = tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            format!(
                r#"<li><h3>{}</h3><a href="/download-mp3/{}/track-{}">Download</a></li>"#,
                track,
                index + 1,
                index + 1
            )
        })
        .collect();

    format!(
        r#"<html><body>
            <div class="album-info">
              <p><b>Title:</b> <span>{title}</span></p>
              {artist}
              <p><b>Year:</b> <a href="/year/{year}">{year}</a></p>
              {image}
            </div>
            <ul>{tracks}</ul>
        </body></html>"#
    )
}
