use super::parser::{list_album_links, parse_album};
use super::AlbumSource;
use crate::catalog::Album;
use anyhow::{bail, Context, Result};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Immutable settings of one scraped site.
#[derive(Clone, Debug)]
pub struct HtmlScraperConfig {
    pub listing_url: String,
    pub album_link_pattern: Regex,
    pub track_link_pattern: Regex,
    pub timeout: Duration,
    pub user_agent: String,
}

/// Scrapes a listing page for album links, then every linked detail page
/// for the album itself.
pub struct HtmlScraperSource {
    config: HtmlScraperConfig,
}

impl HtmlScraperSource {
    pub fn new(config: HtmlScraperConfig) -> Self {
        Self { config }
    }

    // The blocking client owns a runtime of its own and must not be built or
    // dropped on an async worker, so it lives only for one fetch.
    fn build_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .user_agent(&self.config.user_agent)
            .timeout(self.config.timeout)
            .build()?)
    }

    fn get_page(client: &Client, url: &Url) -> Result<String> {
        let response = client.get(url.clone()).send()?;
        if !response.status().is_success() {
            bail!("GET {} failed with status {}", url, response.status());
        }
        Ok(response.text()?)
    }

    fn fetch_album(&self, client: &Client, url: &Url) -> Option<Album> {
        let html = match Self::get_page(client, url) {
            Ok(html) => html,
            Err(err) => {
                warn!("Could not fetch album page {}: {:#}", url, err);
                return None;
            }
        };
        let album = parse_album(&html, &self.config.track_link_pattern);
        if album.is_none() {
            debug!("No album found at {}", url);
        }
        album
    }
}

impl AlbumSource for HtmlScraperSource {
    fn id(&self) -> &str {
        "html-scraper"
    }

    fn fetch_albums(&self) -> Result<Vec<Album>> {
        let listing_url = Url::parse(&self.config.listing_url)
            .with_context(|| format!("Invalid listing url {}", self.config.listing_url))?;
        let client = self.build_client()?;

        let listing = Self::get_page(&client, &listing_url).context("Failed to fetch album listing")?;
        let links = list_album_links(&listing, &self.config.album_link_pattern);
        info!("Found {} album links at {}", links.len(), listing_url);

        let albums = links
            .iter()
            .filter_map(|link| match listing_url.join(link) {
                Ok(url) => Some(url),
                Err(err) => {
                    warn!("Skipping malformed album link {}: {}", link, err);
                    None
                }
            })
            .filter_map(|url| self.fetch_album(&client, &url))
            .collect();
        Ok(albums)
    }
}
