//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the fixture site changes, update only this file.

// ============================================================================
// Content Store Layout
// ============================================================================

pub const ALBUMS_ROOT: &str = "/content/catalog/albums";

pub const ARTISTS_ROOT: &str = "/content/catalog/artists";

pub const SERVICE_IDENTITY: &str = "album-ingest-tests";

// ============================================================================
// Fixture Site Content
// ============================================================================

/// Artist of both fixture albums
pub const ARTIST_NAME: &str = "Daft Punk";

pub const ARTIST_SLUG: &str = "daft-punk";

/// First album on the listing page
pub const ALBUM_1_TITLE: &str = "Discovery";

pub const ALBUM_1_SLUG: &str = "daft-punk-discovery-2001";

pub const ALBUM_1_YEAR: u64 = 2001;

pub const ALBUM_1_IMAGE: &str = "https://img.example.com/discovery.jpg";

pub const ALBUM_1_TRACKS: [&str; 2] = ["One More Time", "Aerodynamic"];

/// Last album on the listing page, without a cover
pub const ALBUM_2_TITLE: &str = "Homework";

pub const ALBUM_2_SLUG: &str = "daft-punk-homework-1997";

pub const ALBUM_2_TRACKS: [&str; 1] = ["Da Funk"];

/// Title of the linked page that has no artist name
pub const INCOMPLETE_ALBUM_TITLE: &str = "Untitled Bootleg";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for a server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Polling interval when waiting for server readiness (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Default timeout for HTTP requests in tests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout of the scraper's requests to the fixture site (milliseconds)
pub const SCRAPER_TIMEOUT_MS: u64 = 5000;
