//! HTTP client for end-to-end tests
//!
//! This module wraps reqwest and provides methods for all server endpoints.
//!
//! When API routes change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // Ingestion Trigger
    // ========================================================================

    /// POST /services/albums/retrieve
    pub async fn retrieve_albums(&self) -> Response {
        self.client
            .post(format!("{}/services/albums/retrieve", self.base_url))
            .send()
            .await
            .expect("Retrieve request failed")
    }

    /// GET /services/albums/retrieve (rejected by the server)
    pub async fn retrieve_albums_with_get(&self) -> Response {
        self.client
            .get(format!("{}/services/albums/retrieve", self.base_url))
            .send()
            .await
            .expect("Retrieve request failed")
    }

    // ========================================================================
    // Catalog Views
    // ========================================================================

    /// GET /v1/content/albums
    pub async fn list_albums(&self) -> Response {
        self.get("/v1/content/albums").await
    }

    /// GET /v1/content/album/{slug}
    pub async fn get_album(&self, slug: &str) -> Response {
        self.get(&format!("/v1/content/album/{}", slug)).await
    }

    /// GET /v1/content/album/{slug}?brief=true
    pub async fn get_album_brief(&self, slug: &str) -> Response {
        self.get(&format!("/v1/content/album/{}?brief=true", slug))
            .await
    }

    /// GET /v1/content/artist/{slug}
    pub async fn get_artist(&self, slug: &str) -> Response {
        self.get(&format!("/v1/content/artist/{}", slug)).await
    }

    // ========================================================================
    // Background Jobs
    // ========================================================================

    /// GET /v1/jobs
    pub async fn list_jobs(&self) -> Response {
        self.get("/v1/jobs").await
    }

    /// GET /v1/jobs/{id}
    pub async fn get_job(&self, job_id: &str) -> Response {
        self.get(&format!("/v1/jobs/{}", job_id)).await
    }

    /// GET /v1/jobs/{id}/history
    pub async fn get_job_history(&self, job_id: &str) -> Response {
        self.get(&format!("/v1/jobs/{}/history", job_id)).await
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }
}
