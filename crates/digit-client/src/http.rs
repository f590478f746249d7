//! Shared HTTP plumbing for the REST operations.
//!
//! One place attaches the session cookie, applies the endpoint path to the
//! base URL, and turns non-success statuses into the error taxonomy —
//! notably HTTP 503, the platform's "synchronization in progress" signal,
//! which becomes [`ApiError::Busy`] so the retry wrapper can absorb it.

use bytes::Bytes;
use reqwest::header::COOKIE;
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

use digit_auth::SessionCookie;

use crate::errors::ApiError;

/// A reqwest client pinned to one platform base URL.
#[derive(Clone, Debug)]
pub(crate) struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// `base_url` must already carry a trailing slash.
    pub(crate) fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the JSON body.
    pub(crate) async fn get_json(
        &self,
        cookie: &SessionCookie,
        path: &str,
    ) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .header(COOKIE, cookie.header_value())
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// GET `path` and return the raw body bytes.
    pub(crate) async fn get_bytes(
        &self,
        cookie: &SessionCookie,
        path: &str,
    ) -> Result<Bytes, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .header(COOKIE, cookie.header_value())
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?)
    }

    /// POST `body` as JSON to `path`, discarding the response body.
    pub(crate) async fn post(
        &self,
        cookie: &SessionCookie,
        path: &str,
        body: &impl Serialize,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .header(COOKIE, cookie.header_value())
            .json(body)
            .send()
            .await?;
        let _ = check_status(response).await?;
        Ok(())
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    pub(crate) async fn post_json(
        &self,
        cookie: &SessionCookie,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Value, ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .header(COOKIE, cookie.header_value())
            .json(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Map non-success statuses into the error taxonomy.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        Err(ApiError::Busy { message })
    } else {
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
