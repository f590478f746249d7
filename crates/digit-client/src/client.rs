//! The client facade.
//!
//! [`DigitClient`] wires the three resilience pieces together: every REST
//! method fetches a server-accepted cookie from the session manager and runs
//! inside the busy-retry wrapper, so callers see either a result or one
//! terminal error; the realtime methods delegate to the socket manager,
//! which draws cookies from the same session manager at connect time.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use digit_auth::{CookieSource, SessionManager};
use digit_core::{EventListener, RetryPolicy, Topic, retry_on_busy};
use digit_realtime::{ConnectionStatus, RegisteredCallback, SocketManager};

use crate::auth_flow::RestAuthenticator;
use crate::config::DigitConfig;
use crate::errors::ApiError;
use crate::http::HttpClient;
use crate::rest::{NewObject, RestApi, SearchQuery};

/// One authenticated connection to one Digit platform instance.
///
/// Construction performs no I/O: the first REST call logs in, the first
/// `watch` opens the socket.
#[derive(Debug)]
pub struct DigitClient {
    rest: RestApi,
    session: Arc<SessionManager<RestAuthenticator>>,
    socket: SocketManager,
    retry: RetryPolicy,
}

impl DigitClient {
    /// Build a client from `config`.
    ///
    /// Fails synchronously on missing credentials or base URL, and on HTTP
    /// client construction problems.
    pub fn new(config: DigitConfig) -> Result<Self, ApiError> {
        if config.base_url.trim().is_empty() {
            return Err(ApiError::invalid_input("baseUrl must not be empty"));
        }
        if config.username.is_empty() {
            return Err(ApiError::invalid_input("username must not be empty"));
        }
        if config.password.is_empty() {
            return Err(ApiError::invalid_input("password must not be empty"));
        }

        let base_url = config.normalized_base_url();
        let ws_url = config.ws_url();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        let rest = RestApi::new(HttpClient::new(http.clone(), base_url.clone()));
        let authenticator =
            RestAuthenticator::new(http, base_url, config.username, config.password);
        let session = Arc::new(SessionManager::new(authenticator, config.probe));
        let socket = SocketManager::spawn(
            ws_url,
            Arc::clone(&session) as Arc<dyn CookieSource>,
            config.realtime,
        );

        Ok(Self {
            rest,
            session,
            socket,
            retry: config.retry,
        })
    }

    /// The session manager (e.g. to force a refresh after an external 401).
    pub fn session(&self) -> &Arc<SessionManager<RestAuthenticator>> {
        &self.session
    }

    /// The socket manager handle.
    pub fn socket(&self) -> &SocketManager {
        &self.socket
    }

    // -- objects --

    /// Create an object; returns its client-generated id.
    pub async fn create_object(&self, new_object: &NewObject) -> Result<String, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.create_object(&cookie, new_object).await
        })
        .await
    }

    /// Overwrite the attributes of an existing object.
    pub async fn update_object(
        &self,
        object_id: &str,
        payload: &NewObject,
    ) -> Result<(), ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.update_object(&cookie, object_id, payload).await
        })
        .await
    }

    /// Search objects.
    pub async fn get_objects(&self, query: &SearchQuery) -> Result<Value, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_objects(&cookie, query).await
        })
        .await
    }

    /// Delete the given objects.
    pub async fn delete_objects(&self, object_ids: &[String]) -> Result<(), ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.delete_objects(&cookie, object_ids).await
        })
        .await
    }

    // -- metadata --

    /// List the available forms.
    pub async fn get_forms(&self) -> Result<Vec<Value>, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_forms(&cookie).await
        })
        .await
    }

    /// Fetch one form definition.
    pub async fn get_form_data(&self, form_object_id: &str) -> Result<Value, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_form_data(&cookie, form_object_id).await
        })
        .await
    }

    /// List the available visualizations.
    pub async fn get_vises(&self) -> Result<Value, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_vises(&cookie).await
        })
        .await
    }

    /// Fetch one visualization definition.
    pub async fn get_vis_data(&self, vis_object_id: &str) -> Result<Value, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_vis_data(&cookie, vis_object_id).await
        })
        .await
    }

    /// List the available workflows.
    pub async fn get_workflows(&self) -> Result<Vec<Value>, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_workflows(&cookie).await
        })
        .await
    }

    /// Fetch the entity schema.
    pub async fn get_uml_schema(&self) -> Result<Value, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_uml_schema(&cookie).await
        })
        .await
    }

    // -- resources --

    /// Download the contents of a stored file.
    pub async fn get_file(&self, file_object_id: &str) -> Result<Bytes, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_file(&cookie, file_object_id).await
        })
        .await
    }

    /// List the platform dictionaries.
    pub async fn get_dictionaries(&self) -> Result<Value, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_dictionaries(&cookie).await
        })
        .await
    }

    /// Fetch one dictionary with its entries.
    pub async fn get_dictionary(&self, dictionary_id: &str) -> Result<Value, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_dictionary(&cookie, dictionary_id).await
        })
        .await
    }

    /// Fetch one working calendar.
    pub async fn get_calendar(&self, calendar_object_id: &str) -> Result<Value, ApiError> {
        retry_on_busy(&self.retry, move || async move {
            let cookie = self.session.active().await?;
            self.rest.get_calendar(&cookie, calendar_object_id).await
        })
        .await
    }

    // -- realtime --

    /// Register `listener` for `topic`, opening the socket if needed.
    pub async fn watch(
        &self,
        topic: Topic,
        listener: Arc<dyn EventListener>,
    ) -> Result<(), ApiError> {
        Ok(self.socket.subscribe(topic, listener).await?)
    }

    /// Like [`DigitClient::watch`], with a one-shot callback fired when the
    /// server acknowledges the registration.
    pub async fn watch_with_ack(
        &self,
        topic: Topic,
        listener: Arc<dyn EventListener>,
        on_registered: RegisteredCallback,
    ) -> Result<(), ApiError> {
        Ok(self
            .socket
            .subscribe_with_ack(topic, listener, on_registered)
            .await?)
    }

    /// Remove the subscription for `topic` and all its listeners.
    pub async fn unwatch(&self, topic: &Topic) -> Result<(), ApiError> {
        Ok(self.socket.unsubscribe(topic).await?)
    }

    /// Current state of the realtime connection.
    pub async fn connection_status(&self) -> Result<ConnectionStatus, ApiError> {
        Ok(self.socket.status().await?)
    }

    /// Tear down the realtime channel. REST methods keep working; `watch`
    /// does not.
    pub async fn disconnect(&self) -> Result<(), ApiError> {
        Ok(self.socket.disconnect().await?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn new_rejects_missing_base_url() {
        let err = DigitClient::new(DigitConfig::new("", "u", "p")).unwrap_err();
        assert_matches!(err, ApiError::InvalidInput { .. });
    }

    #[tokio::test]
    async fn new_rejects_missing_credentials() {
        let err = DigitClient::new(DigitConfig::new("http://d.example/", "", "p")).unwrap_err();
        assert_matches!(err, ApiError::InvalidInput { .. });
        let err = DigitClient::new(DigitConfig::new("http://d.example/", "u", "")).unwrap_err();
        assert_matches!(err, ApiError::InvalidInput { .. });
    }

    #[tokio::test]
    async fn new_performs_no_io() {
        // An address nothing listens on: construction must still succeed.
        let client = DigitClient::new(DigitConfig::new("http://127.0.0.1:9/", "u", "p")).unwrap();
        assert!(client.session().current().await.is_none());
    }
}
