//! Files, dictionaries, and calendars.

use bytes::Bytes;
use serde_json::Value;

use digit_auth::SessionCookie;

use crate::errors::ApiError;
use crate::rest::RestApi;

impl RestApi {
    /// Download the contents of a stored file.
    pub async fn get_file(
        &self,
        cookie: &SessionCookie,
        file_object_id: &str,
    ) -> Result<Bytes, ApiError> {
        if file_object_id.trim().is_empty() {
            return Err(ApiError::invalid_input("fileObjectId must not be empty"));
        }
        self.http
            .get_bytes(cookie, &format!("rest/file/{file_object_id}"))
            .await
    }

    /// List the platform dictionaries.
    pub async fn get_dictionaries(&self, cookie: &SessionCookie) -> Result<Value, ApiError> {
        self.http.get_json(cookie, "rest/dictionary").await
    }

    /// Fetch one dictionary with its entries.
    pub async fn get_dictionary(
        &self,
        cookie: &SessionCookie,
        dictionary_id: &str,
    ) -> Result<Value, ApiError> {
        if dictionary_id.trim().is_empty() {
            return Err(ApiError::invalid_input("dictionaryId must not be empty"));
        }
        self.http
            .get_json(cookie, &format!("rest/dictionary/{dictionary_id}"))
            .await
    }

    /// Fetch one working calendar.
    pub async fn get_calendar(
        &self,
        cookie: &SessionCookie,
        calendar_object_id: &str,
    ) -> Result<Value, ApiError> {
        if calendar_object_id.trim().is_empty() {
            return Err(ApiError::invalid_input("calendarObjectId must not be empty"));
        }
        self.http
            .get_json(cookie, &format!("rest/calendar/{calendar_object_id}"))
            .await
    }
}
