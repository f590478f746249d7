//! Thin typed wrappers over the platform's REST endpoints.
//!
//! No resilience logic lives here: each operation validates its input,
//! makes exactly one HTTP call with the supplied cookie, and classifies the
//! response. Session handling and busy-retry wrap these calls at the
//! facade.

mod metadata;
mod objects;
mod resources;

pub use metadata::FormElementType;
pub use objects::{NewObject, SearchQuery};

use crate::http::HttpClient;

/// The platform's REST surface, pinned to one base URL.
///
/// Operations take the session cookie explicitly; the facade supplies a
/// fresh one per call.
#[derive(Debug)]
pub struct RestApi {
    pub(crate) http: HttpClient,
}

impl RestApi {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }
}
