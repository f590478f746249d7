//! HTTP implementations of the session manager's login and probe seams.

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};

use digit_auth::{AuthError, Authenticator, ProbeOutcome, SessionCookie};

/// Logs in with username/password and probes cookie validity against the
/// platform's REST surface.
pub struct RestAuthenticator {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for RestAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAuthenticator")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"..")
            .finish()
    }
}

impl RestAuthenticator {
    /// `base_url` must already carry a trailing slash.
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        username: String,
        password: String,
    ) -> Self {
        Self {
            client,
            base_url,
            username,
            password,
        }
    }
}

#[async_trait]
impl Authenticator for RestAuthenticator {
    async fn login(&self) -> Result<SessionCookie, AuthError> {
        let response = self
            .client
            .post(format!("{}rest/login", self.base_url))
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status().as_u16();
        match status {
            200..=299 => {
                // The session token is the first set-cookie pair, truncated
                // at its attributes.
                let raw = response
                    .headers()
                    .get(SET_COOKIE)
                    .and_then(|value| value.to_str().ok())
                    .ok_or(AuthError::MissingCookie)?;
                let pair = raw.split(';').next().unwrap_or(raw).trim();
                if pair.is_empty() {
                    return Err(AuthError::MissingCookie);
                }
                Ok(SessionCookie::new(pair))
            }
            401 => Err(AuthError::InvalidCredentials),
            status => Err(AuthError::UnexpectedStatus {
                status,
                endpoint: "rest/login".into(),
            }),
        }
    }

    async fn probe(&self, cookie: &SessionCookie) -> Result<ProbeOutcome, AuthError> {
        let response = self
            .client
            .head(format!("{}rest/profile", self.base_url))
            .header(COOKIE, cookie.header_value())
            .send()
            .await
            .map_err(connection_error)?;

        match response.status().as_u16() {
            200..=299 => Ok(ProbeOutcome::Valid),
            401 | 403 | 404 => Ok(ProbeOutcome::Invalid),
            status => Err(AuthError::UnexpectedStatus {
                status,
                endpoint: "rest/profile".into(),
            }),
        }
    }
}

fn connection_error(err: reqwest::Error) -> AuthError {
    AuthError::Connection {
        message: err.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn authenticator_for(server: &MockServer) -> RestAuthenticator {
        RestAuthenticator::new(
            reqwest::Client::new(),
            format!("{}/", server.uri()),
            "alice".into(),
            "wonder".into(),
        )
    }

    #[tokio::test]
    async fn login_extracts_cookie_pair() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/login"))
            .and(body_json(
                serde_json::json!({"username": "alice", "password": "wonder"}),
            ))
            .respond_with(ResponseTemplate::new(200).insert_header(
                "set-cookie",
                "JSESSIONID=deadbeef; Path=/; HttpOnly",
            ))
            .mount(&server)
            .await;

        let cookie = authenticator_for(&server).login().await.unwrap();
        assert_eq!(cookie.header_value(), "JSESSIONID=deadbeef");
    }

    #[tokio::test]
    async fn login_401_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = authenticator_for(&server).login().await.unwrap_err();
        assert_matches!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn login_other_status_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/login"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = authenticator_for(&server).login().await.unwrap_err();
        assert_matches!(err, AuthError::UnexpectedStatus { status: 500, .. });
    }

    #[tokio::test]
    async fn login_without_set_cookie_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = authenticator_for(&server).login().await.unwrap_err();
        assert_matches!(err, AuthError::MissingCookie);
    }

    #[tokio::test]
    async fn probe_accepts_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/profile"))
            .and(header("cookie", "JSESSIONID=ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let outcome = authenticator_for(&server)
            .probe(&SessionCookie::new("JSESSIONID=ok"))
            .await
            .unwrap();
        assert_eq!(outcome, ProbeOutcome::Valid);
    }

    #[tokio::test]
    async fn probe_404_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/profile"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = authenticator_for(&server)
            .probe(&SessionCookie::new("JSESSIONID=stale"))
            .await
            .unwrap();
        assert_eq!(outcome, ProbeOutcome::Invalid);
    }

    #[tokio::test]
    async fn probe_5xx_is_an_error_not_a_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/profile"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = authenticator_for(&server)
            .probe(&SessionCookie::new("JSESSIONID=x"))
            .await
            .unwrap_err();
        assert_matches!(err, AuthError::UnexpectedStatus { status: 502, .. });
    }

    #[tokio::test]
    async fn unreachable_server_is_transient() {
        // Nothing listens on this port.
        let authenticator = RestAuthenticator::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/".into(),
            "a".into(),
            "b".into(),
        );
        let err = authenticator
            .probe(&SessionCookie::new("JSESSIONID=x"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
