//! The connection manager: one logical connection to the server.
//!
//! [`Connection`] owns the HTTP client and the current [`Session`]
//! snapshot, and decides the connection state from identity probes.
//! It also carries the low-level transport: every request goes
//! through [`Connection::execute`], which classifies the outcome and
//! records the matching state on the session before returning an
//! error.

use reqwest::redirect;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use url::Url;

use crate::error::RequestError;
use crate::session::{ConnectionState, Login, Session};

/// Identity probe endpoint, relative to the server base URL.
const ME_JSON: &str = "info/me.json";

/// Server settings as supplied by the caller (config or UI).
#[derive(Debug, Clone, Default)]
pub struct ConnectSettings {
    pub server_url: Option<String>,
    /// The caller asserts that ambient session cookies already
    /// authenticate us. Takes priority over name/password.
    pub login_provided: bool,
    pub login_name: Option<String>,
    pub login_password: Option<String>,
}

/// A logical connection to the media server.
///
/// Callers serialize operations through `&mut self`; there is no
/// internal synchronization. Observers subscribe to session
/// snapshots instead of holding a reference across await points.
pub struct Connection {
    http: reqwest::Client,
    session: Session,
    published: watch::Sender<Session>,
}

impl Connection {
    /// Establishes a connection from settings.
    ///
    /// Without a server URL this returns an `Unconfigured` connection
    /// and issues no network call. Otherwise the URL is normalized
    /// (one trailing slash stripped), credentials resolved, and a
    /// single identity probe performed. A failed probe is logged, not
    /// propagated: the returned connection is usable and its state
    /// reflects the error classification.
    pub async fn connect(settings: &ConnectSettings) -> Self {
        // Redirects stay visible: a redirect to a login page means
        // "not actually authenticated" and must not be followed.
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .cookie_store(true)
            .build()
            .expect("failed to construct HTTP client");

        let session = Session::unconfigured();
        let (published, _) = watch::channel(session.clone());
        let mut conn = Connection {
            http,
            session,
            published,
        };

        let raw_url = match settings.server_url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => return conn,
        };

        conn.session.server_url = Some(raw_url.strip_suffix('/').unwrap_or(raw_url).to_string());
        conn.session.login = if settings.login_provided {
            Some(Login::Provided)
        } else if let (Some(username), Some(password)) =
            (settings.login_name.as_deref(), settings.login_password.as_deref())
        {
            Some(Login::Basic {
                username: username.to_string(),
                password: password.to_string(),
            })
        } else {
            None
        };

        if let Err(e) = conn.probe_identity().await {
            tracing::warn!(error = %e, "initial identity probe failed");
        }
        conn.publish();

        conn
    }

    /// The current session snapshot.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state
    }

    /// Whether the connection is ready to upload a recording.
    pub fn is_ready_to_upload(&self) -> bool {
        self.session.state == ConnectionState::LoggedIn
    }

    /// Whether a login is already provided by ambient cookies (i.e.
    /// we never need to ask for one).
    pub fn is_login_provided(&self) -> bool {
        self.session.login == Some(Login::Provided)
    }

    /// The server hostname in a form suitable to present to users.
    /// Only derived for `https` URLs; withheld otherwise.
    pub fn pretty_server_url(&self) -> Option<String> {
        pretty_host(self.session.server_url.as_deref()?)
    }

    /// Subscribes to session snapshots. A new value arrives only when
    /// something about the session actually changed.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.published.subscribe()
    }

    /// Refreshes the connection by probing `info/me.json`, unless the
    /// state is `Unconfigured`.
    ///
    /// Transport errors are swallowed here; the probe already
    /// recorded them on the session state. The session is republished
    /// only if something changed.
    pub async fn refresh(&mut self) {
        if self.session.state == ConnectionState::Unconfigured {
            return;
        }

        if let Err(e) = self.probe_identity().await {
            tracing::warn!(error = %e, "connection refresh failed");
        }
        self.publish();
    }

    /// Re-reads the current user from `info/me.json` and recomputes
    /// the connection state.
    ///
    /// The returned identity is compared structurally with the
    /// previous one; when equal, nothing is touched and `false` is
    /// returned.
    #[tracing::instrument(skip(self), fields(server = ?self.session.server_url))]
    pub async fn probe_identity(&mut self) -> Result<bool, RequestError> {
        let identity = self.send_json(ME_JSON).await?;

        if self.session.identity.as_ref() == Some(&identity) {
            return Ok(false);
        }

        let state = Session::state_for_identity(&identity, self.session.login.is_some());
        tracing::debug!(username = %identity.user.username, state = %state, "identity changed");
        self.session.identity = Some(identity);
        self.session.state = state;
        Ok(true)
    }

    /// Publishes the current session if it differs from the last
    /// published one. Structural comparison suppresses redundant
    /// notifications to subscribers.
    pub(crate) fn publish(&self) {
        self.published.send_if_modified(|current| {
            if *current == self.session {
                false
            } else {
                *current = self.session.clone();
                true
            }
        });
    }

    fn endpoint(&self, path: &str) -> String {
        match self.session.server_url.as_deref() {
            Some(base) => format!("{}/{}", base, path),
            None => path.to_string(),
        }
    }

    /// Sends a GET request to the given API path.
    pub(crate) async fn get(&mut self, path: &str) -> Result<Response, RequestError> {
        let request = self.http.get(self.endpoint(path));
        self.execute(path, request).await
    }

    /// Sends a multipart POST request to the given API path.
    pub(crate) async fn post_form(
        &mut self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Response, RequestError> {
        let request = self.http.post(self.endpoint(path)).multipart(form);
        self.execute(path, request).await
    }

    /// GET, returning the response body as text. Every ingest step
    /// answers with a plain-text package handle.
    pub(crate) async fn get_text(&mut self, path: &str) -> Result<String, RequestError> {
        let response = self.get(path).await?;
        self.body_text(path, response).await
    }

    /// Multipart POST, returning the response body as text.
    pub(crate) async fn post_form_text(
        &mut self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<String, RequestError> {
        let response = self.post_form(path, form).await?;
        self.body_text(path, response).await
    }

    /// GET, parsing the response body as JSON. A parse failure is an
    /// `InvalidResponse` and moves the state accordingly.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &mut self,
        path: &str,
    ) -> Result<T, RequestError> {
        let response = self.get(path).await?;
        match response.json().await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.session.state = ConnectionState::InvalidResponse;
                Err(RequestError::InvalidResponse {
                    url: self.endpoint(path),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Performs the request and classifies the outcome, in priority
    /// order: network failure, 401, other unexpected status. The
    /// matching state lands on the session before the error is
    /// returned. Redirect responses pass through unfollowed.
    async fn execute(
        &mut self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Response, RequestError> {
        let request = match &self.session.login {
            Some(Login::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            _ => request,
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                self.session.state = ConnectionState::NetworkError;
                return Err(RequestError::Network {
                    url: self.endpoint(path),
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.state = ConnectionState::IncorrectLogin;
            return Err(RequestError::IncorrectLogin);
        }
        if !status.is_success() && !status.is_redirection() {
            self.session.state = ConnectionState::ResponseNotOk;
            return Err(RequestError::ResponseNotOk {
                url: self.endpoint(path),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    async fn body_text(
        &mut self,
        path: &str,
        response: Response,
    ) -> Result<String, RequestError> {
        match response.text().await {
            Ok(text) => Ok(text),
            Err(e) => {
                self.session.state = ConnectionState::NetworkError;
                Err(RequestError::Network {
                    url: self.endpoint(path),
                    message: e.to_string(),
                })
            }
        }
    }
}

fn pretty_host(server_url: &str) -> Option<String> {
    if !server_url.starts_with("https") {
        return None;
    }
    Url::parse(server_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_host_for_https_only() {
        assert_eq!(
            pretty_host("https://media.example.org/studio"),
            Some("media.example.org".to_string())
        );
        assert_eq!(pretty_host("http://media.example.org"), None);
        assert_eq!(pretty_host("not a url"), None);
    }

    #[tokio::test]
    async fn missing_server_url_stays_unconfigured() {
        let conn = Connection::connect(&ConnectSettings::default()).await;
        assert_eq!(conn.state(), ConnectionState::Unconfigured);
        assert_eq!(conn.session().server_url, None);
        assert_eq!(conn.session().login, None);
        assert!(!conn.is_ready_to_upload());
    }

    #[tokio::test]
    async fn empty_server_url_counts_as_missing() {
        let settings = ConnectSettings {
            server_url: Some(String::new()),
            ..Default::default()
        };
        let conn = Connection::connect(&settings).await;
        assert_eq!(conn.state(), ConnectionState::Unconfigured);
    }

    #[tokio::test]
    async fn refresh_is_a_noop_when_unconfigured() {
        let mut conn = Connection::connect(&ConnectSettings::default()).await;
        conn.refresh().await;
        assert_eq!(conn.state(), ConnectionState::Unconfigured);
    }

    #[tokio::test]
    async fn implicit_login_wins_over_explicit() {
        // Unreachable server; only the credential resolution matters.
        let settings = ConnectSettings {
            server_url: Some("http://127.0.0.1:1/".to_string()),
            login_provided: true,
            login_name: Some("jane".to_string()),
            login_password: Some("secret".to_string()),
        };
        let conn = Connection::connect(&settings).await;
        assert!(conn.is_login_provided());
        assert_eq!(conn.session().server_url.as_deref(), Some("http://127.0.0.1:1"));
    }
}
