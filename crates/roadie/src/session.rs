//! Session value types: connection state, credentials, identity.
//!
//! A [`Session`] is a snapshot. Every transition builds a new value;
//! observers compare snapshots structurally to detect change instead
//! of watching a mutable object.

use std::fmt;

use serde::Deserialize;

/// The username the server reports for unauthenticated requests.
pub const ANONYMOUS_USER: &str = "anonymous";

/// State of the connection to the media server.
///
/// Exactly one value holds at any time. It is the authoritative
/// signal for whether an upload may proceed, and after a failed
/// request it explains what went wrong. No state is terminal; the
/// next identity probe can move to any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// The server URL was not specified.
    Unconfigured,
    /// The server is reachable, no login was attempted, and the
    /// current user is anonymous.
    Connected,
    /// The server is reachable and the user is authenticated.
    LoggedIn,
    /// Some network error occurred when accessing the server.
    NetworkError,
    /// A request unexpectedly returned a non-2xx code.
    ResponseNotOk,
    /// A response contained invalid JSON or unexpected data.
    InvalidResponse,
    /// A login was provided but did not succeed.
    IncorrectLogin,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Unconfigured => "unconfigured",
            ConnectionState::Connected => "connected",
            ConnectionState::LoggedIn => "logged_in",
            ConnectionState::NetworkError => "network_error",
            ConnectionState::ResponseNotOk => "response_not_ok",
            ConnectionState::InvalidResponse => "invalid_response",
            ConnectionState::IncorrectLogin => "incorrect_login",
        })
    }
}

/// How requests authenticate. Absence (no login attempted) is
/// `Option::<Login>::None` on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Login {
    /// Session cookies already authenticate us; nothing to attach.
    Provided,
    /// Username and password, sent as HTTP Basic auth.
    Basic { username: String, password: String },
}

/// The server's notion of the current user, from `info/me.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub user: UserInfo,
    #[serde(rename = "userRole", default)]
    pub user_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub username: String,
    /// Display name, when the server provides one.
    #[serde(default)]
    pub name: Option<String>,
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        self.user.username == ANONYMOUS_USER
    }
}

/// One version of the connection: server URL, credentials, state,
/// and last-observed identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Base URL without a trailing slash; `None` when unconfigured.
    pub server_url: Option<String>,
    pub login: Option<Login>,
    pub state: ConnectionState,
    /// `None` until the first successful identity probe.
    pub identity: Option<Identity>,
}

impl Session {
    /// A session with no server configured.
    pub fn unconfigured() -> Self {
        Session {
            server_url: None,
            login: None,
            state: ConnectionState::Unconfigured,
            identity: None,
        }
    }

    /// The state a freshly probed identity implies, given whether a
    /// login was supplied. An anonymous identity despite supplied
    /// credentials means the login did not take.
    pub(crate) fn state_for_identity(identity: &Identity, login_supplied: bool) -> ConnectionState {
        if identity.is_anonymous() {
            if login_supplied {
                ConnectionState::IncorrectLogin
            } else {
                ConnectionState::Connected
            }
        } else {
            ConnectionState::LoggedIn
        }
    }
}
