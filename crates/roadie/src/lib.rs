//! roadie - client library for Opencast-style media ingest APIs.
//!
//! Roadie keeps one logical connection to a remote media server and
//! runs the multi-step ingest protocol that turns finished recordings
//! plus metadata into a submitted media package.
//!
//! Two pieces cooperate:
//!
//! - [`Connection`]: owns the session (server URL, credentials,
//!   connection state, last-observed identity) and decides the state
//!   from identity probes.
//! - [`upload`]: the ingest pipeline, a strictly ordered sequence of
//!   remote calls threading an opaque package handle from step to
//!   step.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use roadie::{upload, ConnectSettings, Connection, Recording, SourceKind, UploadRequest};
//!
//! # async fn run() {
//! let settings = ConnectSettings {
//!     server_url: Some("https://media.example.org".to_string()),
//!     login_name: Some("jane".to_string()),
//!     login_password: Some("secret".to_string()),
//!     ..Default::default()
//! };
//!
//! let mut conn = Connection::connect(&settings).await;
//! if conn.is_ready_to_upload() {
//!     let request = UploadRequest {
//!         recordings: vec![Recording {
//!             source: SourceKind::Display,
//!             media: vec![/* captured bytes */],
//!             mime_type: "video/webm".to_string(),
//!         }],
//!         title: "Tuesday lecture".to_string(),
//!         creator: "Jane".to_string(),
//!         workflow_id: None,
//!         series_id: None,
//!     };
//!     if let Err(e) = upload(&mut conn, request).await {
//!         eprintln!("upload failed: {} (state: {})", e, conn.state());
//!     }
//! }
//! # }
//! ```
//!
//! # Error Model
//!
//! The transport raises [`RequestError`] and records the matching
//! [`ConnectionState`] on the session before the error is returned, so
//! the state carries the diagnosis even when callers discard the
//! error. The connection swallows `RequestError` during probes; the
//! pipeline surfaces it as [`UploadError`]. Nothing retries: a retry
//! is the caller refreshing or re-running the pipeline.

mod catalog;
mod connection;
mod error;
mod ingest;
mod session;

pub use connection::{ConnectSettings, Connection};
pub use error::{RequestError, UploadError};
pub use ingest::{upload, MediaPackage, Recording, SourceKind, UploadRequest};
pub use session::{ConnectionState, Identity, Login, Session, UserInfo, ANONYMOUS_USER};
