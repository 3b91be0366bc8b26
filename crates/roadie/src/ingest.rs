//! The ingest pipeline: recordings plus metadata in, submitted media
//! package out.
//!
//! The pipeline is a fold over an opaque package handle: every step
//! sends the handle from the previous step and the server's response
//! body becomes the next handle. Steps are strictly sequential (each
//! request body depends on the prior response) and any failure aborts
//! the run. There is no retry and no rollback of partial server-side
//! state.

use reqwest::multipart::{Form, Part};

use crate::catalog;
use crate::connection::Connection;
use crate::error::UploadError;

/// Where a recording came from. Decides the flavor the server files
/// the track under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Screen share / desktop capture.
    Display,
    /// Camera capture.
    Camera,
}

impl SourceKind {
    /// Server-side track flavor for this source.
    pub fn flavor(self) -> &'static str {
        match self {
            SourceKind::Display => "presentation/source",
            SourceKind::Camera => "presenter/source",
        }
    }

    /// Prefix used in the uploaded file name.
    fn label(self) -> &'static str {
        match self {
            SourceKind::Display => "Presentation",
            SourceKind::Camera => "Presenter",
        }
    }
}

/// A finished recording handed over by the capture layer.
#[derive(Debug, Clone)]
pub struct Recording {
    pub source: SourceKind,
    pub media: Vec<u8>,
    pub mime_type: String,
}

/// Everything the pipeline needs for one upload.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub recordings: Vec<Recording>,
    pub title: String,
    pub creator: String,
    /// Workflow definition started by the server after ingest.
    pub workflow_id: Option<String>,
    /// Series the episode belongs to.
    pub series_id: Option<String>,
}

/// An opaque server-issued handle for the in-progress package.
///
/// Replaced by the server's response after every step; never
/// interpreted by the client.
#[derive(Debug, Clone)]
pub struct MediaPackage(String);

impl MediaPackage {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Uploads the given recordings as a new media package.
///
/// The connection is refreshed first; anything but `LoggedIn` aborts
/// before the first ingest call. On failure the session's connection
/// state explains what went wrong.
#[tracing::instrument(
    skip(conn, request),
    fields(title = %request.title, recordings = request.recordings.len())
)]
pub async fn upload(conn: &mut Connection, request: UploadRequest) -> Result<(), UploadError> {
    conn.refresh().await;
    if !conn.is_ready_to_upload() {
        let state = conn.state();
        tracing::warn!(state = %state, "not ready to upload");
        return Err(UploadError::NotReady(state));
    }

    let result = run_steps(conn, request).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "error occurred during upload");
    }
    conn.publish();
    result
}

async fn run_steps(conn: &mut Connection, request: UploadRequest) -> Result<(), UploadError> {
    // Create a new, empty package on the server.
    let pkg = MediaPackage(conn.get_text("ingest/createMediaPackage").await?);
    tracing::debug!("created media package");

    // Describe the episode.
    let dcc = catalog::dublin_core(&request.title, &request.creator, request.series_id.as_deref());
    let form = Form::new()
        .text("mediaPackage", pkg.0)
        .text("dublinCore", dcc)
        .text("flavor", "dublincore/episode");
    let pkg = MediaPackage(conn.post_form_text("ingest/addDCCatalog", form).await?);

    // Let the current user read and write the recording.
    let role = conn
        .session()
        .identity
        .as_ref()
        .and_then(|identity| identity.user_role.as_deref())
        .unwrap_or_default();
    let acl = catalog::acl_for_role(role);
    let form = Form::new()
        .text("flavor", "security/xacml+episode")
        .text("mediaPackage", pkg.0)
        .part("BODY", Part::bytes(acl.into_bytes()).file_name("acl.xml"));
    let mut pkg = MediaPackage(conn.post_form_text("ingest/addAttachment", form).await?);

    // Attach every recording as a track.
    for recording in request.recordings {
        let file_name = track_file_name(recording.source, &request.title);
        let flavor = recording.source.flavor();
        let part = Part::bytes(recording.media)
            .file_name(file_name)
            .mime_str(&recording.mime_type)
            .map_err(|_| UploadError::InvalidContentType(recording.mime_type.clone()))?;
        let form = Form::new()
            .text("mediaPackage", pkg.0)
            .text("flavor", flavor)
            .text("tags", "")
            .part("BODY", part);
        pkg = MediaPackage(conn.post_form_text("ingest/addTrack", form).await?);
        tracing::debug!(flavor, "attached track");
    }

    // Submit the finished package for processing.
    let mut form = Form::new().text("mediaPackage", pkg.0);
    if let Some(workflow) = request.workflow_id.filter(|w| !w.is_empty()) {
        form = form.text("workflowDefinitionId", workflow);
    }
    conn.post_form("ingest/ingest", form).await?;
    tracing::info!("media package submitted");

    Ok(())
}

fn track_file_name(source: SourceKind, title: &str) -> String {
    let title = if title.is_empty() { "Recording" } else { title };
    format!("{} - {}.mkv", source.label(), title)
}
