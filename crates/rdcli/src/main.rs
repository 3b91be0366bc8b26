//! rdcli - command line client for Roadie uploads
//!
//! Subcommands:
//! - `rdcli status` - check the connection to the configured media server
//! - `rdcli upload` - ingest recordings as a new media package

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use roadie::{upload, ConnectSettings, Connection, ConnectionState, Recording, SourceKind, UploadRequest};
use roadieconf::RoadieConfig;

#[derive(Parser)]
#[command(name = "rdcli")]
#[command(about = "Upload recordings to an Opencast-style media server")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./roadie.toml plus standard locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check connectivity and login against the configured server
    Status,

    /// Upload recordings as a new media package
    Upload {
        /// Title of the new episode
        #[arg(long)]
        title: String,

        /// Presenter/creator name
        #[arg(long)]
        creator: String,

        /// Workflow definition started after ingest
        #[arg(long)]
        workflow: Option<String>,

        /// Series the episode belongs to
        #[arg(long)]
        series: Option<String>,

        /// Screen-share recording file (repeatable)
        #[arg(long = "display", value_name = "FILE")]
        display: Vec<PathBuf>,

        /// Camera recording file (repeatable)
        #[arg(long = "camera", value_name = "FILE")]
        camera: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = RoadieConfig::load_from(cli.config.as_deref())?;
    let settings = connect_settings(&config);

    match cli.command {
        Commands::Status => status(&settings).await,
        Commands::Upload {
            title,
            creator,
            workflow,
            series,
            display,
            camera,
        } => {
            let request = UploadRequest {
                recordings: read_recordings(&display, &camera)?,
                title,
                creator,
                workflow_id: workflow.or(config.upload.workflow_id),
                series_id: series.or(config.upload.series_id),
            };
            run_upload(&settings, request).await
        }
    }
}

fn connect_settings(config: &RoadieConfig) -> ConnectSettings {
    ConnectSettings {
        server_url: config.server.url.clone(),
        login_provided: config.login.provided.unwrap_or(false),
        login_name: config.login.name.clone(),
        login_password: config.login.password.clone(),
    }
}

async fn status(settings: &ConnectSettings) -> Result<()> {
    let conn = Connection::connect(settings).await;

    println!("state: {}", conn.state());
    if let Some(host) = conn.pretty_server_url() {
        println!("server: {}", host);
    }
    if let Some(identity) = &conn.session().identity {
        println!("user: {}", identity.user.username);
    }

    match conn.state() {
        ConnectionState::Connected | ConnectionState::LoggedIn => Ok(()),
        _ => std::process::exit(1),
    }
}

async fn run_upload(settings: &ConnectSettings, request: UploadRequest) -> Result<()> {
    if request.recordings.is_empty() {
        bail!("no recordings given (use --display and/or --camera)");
    }

    let mut conn = Connection::connect(settings).await;
    match upload(&mut conn, request).await {
        Ok(()) => {
            println!("upload complete");
            Ok(())
        }
        Err(e) => {
            eprintln!("upload failed: {} (state: {})", e, conn.state());
            std::process::exit(1);
        }
    }
}

fn read_recordings(display: &[PathBuf], camera: &[PathBuf]) -> Result<Vec<Recording>> {
    let mut recordings = Vec::new();
    for path in display {
        recordings.push(read_recording(path, SourceKind::Display)?);
    }
    for path in camera {
        recordings.push(read_recording(path, SourceKind::Camera)?);
    }
    Ok(recordings)
}

fn read_recording(path: &Path, source: SourceKind) -> Result<Recording> {
    let media = std::fs::read(path)
        .with_context(|| format!("failed to read recording {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = media.len(), "read recording");

    Ok(Recording {
        source,
        media,
        mime_type: mime_for(path).to_string(),
    })
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mkv") => "video/x-matroska",
        Some("mp4") => "video/mp4",
        // Browser capture hands us WebM unless told otherwise.
        _ => "video/webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for(Path::new("a.mkv")), "video/x-matroska");
        assert_eq!(mime_for(Path::new("a.mp4")), "video/mp4");
        assert_eq!(mime_for(Path::new("a.webm")), "video/webm");
        assert_eq!(mime_for(Path::new("noext")), "video/webm");
    }

    #[test]
    fn settings_come_from_config() {
        let mut config = RoadieConfig::default();
        config.server.url = Some("https://media.example.org/".to_string());
        config.login.name = Some("jane".to_string());
        config.login.password = Some("secret".to_string());

        let settings = connect_settings(&config);
        assert_eq!(settings.server_url.as_deref(), Some("https://media.example.org/"));
        assert!(!settings.login_provided);
        assert_eq!(settings.login_name.as_deref(), Some("jane"));
    }
}
