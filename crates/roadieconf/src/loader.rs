//! Config file discovery, loading, and environment variable overlay.

use std::env;
use std::path::{Path, PathBuf};

use crate::{ConfigError, RoadieConfig};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local
/// override. Returns paths in load order (system, user, local/cli).
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    // System config
    let system = PathBuf::from("/etc/roadie/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("roadie/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    // CLI override takes precedence over local
    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    // Local override (current directory)
    let local = PathBuf::from("roadie.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from all sources, reporting which were used.
pub fn load_with_sources(
    cli_path: Option<&Path>,
) -> Result<(RoadieConfig, ConfigSources), ConfigError> {
    let mut config = RoadieConfig::default();
    let mut sources = ConfigSources::default();

    for path in discover_config_files_with_override(cli_path) {
        let loaded = load_from_file(&path)?;
        merge(&mut config, loaded);
        sources.files.push(path);
    }

    sources.env_overrides = apply_env_overrides_with(&mut config, |name| env::var(name).ok());

    Ok((config, sources))
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<RoadieConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Field-wise merge: values present in `next` win.
fn merge(base: &mut RoadieConfig, next: RoadieConfig) {
    if next.server.url.is_some() {
        base.server.url = next.server.url;
    }
    if next.login.provided.is_some() {
        base.login.provided = next.login.provided;
    }
    if next.login.name.is_some() {
        base.login.name = next.login.name;
    }
    if next.login.password.is_some() {
        base.login.password = next.login.password;
    }
    if next.upload.workflow_id.is_some() {
        base.upload.workflow_id = next.upload.workflow_id;
    }
    if next.upload.series_id.is_some() {
        base.upload.series_id = next.upload.series_id;
    }
}

/// Apply `ROADIE_*` overrides, reading variables through `get` so
/// tests can supply their own environment. Returns the names that
/// took effect.
fn apply_env_overrides_with(
    config: &mut RoadieConfig,
    get: impl Fn(&str) -> Option<String>,
) -> Vec<String> {
    let mut applied = Vec::new();

    if let Some(value) = get("ROADIE_SERVER_URL") {
        config.server.url = Some(value);
        applied.push("ROADIE_SERVER_URL".to_string());
    }
    if let Some(value) = get("ROADIE_LOGIN_PROVIDED") {
        config.login.provided = Some(value == "true" || value == "1");
        applied.push("ROADIE_LOGIN_PROVIDED".to_string());
    }
    if let Some(value) = get("ROADIE_LOGIN_NAME") {
        config.login.name = Some(value);
        applied.push("ROADIE_LOGIN_NAME".to_string());
    }
    if let Some(value) = get("ROADIE_LOGIN_PASSWORD") {
        config.login.password = Some(value);
        applied.push("ROADIE_LOGIN_PASSWORD".to_string());
    }
    if let Some(value) = get("ROADIE_WORKFLOW_ID") {
        config.upload.workflow_id = Some(value);
        applied.push("ROADIE_WORKFLOW_ID".to_string());
    }
    if let Some(value) = get("ROADIE_SERIES_ID") {
        config.upload.series_id = Some(value);
        applied.push("ROADIE_SERIES_ID".to_string());
    }

    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn parse(contents: &str) -> RoadieConfig {
        toml::from_str(contents).unwrap()
    }

    #[test]
    fn parses_full_config() {
        let config = parse(
            r#"
            [server]
            url = "https://media.example.org"

            [login]
            name = "jane"
            password = "secret"

            [upload]
            workflow_id = "fast"
            "#,
        );

        assert_eq!(config.server.url.as_deref(), Some("https://media.example.org"));
        assert_eq!(config.login.name.as_deref(), Some("jane"));
        assert_eq!(config.login.provided, None);
        assert_eq!(config.upload.workflow_id.as_deref(), Some("fast"));
        assert_eq!(config.upload.series_id, None);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        assert_eq!(parse(""), RoadieConfig::default());
    }

    #[test]
    fn later_file_wins_per_field() {
        let mut base = parse("[server]\nurl = \"https://a\"\n[login]\nname = \"jane\"");
        let next = parse("[server]\nurl = \"https://b\"");

        merge(&mut base, next);

        assert_eq!(base.server.url.as_deref(), Some("https://b"));
        // Untouched fields survive the merge.
        assert_eq!(base.login.name.as_deref(), Some("jane"));
    }

    #[test]
    fn env_overrides_win_over_files() {
        let mut config = parse("[server]\nurl = \"https://a\"");
        let env: HashMap<&str, &str> = [
            ("ROADIE_SERVER_URL", "https://b"),
            ("ROADIE_LOGIN_PROVIDED", "true"),
        ]
        .into_iter()
        .collect();

        let applied =
            apply_env_overrides_with(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.url.as_deref(), Some("https://b"));
        assert_eq!(config.login.provided, Some(true));
        assert_eq!(applied.len(), 2);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nurl = \"https://media.example.org\"").unwrap();

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.server.url.as_deref(), Some("https://media.example.org"));
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [[").unwrap();

        let err = load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
