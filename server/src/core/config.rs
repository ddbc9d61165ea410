use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT,
    POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS, POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_MAX_CONNECTIONS, POSTGRES_DEFAULT_MAX_LIFETIME_SECS,
    POSTGRES_DEFAULT_MIN_CONNECTIONS, POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
};

// =============================================================================
// Write Mode Enum
// =============================================================================

/// Persistence strategy for flush batches
///
/// Batch submits the whole flush in one atomic store call; per-record is the
/// degraded path for stores without a batch routine, isolating failures per
/// record. Exactly one mode is configured per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteMode {
    #[default]
    Batch,
    PerRecord,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Batch => write!(f, "batch"),
            WriteMode::PerRecord => write!(f, "per-record"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// PostgreSQL configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostgresFileConfig {
    /// PostgreSQL connection URL (or use STATSINK_POSTGRES_URL env var)
    pub url: Option<String>,
    /// Maximum number of connections in the pool (default: 20)
    pub max_connections: Option<u32>,
    /// Minimum number of connections to keep warm (default: 2)
    pub min_connections: Option<u32>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
    /// Idle connection timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Max connection lifetime in seconds (default: 1800)
    pub max_lifetime_secs: Option<u64>,
    /// Statement timeout in seconds, 0 to disable (default: 60)
    pub statement_timeout_secs: Option<u64>,
}

/// Database configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub postgres: Option<PostgresFileConfig>,
}

/// Writer configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WriterFileConfig {
    /// Persistence mode: batch (default) or per-record
    pub mode: Option<WriteMode>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub writer: Option<WriterFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Server
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        // Database
        if let Some(database) = other.database {
            let current = self
                .database
                .get_or_insert_with(DatabaseFileConfig::default);
            if let Some(postgres) = database.postgres {
                let current_pg = current
                    .postgres
                    .get_or_insert_with(PostgresFileConfig::default);
                if postgres.url.is_some() {
                    tracing::trace!(url = "***", "Merging database.postgres.url");
                    current_pg.url = postgres.url;
                }
                if postgres.max_connections.is_some() {
                    tracing::trace!(max_connections = ?postgres.max_connections, "Merging database.postgres.max_connections");
                    current_pg.max_connections = postgres.max_connections;
                }
                if postgres.min_connections.is_some() {
                    tracing::trace!(min_connections = ?postgres.min_connections, "Merging database.postgres.min_connections");
                    current_pg.min_connections = postgres.min_connections;
                }
                if postgres.acquire_timeout_secs.is_some() {
                    tracing::trace!(acquire_timeout_secs = ?postgres.acquire_timeout_secs, "Merging database.postgres.acquire_timeout_secs");
                    current_pg.acquire_timeout_secs = postgres.acquire_timeout_secs;
                }
                if postgres.idle_timeout_secs.is_some() {
                    tracing::trace!(idle_timeout_secs = ?postgres.idle_timeout_secs, "Merging database.postgres.idle_timeout_secs");
                    current_pg.idle_timeout_secs = postgres.idle_timeout_secs;
                }
                if postgres.max_lifetime_secs.is_some() {
                    tracing::trace!(max_lifetime_secs = ?postgres.max_lifetime_secs, "Merging database.postgres.max_lifetime_secs");
                    current_pg.max_lifetime_secs = postgres.max_lifetime_secs;
                }
                if postgres.statement_timeout_secs.is_some() {
                    tracing::trace!(statement_timeout_secs = ?postgres.statement_timeout_secs, "Merging database.postgres.statement_timeout_secs");
                    current_pg.statement_timeout_secs = postgres.statement_timeout_secs;
                }
            }
        }

        // Writer
        if let Some(writer) = other.writer {
            let current = self.writer.get_or_insert_with(WriterFileConfig::default);
            if writer.mode.is_some() {
                tracing::trace!(mode = ?writer.mode, "Merging writer.mode");
                current.mode = writer.mode;
            }
        }

        // Debug
        if other.debug.is_some() {
            tracing::trace!(debug = ?other.debug, "Merging debug");
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Resolved Config Structs
// =============================================================================

/// Server configuration (resolved)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// PostgreSQL configuration (resolved)
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub statement_timeout_secs: u64,
}

/// Writer configuration (resolved)
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub mode: WriteMode,
}

/// Application configuration (resolved from all sources)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub writer: WriterConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.statsink/statsink.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.statsink/statsink.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Ok(Self::resolve(file_config, cli))
    }

    /// Resolve file config + CLI overrides into the final config
    fn resolve(file_config: FileConfig, cli: &CliConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_postgres = file_config
            .database
            .unwrap_or_default()
            .postgres
            .unwrap_or_default();
        let file_writer = file_config.writer.unwrap_or_default();

        Self {
            server: ServerConfig {
                host: cli
                    .host
                    .clone()
                    .or(file_server.host)
                    .unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
            },
            postgres: PostgresConfig {
                url: cli
                    .postgres_url
                    .clone()
                    .or(file_postgres.url)
                    .unwrap_or_default(),
                max_connections: file_postgres
                    .max_connections
                    .unwrap_or(POSTGRES_DEFAULT_MAX_CONNECTIONS),
                min_connections: file_postgres
                    .min_connections
                    .unwrap_or(POSTGRES_DEFAULT_MIN_CONNECTIONS),
                acquire_timeout_secs: file_postgres
                    .acquire_timeout_secs
                    .unwrap_or(POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS),
                idle_timeout_secs: file_postgres
                    .idle_timeout_secs
                    .unwrap_or(POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS),
                max_lifetime_secs: file_postgres
                    .max_lifetime_secs
                    .unwrap_or(POSTGRES_DEFAULT_MAX_LIFETIME_SECS),
                statement_timeout_secs: file_postgres
                    .statement_timeout_secs
                    .unwrap_or(POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS),
            },
            writer: WriterConfig {
                mode: cli.write_mode.or(file_writer.mode).unwrap_or_default(),
            },
            debug: cli.debug || file_config.debug.unwrap_or(false),
        }
    }
}

/// Path to the per-user profile config file
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(json: &str) -> FileConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_merge_overlay_takes_precedence() {
        let mut base = parse(r#"{ "server": { "host": "0.0.0.0", "port": 9000 } }"#);
        let overlay = parse(r#"{ "server": { "port": 9001 } }"#);
        base.merge(overlay);

        let server = base.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, Some(9001));
    }

    #[test]
    fn test_merge_nested_postgres_section() {
        let mut base = parse(r#"{ "database": { "postgres": { "url": "postgres://a" } } }"#);
        let overlay =
            parse(r#"{ "database": { "postgres": { "max_connections": 5 } } }"#);
        base.merge(overlay);

        let pg = base.database.unwrap().postgres.unwrap();
        assert_eq!(pg.url.as_deref(), Some("postgres://a"));
        assert_eq!(pg.max_connections, Some(5));
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(FileConfig::default(), &CliConfig::default());
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.writer.mode, WriteMode::Batch);
        assert!(config.postgres.url.is_empty());
        assert_eq!(
            config.postgres.max_connections,
            POSTGRES_DEFAULT_MAX_CONNECTIONS
        );
        assert!(!config.debug);
    }

    #[test]
    fn test_resolve_cli_beats_file() {
        let file = parse(
            r#"{
                "server": { "port": 9000 },
                "database": { "postgres": { "url": "postgres://file" } },
                "writer": { "mode": "batch" }
            }"#,
        );
        let cli = CliConfig {
            port: Some(9010),
            postgres_url: Some("postgres://cli".into()),
            write_mode: Some(WriteMode::PerRecord),
            ..CliConfig::default()
        };
        let config = AppConfig::resolve(file, &cli);
        assert_eq!(config.server.port, 9010);
        assert_eq!(config.postgres.url, "postgres://cli");
        assert_eq!(config.writer.mode, WriteMode::PerRecord);
    }

    #[test]
    fn test_write_mode_wire_names() {
        let writer: WriterFileConfig =
            serde_json::from_str(r#"{ "mode": "per-record" }"#).unwrap();
        assert_eq!(writer.mode, Some(WriteMode::PerRecord));
        assert_eq!(WriteMode::PerRecord.to_string(), "per-record");
        assert_eq!(WriteMode::Batch.to_string(), "batch");
    }

    #[test]
    fn test_load_from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "server": {{ "port": 9123 }}, "writer": {{ "mode": "per-record" }} }}"#
        )
        .unwrap();

        let config = FileConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.server.unwrap().port, Some(9123));
        assert_eq!(config.writer.unwrap().mode, Some(WriteMode::PerRecord));
    }

    #[test]
    fn test_load_from_file_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(FileConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_unknown_fields_collected_into_extra() {
        let config = parse(r#"{ "serverr": { "port": 1 } }"#);
        let extra = config.extra.as_object().unwrap();
        assert!(extra.contains_key("serverr"));
    }
}
