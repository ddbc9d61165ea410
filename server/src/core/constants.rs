// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "statsink";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".statsink";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "statsink.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "STATSINK_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "STATSINK_DEBUG";

/// Environment variable for server host
pub const ENV_HOST: &str = "STATSINK_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "STATSINK_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "STATSINK_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port (status surface; 8125/8126 belong to the aggregator)
pub const DEFAULT_PORT: u16 = 8127;

// =============================================================================
// Environment Variables - Store
// =============================================================================

/// Environment variable for the PostgreSQL connection URL
pub const ENV_POSTGRES_URL: &str = "STATSINK_POSTGRES_URL";

/// Environment variable for the persistence write mode (batch or per-record)
pub const ENV_WRITE_MODE: &str = "STATSINK_WRITE_MODE";

// =============================================================================
// PostgreSQL Pool Defaults
// =============================================================================

/// Default maximum number of pooled connections
pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Default minimum number of connections kept warm
pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 2;

/// Default connection acquire timeout in seconds
pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Default idle connection timeout in seconds
pub const POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default max connection lifetime in seconds
pub const POSTGRES_DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

/// Default statement timeout in seconds (0 disables)
pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Topics
// =============================================================================

/// Topic carrying aggregator flush events into the stats pipeline
pub const TOPIC_FLUSH: &str = "stats.flush";

/// Environment variable for topic buffer size
pub const ENV_TOPIC_BUFFER_SIZE: &str = "STATSINK_TOPIC_BUFFER_SIZE";

/// Environment variable for topic channel capacity
pub const ENV_TOPIC_CHANNEL_CAPACITY: &str = "STATSINK_TOPIC_CHANNEL_CAPACITY";

/// Default topic buffer size (16 MB)
pub const DEFAULT_TOPIC_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Default topic channel capacity (message count)
pub const DEFAULT_TOPIC_CHANNEL_CAPACITY: usize = 10_000;

// =============================================================================
// Shutdown
// =============================================================================

/// Timeout for background tasks to finish during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Aggregator Self-Metrics
// =============================================================================

/// Keys the aggregator reports about itself on every flush. These are its own
/// bookkeeping and never reach the store.
pub const IGNORED_AGGREGATOR_METRICS: &[&str] = &[
    "statsd.bad_lines_seen",
    "statsd.packets_received",
    "statsd.metrics_received",
    "statsd.timestamp_lag",
    "processing_time",
];
