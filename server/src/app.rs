//! Core application

use std::sync::Arc;

use anyhow::Result;

use crate::api::ApiServer;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG, TOPIC_FLUSH};
use crate::core::shutdown::ShutdownService;
use crate::data::PostgresService;
use crate::data::postgres::repositories::PgStatRepository;
use crate::data::topics::TopicService;
use crate::data::traits::StatStore;
use crate::data::types::FlushEvent;
use crate::domain::StatsPipeline;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub store: Arc<PostgresService>,
    pub topics: Arc<TopicService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let store = Arc::new(
            PostgresService::init(&config.postgres)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize store: {}", e))?,
        );

        let topics = Arc::new(TopicService::new());
        let shutdown = ShutdownService::new(topics.clone(), store.clone());

        Ok(Self {
            shutdown,
            config,
            store,
            topics,
        })
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        app.start_background_tasks().await?;

        tracing::info!(
            host = %app.config.server.host,
            port = app.config.server.port,
            mode = %app.config.writer.mode,
            "statsink ready"
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }

    /// Start the stats pipeline on the flush topic
    async fn start_background_tasks(&self) -> Result<()> {
        let flush_topic = self
            .topics
            .topic::<FlushEvent>(TOPIC_FLUSH)
            .map_err(|e| anyhow::anyhow!("Failed to create flush topic: {}", e))?;

        let repository: Arc<dyn StatStore> =
            Arc::new(PgStatRepository::new(self.store.pool().clone()));

        let pipeline = StatsPipeline::new(repository, self.config.writer.mode);
        let handle = pipeline.start(flush_topic, self.shutdown.subscribe());
        self.shutdown.register(handle).await;

        tracing::debug!(
            topic = TOPIC_FLUSH,
            mode = %self.config.writer.mode,
            "Stats pipeline started"
        );
        Ok(())
    }
}
