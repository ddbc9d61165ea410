//! Core application infrastructure

pub mod cli;
pub mod config;
pub mod constants;
pub mod shutdown;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use config::{AppConfig, PostgresConfig, ServerConfig, WriteMode, WriterConfig};
pub use shutdown::ShutdownService;

// Re-export topic types from data::topics for convenient access
pub use crate::data::topics::{
    Publisher, Subscriber, Topic, TopicConfig, TopicError, TopicMessage, TopicService,
};
