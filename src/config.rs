//! Configuration for Gauntlet
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use uuid::Uuid;

/// Gauntlet - challenge lifecycle engine for group fitness competitions
#[derive(Parser, Debug, Clone)]
#[command(name = "gauntlet")]
#[command(about = "Challenge lifecycle engine for group fitness competitions")]
pub struct Args {
    /// Unique node identifier for this engine instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Enable development mode (in-memory store, static identity)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "gauntlet")]
    pub mongodb_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Enable the daily lifecycle scheduler
    #[arg(long, env = "SCHEDULER_ENABLED", default_value = "true")]
    pub scheduler_enabled: bool,

    /// Hour of day (UTC) at which the lifecycle scheduler fires
    #[arg(long, env = "SCHEDULER_HOUR", default_value = "0")]
    pub scheduler_hour: u32,

    /// Minute at which the lifecycle scheduler fires
    #[arg(long, env = "SCHEDULER_MINUTE", default_value = "0")]
    pub scheduler_minute: u32,

    /// Second at which the lifecycle scheduler fires
    #[arg(long, env = "SCHEDULER_SECOND", default_value = "10")]
    pub scheduler_second: u32,

    /// Member bound as the caller in dev mode (static identity provider)
    #[arg(long, env = "DEV_MEMBER_ID")]
    pub dev_member_id: Option<Uuid>,
}

impl Args {
    /// Scheduler fire time as (hour, minute, second)
    pub fn scheduler_fire_time(&self) -> (u32, u32, u32) {
        (self.scheduler_hour, self.scheduler_minute, self.scheduler_second)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.scheduler_hour > 23 {
            return Err("SCHEDULER_HOUR must be in 0..=23".to_string());
        }
        if self.scheduler_minute > 59 {
            return Err("SCHEDULER_MINUTE must be in 0..=59".to_string());
        }
        if self.scheduler_second > 59 {
            return Err("SCHEDULER_SECOND must be in 0..=59".to_string());
        }
        if self.mongodb_db.is_empty() {
            return Err("MONGODB_DB must not be empty".to_string());
        }
        Ok(())
    }
}
