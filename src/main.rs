//! Gauntlet - challenge lifecycle engine for group fitness competitions

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gauntlet::{
    auth::{IdentityProvider, StaticIdentity},
    config::Args,
    db::MongoClient,
    scheduler::{spawn_scheduler_task, LifecycleScheduler},
    store::{
        ChallengeStore, MemoryStore, MembershipStore, MongoChallengeStore, MongoMembershipStore,
        MongoRecordStore, RecordStore,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gauntlet={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Gauntlet - Challenge Engine");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", args.mongodb_uri);
    let (hour, minute, second) = args.scheduler_fire_time();
    info!(
        "Scheduler: {} (fire time {:02}:{:02}:{:02} UTC)",
        if args.scheduler_enabled { "enabled" } else { "disabled" },
        hour, minute, second
    );
    info!("======================================");

    // Select the store backend: MongoDB in production, in-memory in dev mode
    let (challenges, memberships, records): (
        Arc<dyn ChallengeStore>,
        Arc<dyn MembershipStore>,
        Arc<dyn RecordStore>,
    ) = if args.dev_mode {
        warn!("Dev mode: using in-memory store, state is not persisted");
        let identity = StaticIdentity::dev(args.dev_member_id);
        if let Ok(member) = identity.current_member().await {
            info!("Dev identity bound: {} ({})", member.id, member.display_name);
        }
        let store = Arc::new(MemoryStore::new());
        (store.clone(), store.clone(), store)
    } else {
        match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(client) => {
                info!("MongoDB connected successfully");
                (
                    Arc::new(MongoChallengeStore::new(&client).await?),
                    Arc::new(MongoMembershipStore::new(&client).await?),
                    Arc::new(MongoRecordStore::new(&client).await?),
                )
            }
            Err(e) => {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Start the daily lifecycle scheduler
    let scheduler_handle = if args.scheduler_enabled {
        let scheduler = Arc::new(LifecycleScheduler::new(challenges, memberships, records));
        Some(spawn_scheduler_task(scheduler, args.scheduler_fire_time()))
    } else {
        warn!("Lifecycle scheduler disabled, challenge statuses will not advance");
        None
    };

    // Wait for shutdown signal
    match scheduler_handle {
        Some(handle) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                }
                result = handle => {
                    if let Err(e) = result {
                        error!("Scheduler task error: {}", e);
                    }
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Received shutdown signal");
        }
    }

    info!("Gauntlet shutting down");
    Ok(())
}
