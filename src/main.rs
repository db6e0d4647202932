mod config;
mod event_manager;
mod rate_limit;
mod report;
mod router;
mod scream;

use crate::config::Config;
use crate::event_manager::Handler;
use crate::rate_limit::RateLimiter;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    // Respects RUST_LOG, defaults to info, silenced by DISABLE_LOGGING.
    let filter = match &config {
        Ok(config) if config.disable_logging => EnvFilter::new("off"),
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match config {
        Ok(config) => Arc::new(config),
        Err(why) => {
            error!(error = %why, "invalid configuration, Screambot cannot continue");
            std::process::exit(1);
        }
    };
    info!("Screambot started.");

    if config.channels.is_empty() {
        warn!("No channels specified to scream in.");
    }
    for (id, label) in &config.channels {
        info!(%id, %label, "channel registered");
    }

    let gate = Arc::new(RateLimiter::start(config.rate_limit));
    info!(
        cooldown_ms = gate.cooldown().as_millis() as u64,
        disabled = gate.is_disabled(),
        "scream rate limit"
    );

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let mut client = match Client::builder(&config.token, intents)
        .event_handler(Handler::new(Arc::clone(&config), gate))
        .await
    {
        Ok(client) => client,
        Err(why) => {
            error!(error = %why, "error creating client");
            std::process::exit(1);
        }
    };

    let shard_manager = Arc::clone(&client.shard_manager);
    let http = Arc::clone(&client.cache_and_http.http);
    let shutdown_config = Arc::clone(&config);
    tokio::spawn(async move {
        if let Err(why) = tokio::signal::ctrl_c().await {
            error!(error = %why, "could not listen for ctrl-c");
            return;
        }
        warn!("About to exit, logging out...");
        report::pm_the_devs(&http, &shutdown_config, "Logging out.").await;

        let mut shard_manager = shard_manager.lock().await;
        for runner in shard_manager.runners.lock().await.values() {
            runner.runner_tx.set_activity(Some(event_manager::shutdown_activity()));
        }
        shard_manager.shutdown_all().await;
    });

    info!("Logging in...");
    // A single shard covers Screambot's handful of servers.
    if let Err(why) = client.start().await {
        error!(error = %why, "an error occurred while running the client");
        std::process::exit(1);
    }
    info!("Logged out.");
}
