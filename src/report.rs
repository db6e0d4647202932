use crate::config::Config;
use serenity::{http::Http, model::id::UserId};
use std::fmt::Display;
use tracing::{debug, error, warn};

pub async fn pm(http: &Http, user: UserId, text: &str) -> serenity::Result<()> {
    let channel = user.create_dm_channel(http).await?;
    channel.say(http, text).await?;
    Ok(())
}

/// DMs every dev. Failures are only logged.
pub async fn pm_the_devs(http: &Http, config: &Config, text: &str) {
    for dev in &config.devs {
        match pm(http, *dev, text).await {
            Ok(()) => debug!(user = %dev, text, "sent message to dev"),
            Err(why) => warn!(user = %dev, error = %why, "could not message dev"),
        }
    }
}

/// For nonfatal errors, unless `CRASH_ON_ERROR` says otherwise.
pub async fn log_error(http: &Http, config: &Config, err: impl Display) {
    error!(error = %err, "screambot hit an error");
    pm_the_devs(http, config, &format!("Error: {err}")).await;

    if config.crash_on_error {
        error!("CRASH_ON_ERROR is set, exiting");
        std::process::exit(1);
    }
}
