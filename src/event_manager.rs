use crate::{
    config::Config,
    rate_limit::RateLimiter,
    report,
    router::{self, Action, Command, Incoming, Rank, Trigger},
    scream::{self, ScreamStyle},
};
use serenity::{
    async_trait,
    client::{Context, EventHandler},
    model::{
        channel::Message,
        gateway::{Activity, Ready},
        guild::{Guild, UnavailableGuild},
        id::{ChannelId, GuildId},
    },
    utils::Color,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Handler {
    config: Arc<Config>,
    gate: Arc<RateLimiter>,
}

impl Handler {
    pub fn new(config: Arc<Config>, gate: Arc<RateLimiter>) -> Self {
        Self { config, gate }
    }

    /// "server/#channel-id" for logs, or "DM".
    fn location(ctx: &Context, msg: &Message) -> String {
        match msg.guild_id {
            Some(guild_id) => {
                let guild = ctx
                    .cache
                    .guild_field(guild_id, |guild| guild.name.clone())
                    .unwrap_or_else(|| guild_id.to_string());
                format!("{guild}/#{}", msg.channel_id)
            }
            None => "DM".to_string(),
        }
    }

    async fn apply_nickname(&self, ctx: &Context, guild_id: GuildId) {
        let nickname = self.config.nickname_for(guild_id);
        match guild_id.edit_nickname(&ctx.http, Some(nickname)).await {
            Ok(()) => info!(guild = %guild_id, nickname, "set nickname"),
            Err(why) => report::log_error(&ctx.http, &self.config, why).await,
        }
    }

    async fn scream(&self, ctx: &Context, msg: &Message, trigger: Trigger) {
        let location = Self::location(ctx, msg);
        info!(author = %msg.author.name, %location, %trigger, "scream triggered");

        if !self.gate.try_acquire() {
            info!(%location, "rate limited");
            return;
        }

        let style = ScreamStyle::roll(&mut rand::thread_rng());
        let text = style.to_string();
        match msg.channel_id.say(&ctx.http, &text).await {
            Ok(_) => info!(
                length = style.length(),
                vanilla = style.is_vanilla(),
                wrapped = style.wrapper().is_some(),
                lowercase = style.is_lowercase(),
                "screamed"
            ),
            Err(why) => report::log_error(&ctx.http, &self.config, why).await,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let me = ctx.cache.current_user_id();
        let incoming = Incoming {
            content: &msg.content,
            author: msg.author.id,
            channel: msg.channel_id,
            is_dm: msg.guild_id.is_none(),
            mentions_me: msg.mentions_user_id(me),
            me,
        };
        let action = router::route(&self.config, &incoming, &mut rand::thread_rng());

        match action {
            Action::Ignore => {}
            Action::Scream(trigger) => self.scream(&ctx, &msg, trigger).await,
            Action::Command(rank, command) => {
                info!(
                    author = %msg.author.name,
                    location = %Self::location(&ctx, &msg),
                    ?rank,
                    ?command,
                    "received command"
                );
                if let Err(why) = ScreamCommands::run(&ctx, &self.config, &msg, rank, command).await
                {
                    report::log_error(&ctx.http, &self.config, why).await;
                }
            }
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.tag(), guilds = ready.guilds.len(), "logged in");

        if let Some(activity) = &self.config.activity {
            ctx.set_activity(Activity::playing(activity)).await;
        }
        for guild in &ready.guilds {
            self.apply_nickname(&ctx, guild.id).await;
        }

        report::pm_the_devs(&ctx.http, &self.config, "Logged in.").await;
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: bool) {
        if !is_new {
            return;
        }
        info!(
            name = %guild.name,
            id = %guild.id,
            members = guild.member_count,
            "joined a new server"
        );
        self.apply_nickname(&ctx, guild.id).await;
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, full: Option<Guild>) {
        let name = full.map(|guild| guild.name);
        if incomplete.unavailable {
            warn!(id = %incomplete.id, ?name, "server became unavailable");
        } else {
            info!(id = %incomplete.id, ?name, "removed from server");
        }
    }
}

pub struct ScreamCommands;
impl ScreamCommands {
    pub async fn run(
        ctx: &Context,
        config: &Config,
        msg: &Message,
        rank: Rank,
        command: Command,
    ) -> serenity::Result<()> {
        let origin = msg.channel_id;
        if !command.permitted_for(rank) {
            return Self::reply_error(ctx, config, origin, "You are not allowed to do that.").await;
        }

        match command {
            Command::Say(text) => {
                origin.say(&ctx.http, text).await?;
                Ok(())
            }
            Command::SayIn(target, text) => Self::say_in(ctx, config, origin, target, &text).await,
            Command::ScreamIn(target) => {
                Self::say_in(ctx, config, origin, target, &scream::generate()).await
            }
            Command::Servers => Self::servers(ctx, config, origin).await,
            Command::Unknown(text) => {
                let reason = format!("Unknown command: `{text}`");
                Self::reply_error(ctx, config, origin, &reason).await
            }
        }
    }

    async fn say_in(
        ctx: &Context,
        config: &Config,
        origin: ChannelId,
        target: ChannelId,
        text: &str,
    ) -> serenity::Result<()> {
        if !config.channel_is_allowed(target) {
            let reason =
                format!("Screambot is not allowed to scream in the channel with the ID {target}.");
            return Self::reply_error(ctx, config, origin, &reason).await;
        }

        target.say(&ctx.http, text).await?;
        if origin != target {
            Self::reply(ctx, config, origin, &format!("Sent to <#{target}>.")).await?;
        }
        Ok(())
    }

    async fn servers(ctx: &Context, config: &Config, origin: ChannelId) -> serenity::Result<()> {
        let lines: Vec<String> = ctx
            .cache
            .guilds()
            .into_iter()
            .map(|id| {
                ctx.cache
                    .guild_field(id, |guild| {
                        format!("{} (ID: {}, {} members)", guild.name, guild.id, guild.member_count)
                    })
                    .unwrap_or_else(|| format!("unknown (ID: {id})"))
            })
            .collect();

        if lines.is_empty() {
            return Self::reply(ctx, config, origin, "Not in any servers.").await;
        }
        for page in paginate(&lines, DESCRIPTION_LIMIT) {
            Self::reply(ctx, config, origin, &page).await?;
        }
        Ok(())
    }

    async fn reply(
        ctx: &Context,
        config: &Config,
        channel: ChannelId,
        text: &str,
    ) -> serenity::Result<()> {
        Self::send_embed(ctx, channel, "SCREAMBOT", text, config.embed_colors.normal).await
    }

    async fn reply_error(
        ctx: &Context,
        config: &Config,
        channel: ChannelId,
        text: &str,
    ) -> serenity::Result<()> {
        Self::send_embed(ctx, channel, "Error", text, config.embed_colors.error).await
    }

    async fn send_embed(
        ctx: &Context,
        channel: ChannelId,
        title: &str,
        text: &str,
        color: u32,
    ) -> serenity::Result<()> {
        channel
            .send_message(&ctx.http, |msg| {
                msg.embed(|embed| embed.title(title).description(text).color(Color::new(color)))
            })
            .await?;
        Ok(())
    }
}

/// Discord's cap on an embed description, in characters.
const DESCRIPTION_LIMIT: usize = 4096;

/// Packs lines into newline-joined pages of at most `limit` characters.
/// A line that is too long on its own is cut short.
fn paginate(lines: &[String], limit: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut page = String::new();
    let mut page_len = 0;

    for line in lines {
        let line: String = line.chars().take(limit).collect();
        let line_len = line.chars().count();
        let needed = if page.is_empty() { line_len } else { line_len + 1 };

        if page_len + needed > limit {
            pages.push(std::mem::take(&mut page));
            page_len = 0;
        }
        if !page.is_empty() {
            page.push('\n');
            page_len += 1;
        }
        page.push_str(&line);
        page_len += line_len;
    }
    if !page.is_empty() {
        pages.push(page);
    }
    pages
}

/// Shown while Screambot logs out.
pub fn shutdown_activity() -> Activity {
    Activity::playing(format!("SHUTTING DOWN {}", "A".repeat(36)))
}
