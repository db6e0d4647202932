use crate::config::Config;
use crate::scream::chance;
use rand::Rng;
use serenity::model::id::{ChannelId, UserId};
use std::fmt;

/// What made Screambot want to scream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Mentioned,
    Screamed,
    DirectMessage,
    RandomChance,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Mentioned => "mentioned",
            Trigger::Screamed => "screamed at",
            Trigger::DirectMessage => "direct message",
            Trigger::RandomChance => "random chance",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Admin,
    Dev,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    SayIn(ChannelId, String),
    ScreamIn(ChannelId),
    Servers,
    Unknown(String),
}

impl Command {
    /// `@Screambot <keyword> <args…>`, with the mention already stripped.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (keyword, rest) = split_word(text);

        match keyword.to_ascii_lowercase().as_str() {
            "say" if !rest.is_empty() => Command::Say(rest.to_string()),
            "sayin" => {
                let (channel, message) = split_word(rest);
                match parse_channel(channel) {
                    Some(channel) if !message.is_empty() => {
                        Command::SayIn(channel, message.to_string())
                    }
                    _ => Command::Unknown(text.to_string()),
                }
            }
            "screamin" => match parse_channel(rest) {
                Some(channel) => Command::ScreamIn(channel),
                None => Command::Unknown(text.to_string()),
            },
            "servers" if rest.is_empty() => Command::Servers,
            _ => Command::Unknown(text.to_string()),
        }
    }

    pub fn required_rank(&self) -> Rank {
        match self {
            Command::Servers => Rank::Dev,
            _ => Rank::Admin,
        }
    }

    /// Devs may run everything admins may.
    pub fn permitted_for(&self, rank: Rank) -> bool {
        rank >= self.required_rank()
    }
}

/// The facts about an incoming message that routing depends on.
#[derive(Debug, Clone, Copy)]
pub struct Incoming<'a> {
    pub content: &'a str,
    pub author: UserId,
    pub channel: ChannelId,
    pub is_dm: bool,
    pub mentions_me: bool,
    pub me: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ignore,
    Scream(Trigger),
    Command(Rank, Command),
}

pub fn rank_of(config: &Config, user: UserId) -> Option<Rank> {
    if config.is_dev(user) {
        Some(Rank::Dev)
    } else if config.is_admin(user) {
        Some(Rank::Admin)
    } else {
        None
    }
}

pub fn route<R: Rng + ?Sized>(config: &Config, msg: &Incoming<'_>, rng: &mut R) -> Action {
    if msg.author == msg.me || config.in_do_not_reply(msg.author) {
        return Action::Ignore;
    }

    if let Some(text) = command_text(msg.content, msg.me) {
        if let Some(rank) = rank_of(config, msg.author) {
            return Action::Command(rank, Command::parse(text));
        }
    }

    let may_scream = msg.is_dm || config.channel_is_allowed(msg.channel);
    if !may_scream {
        return Action::Ignore;
    }

    if msg.mentions_me {
        Action::Scream(Trigger::Mentioned)
    } else if msg.is_dm {
        Action::Scream(Trigger::DirectMessage)
    } else if msg.content.to_uppercase().contains("AAA") {
        Action::Scream(Trigger::Screamed)
    } else if chance(rng, config.random_reply_chance) {
        Action::Scream(Trigger::RandomChance)
    } else {
        Action::Ignore
    }
}

/// Whatever follows a leading mention of `me`, if anything does.
fn command_text(content: &str, me: UserId) -> Option<&str> {
    let (first, rest) = split_word(content.trim());
    if parse_mention(first)? != me || rest.is_empty() {
        return None;
    }
    Some(rest)
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (text, ""),
    }
}

/// Accepts `<@id>` and the nickname form `<@!id>`.
fn parse_mention(word: &str) -> Option<UserId> {
    let id = word.strip_prefix("<@")?.strip_suffix('>')?;
    let id = id.strip_prefix('!').unwrap_or(id);
    id.parse().ok().map(UserId)
}

/// Accepts a bare ID or a `<#id>` channel mention.
fn parse_channel(word: &str) -> Option<ChannelId> {
    let word = word.trim();
    let id = word
        .strip_prefix("<#")
        .and_then(|id| id.strip_suffix('>'))
        .unwrap_or(word);
    id.parse().ok().map(ChannelId)
}
