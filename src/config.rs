use serde::Deserialize;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub const DEFAULT_NAME: &str = "Screambot";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} is not valid JSON: {source}")]
    Json {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{key} has an invalid ID for \"{label}\": {value:?}")]
    Id {
        key: &'static str,
        label: String,
        value: String,
    },

    #[error("{key} must be {expected}, got {value:?}")]
    Value {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// RGB colours for the command reply embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedColors {
    pub normal: u32,
    pub error: u32,
}

impl Default for EmbedColors {
    fn default() -> Self {
        Self {
            normal: 0xFFCC00,
            error: 0xDD2E44,
        }
    }
}

/// A colour as a number or a `#rrggbb` string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawColor {
    Number(u32),
    Hex(String),
}

#[derive(Debug, Deserialize)]
struct RawEmbedColors {
    normal: Option<RawColor>,
    error: Option<RawColor>,
}

/// Everything Screambot reads from its environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub admins: HashSet<UserId>,
    pub devs: HashSet<UserId>,
    pub do_not_reply: HashSet<UserId>,
    /// Channels Screambot may scream in, keyed by ID, with their labels.
    pub channels: HashMap<ChannelId, String>,
    pub nicknames: HashMap<GuildId, String>,
    pub name: String,
    pub activity: Option<String>,
    pub embed_colors: EmbedColors,
    /// Percent chance, 0 to 100.
    pub random_reply_chance: f64,
    /// Zero disables throttling.
    pub rate_limit: Duration,
    pub crash_on_error: bool,
    pub disable_logging: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_BOT_TOKEN"))?;

        let nicknames = match lookup("NICKNAMES") {
            Some(raw) => {
                let entries: HashMap<String, (String, String)> = parse_json("NICKNAMES", &raw)?;
                entries
                    .into_iter()
                    .map(|(label, (id, nickname))| {
                        parse_id("NICKNAMES", &label, &id).map(|id| (GuildId(id), nickname))
                    })
                    .collect::<Result<_>>()?
            }
            None => HashMap::new(),
        };

        let channels = labelled_ids(&lookup, "CHANNELS")?
            .into_iter()
            .map(|(label, id)| (ChannelId(id), label))
            .collect();

        Ok(Self {
            token,
            admins: user_ids(&lookup, "ADMINS")?,
            devs: user_ids(&lookup, "DEVS")?,
            do_not_reply: user_ids(&lookup, "DO_NOT_REPLY")?,
            channels,
            nicknames,
            name: lookup("NAME")
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            activity: lookup("ACTIVITY").filter(|activity| !activity.trim().is_empty()),
            embed_colors: embed_colors(&lookup, "EMBED_COLORS")?,
            random_reply_chance: percent(&lookup, "RANDOM_REPLY_CHANCE")?,
            rate_limit: Duration::from_millis(millis(&lookup, "RATE_LIMIT_MS")?),
            crash_on_error: flag(&lookup, "CRASH_ON_ERROR")?,
            disable_logging: flag(&lookup, "DISABLE_LOGGING")?,
        })
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user)
    }

    pub fn is_dev(&self, user: UserId) -> bool {
        self.devs.contains(&user)
    }

    pub fn in_do_not_reply(&self, user: UserId) -> bool {
        self.do_not_reply.contains(&user)
    }

    pub fn channel_is_allowed(&self, channel: ChannelId) -> bool {
        self.channels.contains_key(&channel)
    }

    /// The nickname for a guild, falling back to `name`.
    pub fn nickname_for(&self, guild: GuildId) -> &str {
        self.nicknames.get(&guild).unwrap_or(&self.name)
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(key: &'static str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| ConfigError::Json { key, source })
}

fn parse_id(key: &'static str, label: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| ConfigError::Id {
        key,
        label: label.to_string(),
        value: value.to_string(),
    })
}

fn labelled_ids<F>(lookup: &F, key: &'static str) -> Result<Vec<(String, u64)>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(Vec::new());
    };
    let entries: HashMap<String, String> = parse_json(key, &raw)?;
    entries
        .into_iter()
        .map(|(label, id)| parse_id(key, &label, &id).map(|id| (label, id)))
        .collect()
}

fn user_ids<F>(lookup: &F, key: &'static str) -> Result<HashSet<UserId>>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(labelled_ids(lookup, key)?
        .into_iter()
        .map(|(_, id)| UserId(id))
        .collect())
}

fn embed_colors<F>(lookup: &F, key: &'static str) -> Result<EmbedColors>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = EmbedColors::default();
    let Some(raw) = lookup(key) else {
        return Ok(defaults);
    };
    let raw: RawEmbedColors = parse_json(key, &raw)?;
    Ok(EmbedColors {
        normal: color(key, raw.normal, defaults.normal)?,
        error: color(key, raw.error, defaults.error)?,
    })
}

fn color(key: &'static str, raw: Option<RawColor>, default: u32) -> Result<u32> {
    let invalid = |value: String| ConfigError::Value {
        key,
        expected: "a colour number or a #rrggbb string",
        value,
    };
    let value = match raw {
        None => return Ok(default),
        Some(RawColor::Number(value)) => value,
        Some(RawColor::Hex(hex)) => {
            let digits = hex
                .trim()
                .trim_start_matches('#')
                .trim_start_matches("0x");
            u32::from_str_radix(digits, 16).map_err(|_| invalid(hex.clone()))?
        }
    };
    if value > 0xFFFFFF {
        return Err(invalid(value.to_string()));
    }
    Ok(value)
}

fn percent<F>(lookup: &F, key: &'static str) -> Result<f64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(0.0);
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if (0.0..=100.0).contains(&value) => Ok(value),
        _ => Err(ConfigError::Value {
            key,
            expected: "a percentage between 0 and 100",
            value: raw,
        }),
    }
}

fn millis<F>(lookup: &F, key: &'static str) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(0);
    };
    raw.trim().parse().map_err(|_| ConfigError::Value {
        key,
        expected: "a non-negative number of milliseconds",
        value: raw,
    })
}

fn flag<F>(lookup: &F, key: &'static str) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Value {
            key,
            expected: "true or false",
            value: raw,
        }),
    }
}
