//! Configuration for running this bot.

use std::collections::HashSet;
use std::time::Duration;

use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::GuildId;
use serenity::UserId;

use crate::error::ConfigError;
use crate::serenity;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Environment variable that takes precedence over `discord_token`.
const TOKEN_VAR: &str = "DISCORD_TOKEN";

/// Placeholder written to fresh config files.
const PLACEHOLDER_TOKEN: &str = "put_token_here";

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account. Overridden by `DISCORD_TOKEN`.
    discord_token: String,

    /// See [LoggingConfig]
    logging: LoggingConfig,

    /// Useful developer specific configs.
    dev_utils: DevConfig,

    /// See [WelcomeConfig]
    #[serde(default)]
    welcome: WelcomeConfig,

    /// See [ScriptureConfig]
    #[serde(default)]
    scripture: ScriptureConfig,

    /// See [LimitsConfig]
    #[serde(default)]
    limits: LimitsConfig,
}

impl Config {
    /// Tries to read [CONFIG_PATH] to extract a [Config].
    /// If a file doesn't exists, create the default config file and returns error.
    /// If a file exists but is empty, re-write the default values and return error.
    /// If a file exists but is incomplete, show error and don't change files.
    /// If a file exists and is complete, read file to create a config.
    /// If file existance is indeterminent (e.g. missing permissions), return error.
    pub fn read() -> Result<Config, ConfigError> {
        match std::fs::read_to_string(CONFIG_PATH) {
            Ok(content) if content.trim().is_empty() => {
                write_file(&Config::default())?;
                Err(ConfigError::InvalidConfig {
                    reason: format!("Empty config file! Rewriting {CONFIG_PATH} ..."),
                })
            }
            Ok(content) => Config::parse(&content),
            Err(file_error) => match file_error.kind() {
                std::io::ErrorKind::NotFound => {
                    write_file(&Config::default())?;
                    Err(ConfigError::MissingConfig {
                        action_msg: format!("Created {CONFIG_PATH}."),
                    })
                }
                _ => Err(ConfigError::IoError(file_error)),
            },
        }
    }

    /// Parse config file contents, naming the offending key on failure.
    fn parse(content: &str) -> Result<Config, ConfigError> {
        let to_toml = toml::Deserializer::new(content);
        serde_path_to_error::deserialize(to_toml).map_err(|error| ConfigError::InvalidConfig {
            reason: error.to_string(),
        })
    }

    /// The bot token, from `DISCORD_TOKEN` if set, otherwise from the file.
    pub fn token(&self) -> Result<String, ConfigError> {
        resolve_token(std::env::var(TOKEN_VAR).ok(), &self.discord_token)
    }

    /// Construct a bug notification notify list based on the config.
    /// Wrapper for [NotifyConfig::notify_list]
    pub fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        self.dev_utils.notifications.notify_list(fw)
    }

    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }

    pub fn dev_guild(&self) -> Option<GuildId> {
        self.dev_utils.dev_guild
    }

    pub fn welcome(&self) -> &WelcomeConfig {
        &self.welcome
    }

    pub fn scripture(&self) -> &ScriptureConfig {
        &self.scripture
    }

    /// Upper bound for any single call to Discord or a verse API.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.request_timeout_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: PLACEHOLDER_TOKEN.to_string(),

            logging: LoggingConfig {
                console_debug: false,
                logs_enabled: true,
                log_dir: "logs".to_string(),
            },

            dev_utils: DevConfig {
                dev_guild: None,
                notifications: NotifyConfig {
                    enabled: false,
                    add_owners: true,
                    userids: vec![],
                },
            },

            welcome: WelcomeConfig::default(),
            scripture: ScriptureConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Pick the env token over the file token, rejecting blanks and the placeholder.
fn resolve_token(env: Option<String>, file: &str) -> Result<String, ConfigError> {
    let token = env
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| file.trim().to_string());

    if token.is_empty() || token.contains(PLACEHOLDER_TOKEN) {
        Err(ConfigError::InvalidConfig {
            reason: format!("Missing discord token. Set {TOKEN_VAR} or `discord_token`."),
        })
    } else {
        Ok(token)
    }
}

/// Configs for
#[derive(Debug, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to automatically update commands quickly.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Serialize, Deserialize)]
struct NotifyConfig {
    /// Enable this behavior or not. (bot sends a private message)
    enabled: bool,
    /// Whether to automatically add owners to the notify list.
    add_owners: bool,
    /// Additional users to add to the notify list.
    userids: Vec<UserId>,
}

impl NotifyConfig {
    /// Construct a bug notification notify list based on the config.
    fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        if !self.enabled {
            return HashSet::new();
        }

        let owners = if self.add_owners {
            fw.options().owners.clone()
        } else {
            HashSet::new()
        };

        owners.into_iter().chain(self.userids.iter().copied()).collect()
    }
}

/// Greeting posted when someone joins a guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeConfig {
    /// Post greetings at all? Needs the privileged members intent.
    pub enabled: bool,
    /// `{user}` and `{server}` are replaced.
    pub message: String,
}

impl Default for WelcomeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            message: "Welcome to {server}, {user}! Make yourself at home.".to_string(),
        }
    }
}

impl WelcomeConfig {
    pub fn render(&self, user: &str, server: &str) -> String {
        self.message
            .replace("{user}", user)
            .replace("{server}", server)
    }
}

/// Where verses come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptureConfig {
    /// Reference lookups and the daily verse.
    pub bible_api_url: String,
    /// Free-text search.
    pub search_api_url: String,
    /// Translation code for `bible_api_url`, e.g. `web` or `kjv`.
    pub translation: String,
    /// Translation code for `search_api_url`, e.g. `WEB` or `KJV`.
    pub search_translation: String,
}

impl Default for ScriptureConfig {
    fn default() -> Self {
        Self {
            bible_api_url: "https://bible-api.com".to_string(),
            search_api_url: "https://bolls.life".to_string(),
            translation: "web".to_string(),
            search_translation: "WEB".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LimitsConfig {
    /// Seconds before a call to Discord or a verse API is abandoned.
    request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
        }
    }
}

/// Write the given config to [CONFIG_PATH].
fn write_file(config: &Config) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidConfig {
        reason: e.to_string(),
    })?;
    std::fs::write(CONFIG_PATH, content).map_err(ConfigError::IoError)
}

fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<GuildId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_str(OptVisitor)
}

fn serialize_opt<T, S>(val: &Option<T>, ser: S) -> Result<S::Ok, S::Error>
where
    T: serde::Serialize,
    S: serde::Serializer,
{
    match val {
        Some(v) => v.serialize(ser),
        None => ser.serialize_str(""),
    }
}

struct OptVisitor;

impl<'de> serde::de::Visitor<'de> for OptVisitor {
    type Value = Option<GuildId>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a valid guild id")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v {
            "" => Ok(None),
            _ => {
                let num: u64 = v.parse().map_err(|_| E::custom("not u64"))?;
                Ok(Some(GuildId::new(num)))
            }
        }
    }
}
