//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::funnel::PhoneRule;
use crate::funnel::classify::{DEFAULT_PHONE_MAX_DIGITS, DEFAULT_PHONE_MIN_DIGITS};

/// Bot configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token. Without one the bot runs on the CLI.
    pub bot_token: Option<SecretString>,
    /// Telegram usernames or numeric ids allowed to talk to the bot (`*` = everyone).
    pub allowed_users: Vec<String>,
    /// Telegram chat that receives finished leads.
    pub manager_chat_id: Option<String>,
    /// JSON Lines file that receives finished leads.
    pub leads_file: Option<PathBuf>,
    pub phone_min_digits: usize,
    pub phone_max_digits: usize,
    /// Sessions idle for longer than this are dropped. `None` keeps them forever.
    pub session_idle_timeout: Option<Duration>,
    /// Use the stdin/stdout channel even if a token is set.
    pub force_cli: bool,
    /// Directory for daily rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowed_users: vec!["*".to_string()],
            manager_chat_id: None,
            leads_file: None,
            phone_min_digits: DEFAULT_PHONE_MIN_DIGITS,
            phone_max_digits: DEFAULT_PHONE_MAX_DIGITS,
            session_idle_timeout: Some(Duration::from_secs(86_400)), // 24 hours
            force_cli: false,
            log_dir: None,
        }
    }
}

impl BotConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = non_empty("BOT_TOKEN").map(SecretString::from);

        let allowed_users = match non_empty("TELEGRAM_ALLOWED_USERS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.allowed_users,
        };

        let phone_min_digits = parse_or(
            "LEAD_BOT_PHONE_MIN_DIGITS",
            non_empty("LEAD_BOT_PHONE_MIN_DIGITS"),
            defaults.phone_min_digits,
        )?;
        let phone_max_digits = parse_or(
            "LEAD_BOT_PHONE_MAX_DIGITS",
            non_empty("LEAD_BOT_PHONE_MAX_DIGITS"),
            defaults.phone_max_digits,
        )?;
        if phone_min_digits == 0 || phone_min_digits > phone_max_digits {
            return Err(ConfigError::InvalidValue {
                key: "LEAD_BOT_PHONE_MIN_DIGITS".to_string(),
                message: format!(
                    "must be between 1 and LEAD_BOT_PHONE_MAX_DIGITS ({phone_max_digits}), got {phone_min_digits}"
                ),
            });
        }

        let idle_secs: u64 = parse_or(
            "LEAD_BOT_SESSION_IDLE_SECS",
            non_empty("LEAD_BOT_SESSION_IDLE_SECS"),
            86_400,
        )?;
        let session_idle_timeout = (idle_secs > 0).then(|| Duration::from_secs(idle_secs));

        let force_cli = match non_empty("LEAD_BOT_CLI") {
            Some(v) => parse_bool("LEAD_BOT_CLI", &v)?,
            None => false,
        };

        Ok(Self {
            bot_token,
            allowed_users,
            manager_chat_id: non_empty("LEAD_MANAGER_CHAT_ID"),
            leads_file: non_empty("LEAD_BOT_LEADS_FILE").map(PathBuf::from),
            phone_min_digits,
            phone_max_digits,
            session_idle_timeout,
            force_cli,
            log_dir: non_empty("LEAD_BOT_LOG_DIR").map(PathBuf::from),
        })
    }

    /// Phone extraction rule for the configured digit range.
    pub fn phone_rule(&self) -> PhoneRule {
        PhoneRule::new(self.phone_min_digits, self.phone_max_digits)
    }

    /// Whether the Telegram channel should run.
    pub fn use_telegram(&self) -> bool {
        self.bot_token.is_some() && !self.force_cli
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{v:?}: {e}"),
        }),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
