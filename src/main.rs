use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use lead_bot::bot::{BotDeps, LeadBot};
use lead_bot::channels::{ChannelManager, CliChannel, TelegramChannel};
use lead_bot::config::BotConfig;
use lead_bot::funnel::FunnelEngine;
use lead_bot::leads::{FanoutNotifier, JsonlNotifier, LogNotifier, TelegramNotifier};
use lead_bot::session::InMemorySessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BotConfig::from_env()?;

    // Initialize tracing: stderr always, plus a daily file when configured.
    // The guard must live until exit so buffered lines get flushed.
    let (file_layer, _log_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lead-bot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    eprintln!("🎓 Lead Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Phone digits: {}..={}",
        config.phone_min_digits, config.phone_max_digits
    );
    match config.session_idle_timeout {
        Some(idle) => eprintln!("   Session idle timeout: {}s", idle.as_secs()),
        None => eprintln!("   Session idle timeout: disabled"),
    }
    if let Some(ref dir) = config.log_dir {
        eprintln!("   Log dir: {}", dir.display());
    }

    // ── Lead sinks ───────────────────────────────────────────────────────
    let mut notifier = FanoutNotifier::new().with(Arc::new(LogNotifier));
    let mut sinks = vec!["log".to_string()];

    if let Some(ref path) = config.leads_file {
        notifier = notifier.with(Arc::new(JsonlNotifier::new(path)));
        sinks.push(format!("jsonl ({})", path.display()));
    }

    match (&config.bot_token, &config.manager_chat_id) {
        (Some(token), Some(chat_id)) => {
            let sender = TelegramChannel::new(token.expose_secret().to_string(), Vec::new());
            notifier = notifier.with(Arc::new(TelegramNotifier::new(sender, chat_id)));
            sinks.push(format!("telegram ({})", chat_id));
        }
        (None, Some(_)) => {
            eprintln!("   Warning: LEAD_MANAGER_CHAT_ID is set but BOT_TOKEN is not; skipping");
        }
        _ => {}
    }
    eprintln!("   Lead sinks: {}", sinks.join(", "));

    // ── Channels ─────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();

    match config.bot_token {
        Some(ref token) if config.use_telegram() => {
            let allowed_users = config.allowed_users.clone();
            eprintln!(
                "   Telegram: enabled (allowed: {})",
                if allowed_users.iter().any(|u| u == "*") {
                    "everyone".to_string()
                } else {
                    allowed_users.join(", ")
                }
            );
            channels.add(Box::new(TelegramChannel::new(
                token.expose_secret().to_string(),
                allowed_users,
            )));
        }
        _ => {
            eprintln!("   Channel: cli (type /start to begin, /cancel to abort)\n");
            channels.add(Box::new(CliChannel::new()));
        }
    }

    // ── Bot ──────────────────────────────────────────────────────────────
    let deps = BotDeps {
        engine: FunnelEngine::new(config.phone_rule()),
        sessions: Arc::new(InMemorySessionStore::new()),
        notifier: Arc::new(notifier),
    };

    let bot = LeadBot::new(deps, channels).with_session_idle_timeout(config.session_idle_timeout);
    bot.run().await?;

    Ok(())
}
