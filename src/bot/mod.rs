//! Bot dispatcher — connects channels, the session store, the funnel engine
//! and lead sinks.
//!
//! Messages are handled strictly one at a time, so every session has a
//! single writer and needs no locking of its own.

pub mod command;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse};
use crate::error::Error;
use crate::funnel::{FunnelEngine, Input, Session};
use crate::leads::LeadNotifier;
use crate::session::SessionStore;

pub use command::{Command, CommandParser};

/// How often idle sessions are swept.
const PRUNE_INTERVAL: Duration = Duration::from_secs(600);

/// Collaborators the bot needs to handle a message.
pub struct BotDeps {
    pub engine: FunnelEngine,
    pub sessions: Arc<dyn SessionStore>,
    pub notifier: Arc<dyn LeadNotifier>,
}

/// The lead qualification bot.
pub struct LeadBot {
    deps: BotDeps,
    channels: Arc<ChannelManager>,
    session_idle_timeout: Option<Duration>,
}

impl LeadBot {
    pub fn new(deps: BotDeps, channels: ChannelManager) -> Self {
        Self {
            deps,
            channels: Arc::new(channels),
            session_idle_timeout: None,
        }
    }

    /// Drop sessions idle for longer than `timeout` while running.
    pub fn with_session_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.session_idle_timeout = timeout;
        self
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Run until Ctrl+C or until every channel stream ends.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        let pruning_handle = self.session_idle_timeout.map(|idle| {
            let sessions = Arc::clone(&self.deps.sessions);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(PRUNE_INTERVAL);
                interval.tick().await; // Skip immediate first tick
                loop {
                    interval.tick().await;
                    sessions.prune_idle(idle).await;
                }
            })
        });

        info!(channels = ?self.channels.names(), "Lead bot ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            if let Some(response) = self.handle_message(&message).await {
                if let Err(e) = self.channels.respond(&message, response).await {
                    warn!(channel = %message.channel, "Failed to send response: {}", e);
                }
            }
        }

        info!("Lead bot shutting down...");
        if let Some(handle) = pruning_handle {
            handle.abort();
        }
        self.channels.shutdown_all().await?;

        Ok(())
    }

    // ── Message dispatch ────────────────────────────────────────────

    /// Feed one inbound message through the funnel.
    ///
    /// Returns the reply to send, or `None` when the message is ignored
    /// (unknown command, or free text with no conversation running).
    pub async fn handle_message(&self, message: &IncomingMessage) -> Option<OutgoingResponse> {
        let command = CommandParser::parse(&message.content);
        let Some(input) = command.clone().into_input() else {
            debug!(command = ?command, "Ignoring unsupported command");
            return None;
        };

        let key = message.session_key();
        let mut session = match self.load_session(&key, &input).await {
            Some(s) => s,
            None => {
                debug!(session = %key, "No active session; ignoring text");
                return None;
            }
        };
        if let Some(ref name) = message.user_name {
            session.user_name = Some(name.clone());
        }

        let transition = self
            .deps
            .engine
            .step(session.state, &session.answers, &input)?;
        let lead = session.apply(&transition);

        info!(
            session = %key,
            from = %transition.from,
            to = %transition.next,
            "Funnel transition"
        );

        if transition.is_terminal() {
            self.deps.sessions.remove(&key).await;
        } else {
            self.deps.sessions.put(session).await;
        }

        if let Some(lead) = lead {
            if let Err(e) = self.deps.notifier.notify(&lead).await {
                warn!(
                    lead_id = %lead.id,
                    sink = self.deps.notifier.name(),
                    "Lead notification failed: {}",
                    e
                );
            }
        }

        Some(OutgoingResponse::text(transition.prompt).with_quick_replies(transition.quick_replies))
    }

    /// Session the input applies to.
    ///
    /// A start trigger always gets a fresh session. Cancel without a running
    /// conversation still gets a throwaway session so the user sees a reply.
    async fn load_session(&self, key: &str, input: &Input) -> Option<Session> {
        match input {
            Input::Start => Some(Session::new(key)),
            Input::Cancel => Some(
                self.deps
                    .sessions
                    .get(key)
                    .await
                    .unwrap_or_else(|| Session::new(key)),
            ),
            Input::Text(_) => self.deps.sessions.get(key).await,
        }
    }
}
