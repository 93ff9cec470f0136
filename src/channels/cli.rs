//! CLI channel — stdin/stdout REPL for local testing.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;
use crate::funnel::QuickReplies;

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Render quick replies as a line of bracketed buttons.
fn render_quick_replies(quick_replies: &QuickReplies) -> Option<String> {
    match quick_replies {
        QuickReplies::Offer(options) if !options.is_empty() => Some(
            options
                .iter()
                .map(|o| format!("[{o}]"))
                .collect::<Vec<_>>()
                .join(" "),
        ),
        _ => None,
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprintln!("Type /start to begin, /cancel to stop.");
            eprint!("> ");

            loop {
                match lines.next_line().await {
                    // Blank lines are forwarded too; the funnel accepts empty answers.
                    Ok(Some(line)) => {
                        let msg = IncomingMessage::new("cli", "local-user", &line)
                            .with_user_name("local-user");
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}", response.content);
        if let Some(buttons) = response.quick_replies.as_ref().and_then(render_quick_replies) {
            println!("{buttons}");
        }
        println!();
        eprint!("> ");
        Ok(())
    }
}
