//! ChannelManager — fans in all channel streams and routes replies back.

use futures::stream;
use tracing::{info, warn};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;

/// Owns every active channel.
#[derive(Default)]
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: Box<dyn Channel>) {
        self.channels.push(channel);
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    fn get(&self, name: &str) -> Option<&dyn Channel> {
        self.channels
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// Start every channel and merge their streams into one.
    ///
    /// A channel that fails its health check or fails to start is skipped;
    /// an error is returned only if none could be started.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::new();

        for channel in &self.channels {
            if let Err(e) = channel.health_check().await {
                warn!(channel = channel.name(), "Health check failed: {}", e);
                continue;
            }
            match channel.start().await {
                Ok(s) => {
                    info!(channel = channel.name(), "Channel started");
                    streams.push(s);
                }
                Err(e) => warn!(channel = channel.name(), "Channel failed to start: {}", e),
            }
        }

        if streams.is_empty() {
            return Err(ChannelError::StartupFailed {
                name: "all".to_string(),
                reason: "no channel could be started".to_string(),
            });
        }

        Ok(Box::pin(stream::select_all(streams)))
    }

    /// Send a reply through the channel the message came from.
    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let channel = self
            .get(&msg.channel)
            .ok_or_else(|| ChannelError::UnknownChannel(msg.channel.clone()))?;
        channel.respond(msg, response).await
    }

    pub async fn shutdown_all(&self) -> Result<(), ChannelError> {
        for channel in &self.channels {
            if let Err(e) = channel.shutdown().await {
                warn!(channel = channel.name(), "Channel shutdown failed: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use futures::StreamExt;
    use tokio::sync::Mutex;

    use super::*;

    struct FixedChannel {
        name: &'static str,
        inbox: Vec<&'static str>,
        sent: Arc<Mutex<Vec<String>>>,
        healthy: bool,
    }

    #[async_trait]
    impl Channel for FixedChannel {
        fn name(&self) -> &str {
            self.name
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            let msgs: Vec<_> = self
                .inbox
                .iter()
                .map(|text| IncomingMessage::new(self.name, "u1", text))
                .collect();
            Ok(Box::pin(stream::iter(msgs)))
        }

        async fn respond(
            &self,
            _msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.sent.lock().await.push(response.content);
            Ok(())
        }

        async fn health_check(&self) -> Result<(), ChannelError> {
            if self.healthy {
                Ok(())
            } else {
                Err(ChannelError::HealthCheckFailed {
                    name: self.name.to_string(),
                })
            }
        }
    }

    fn channel(name: &'static str, inbox: Vec<&'static str>, healthy: bool) -> FixedChannel {
        FixedChannel {
            name,
            inbox,
            sent: Arc::new(Mutex::new(Vec::new())),
            healthy,
        }
    }

    #[tokio::test]
    async fn merges_streams_from_all_channels() {
        let mut mgr = ChannelManager::new();
        mgr.add(Box::new(channel("a", vec!["1", "2"], true)));
        mgr.add(Box::new(channel("b", vec!["3"], true)));

        let msgs: Vec<_> = mgr.start_all().await.unwrap().collect().await;
        assert_eq!(msgs.len(), 3);
        assert_eq!(mgr.names(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn skips_unhealthy_channels() {
        let mut mgr = ChannelManager::new();
        mgr.add(Box::new(channel("down", vec!["x"], false)));
        mgr.add(Box::new(channel("up", vec!["y"], true)));

        let msgs: Vec<_> = mgr.start_all().await.unwrap().collect().await;
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].channel, "up");
    }

    #[tokio::test]
    async fn fails_when_nothing_starts() {
        let mut mgr = ChannelManager::new();
        mgr.add(Box::new(channel("down", vec![], false)));
        assert!(mgr.start_all().await.is_err());
    }

    #[tokio::test]
    async fn respond_routes_by_channel_name() {
        let a = channel("a", vec![], true);
        let sent = Arc::clone(&a.sent);
        let mut mgr = ChannelManager::new();
        mgr.add(Box::new(a));
        mgr.add(Box::new(channel("b", vec![], true)));

        let msg = IncomingMessage::new("a", "u1", "hi");
        mgr.respond(&msg, OutgoingResponse::text("hello")).await.unwrap();
        assert_eq!(*sent.lock().await, vec!["hello".to_string()]);

        let unknown = IncomingMessage::new("zzz", "u1", "hi");
        let err = mgr
            .respond(&unknown, OutgoingResponse::text("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::UnknownChannel(ref n) if n == "zzz"));
    }
}
