//! Lead sinks — where finished leads go once the funnel reaches its end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::channels::TelegramChannel;
use crate::error::NotifyError;
use crate::funnel::LeadRecord;

/// Receives each finished lead exactly once.
#[async_trait]
pub trait LeadNotifier: Send + Sync {
    /// Sink name used in logs.
    fn name(&self) -> &str;

    async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError>;
}

/// Writes every lead to the log.
pub struct LogNotifier;

#[async_trait]
impl LeadNotifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError> {
        tracing::info!(
            lead_id = %lead.id,
            session = %lead.session_key,
            who = %lead.who,
            goal = %lead.goal,
            age = lead.age.as_deref().unwrap_or("-"),
            format = %lead.format,
            level = %lead.level,
            schedule = %lead.schedule,
            contact = %lead.contact_raw,
            phone = %lead.phone_digits,
            "LEAD captured"
        );
        Ok(())
    }
}

/// Appends leads to a JSON Lines file.
pub struct JsonlNotifier {
    path: PathBuf,
}

impl JsonlNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LeadNotifier for JsonlNotifier {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(lead)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Posts leads to a manager chat on Telegram.
pub struct TelegramNotifier {
    channel: TelegramChannel,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(channel: TelegramChannel, chat_id: impl Into<String>) -> Self {
        Self {
            channel,
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl LeadNotifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError> {
        self.channel
            .send_message(&self.chat_id, &lead.to_manager_message(), None)
            .await?;
        Ok(())
    }
}

/// Forwards each lead to every inner sink.
///
/// All sinks are tried even if one fails; the first error is returned.
#[derive(Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn LeadNotifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn LeadNotifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl LeadNotifier for FanoutNotifier {
    fn name(&self) -> &str {
        "fanout"
    }

    async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.notify(lead).await {
                tracing::warn!(sink = sink.name(), lead_id = %lead.id, "Lead sink failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Mutex;

    use super::*;
    use crate::funnel::{AnswerField, Session};

    fn sample_lead() -> LeadRecord {
        let mut session = Session::new("cli:local-user");
        session.answers.set(AnswerField::Who, "для себя");
        session.answers.set(AnswerField::Goal, "переезд");
        session.answers.set(AnswerField::Format, "онлайн");
        session.answers.set(AnswerField::Level, "B2");
        session.answers.set(AnswerField::Schedule, "утро");
        session.answers.set(AnswerField::ContactRaw, "Анна 89161234567");
        session.answers.set(AnswerField::PhoneDigits, "89161234567");
        LeadRecord::from_session(&session)
    }

    struct Recording {
        seen: Mutex<Vec<LeadRecord>>,
    }

    #[async_trait]
    impl LeadNotifier for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, lead: &LeadRecord) -> Result<(), NotifyError> {
            self.seen.lock().await.push(lead.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl LeadNotifier for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn notify(&self, _lead: &LeadRecord) -> Result<(), NotifyError> {
            Err(NotifyError::SinkFailed {
                sink: "failing".into(),
                reason: "boom".into(),
            })
        }
    }

    #[tokio::test]
    async fn log_notifier_never_fails() {
        assert!(LogNotifier.notify(&sample_lead()).await.is_ok());
    }

    #[tokio::test]
    async fn jsonl_notifier_appends_one_line_per_lead() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("leads.jsonl");
        let sink = JsonlNotifier::new(&path);

        let first = sample_lead();
        let second = sample_lead();
        sink.notify(&first).await.unwrap();
        sink.notify(&second).await.unwrap();

        let contents = tokio::fs::read_to_string(sink.path()).await.unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: LeadRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, first);
        let raw: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(raw["phoneDigits"], "89161234567");
        assert_eq!(raw["id"], second.id.to_string());
    }

    #[tokio::test]
    async fn fanout_reaches_every_sink_despite_failures() {
        let recorder = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
        });
        let fanout = FanoutNotifier::new()
            .with(Arc::new(Failing))
            .with(recorder.clone());
        assert_eq!(fanout.len(), 2);

        let result = fanout.notify(&sample_lead()).await;
        assert!(matches!(result, Err(NotifyError::SinkFailed { .. })));
        assert_eq!(recorder.seen.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn empty_fanout_succeeds() {
        let fanout = FanoutNotifier::new();
        assert!(fanout.is_empty());
        assert!(fanout.notify(&sample_lead()).await.is_ok());
    }

    #[tokio::test]
    async fn telegram_notifier_fails_with_fake_token() {
        let sink = TelegramNotifier::new(TelegramChannel::new("fake-token".into(), vec![]), "1");
        assert!(sink.notify(&sample_lead()).await.is_err());
    }
}
