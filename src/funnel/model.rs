//! Session and lead data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::engine::{AnswerMutation, Transition};
use super::state::FunnelState;

/// Names of the answers collected during the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerField {
    Who,
    Goal,
    Age,
    Format,
    Level,
    Schedule,
    ContactRaw,
    PhoneDigits,
}

/// Answers collected so far. A field is `None` until its question has been
/// answered; an empty string means the user answered with blank text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Only ever set in the child flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_raw: Option<String>,
    /// Validated phone digits, or empty when none could be extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_digits: Option<String>,
}

impl Answers {
    pub fn get(&self, field: AnswerField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: AnswerField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Apply a mutation produced by the engine.
    pub fn apply(&mut self, mutation: &AnswerMutation) {
        match mutation {
            AnswerMutation::None => {}
            AnswerMutation::Clear => self.clear(),
            AnswerMutation::Set { field, value } => self.set(*field, value.clone()),
            AnswerMutation::SetContact { raw, phone_digits } => {
                self.set(AnswerField::ContactRaw, raw.clone());
                self.set(AnswerField::PhoneDigits, phone_digits.clone());
            }
        }
    }

    fn slot(&self, field: AnswerField) -> &Option<String> {
        match field {
            AnswerField::Who => &self.who,
            AnswerField::Goal => &self.goal,
            AnswerField::Age => &self.age,
            AnswerField::Format => &self.format,
            AnswerField::Level => &self.level,
            AnswerField::Schedule => &self.schedule,
            AnswerField::ContactRaw => &self.contact_raw,
            AnswerField::PhoneDigits => &self.phone_digits,
        }
    }

    fn slot_mut(&mut self, field: AnswerField) -> &mut Option<String> {
        match field {
            AnswerField::Who => &mut self.who,
            AnswerField::Goal => &mut self.goal,
            AnswerField::Age => &mut self.age,
            AnswerField::Format => &mut self.format,
            AnswerField::Level => &mut self.level,
            AnswerField::Schedule => &mut self.schedule,
            AnswerField::ContactRaw => &mut self.contact_raw,
            AnswerField::PhoneDigits => &mut self.phone_digits,
        }
    }
}

/// One in-progress conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier, unique per transport chat and user.
    pub key: String,
    pub state: FunnelState,
    pub answers: Answers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session in the `Start` state.
    pub fn new(key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            state: FunnelState::Start,
            answers: Answers::default(),
            user_name: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Apply a transition computed by the engine.
    ///
    /// Returns the finalized lead when the transition reaches `End`.
    pub fn apply(&mut self, transition: &Transition) -> Option<LeadRecord> {
        self.answers.apply(&transition.mutation);
        self.state = transition.next;
        self.updated_at = Utc::now();

        if self.state == FunnelState::End {
            Some(LeadRecord::from_session(self))
        } else {
            None
        }
    }
}

/// Finalized answers handed to lead sinks once the dialogue reaches `End`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub id: Uuid,
    pub session_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub who: String,
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    pub format: String,
    pub level: String,
    pub schedule: String,
    pub contact_raw: String,
    /// Empty when the contact text held no plausible phone number.
    pub phone_digits: String,
    pub captured_at: DateTime<Utc>,
}

impl LeadRecord {
    /// Snapshot the answers of a session.
    pub fn from_session(session: &Session) -> Self {
        let field = |f: AnswerField| session.answers.get(f).unwrap_or_default().to_string();
        Self {
            id: Uuid::new_v4(),
            session_key: session.key.clone(),
            user_name: session.user_name.clone(),
            who: field(AnswerField::Who),
            goal: field(AnswerField::Goal),
            age: session.answers.age.clone(),
            format: field(AnswerField::Format),
            level: field(AnswerField::Level),
            schedule: field(AnswerField::Schedule),
            contact_raw: field(AnswerField::ContactRaw),
            phone_digits: field(AnswerField::PhoneDigits),
            captured_at: Utc::now(),
        }
    }

    /// Whether a phone number was recognized in the contact text.
    pub fn has_phone(&self) -> bool {
        !self.phone_digits.is_empty()
    }

    /// Render the lead as a plain-text message for a manager chat.
    pub fn to_manager_message(&self) -> String {
        let mut parts = vec!["Новая заявка".to_string()];

        if let Some(ref name) = self.user_name {
            parts.push(format!("Клиент: {name}"));
        }
        parts.push(format!("Для кого: {}", self.who));
        if let Some(ref age) = self.age {
            parts.push(format!("Возраст: {age}"));
        }
        parts.push(format!("Цель: {}", self.goal));
        parts.push(format!("Формат: {}", self.format));
        parts.push(format!("Уровень: {}", self.level));
        parts.push(format!("Время: {}", self.schedule));
        parts.push(format!("Контакт: {}", self.contact_raw));
        if self.has_phone() {
            parts.push(format!("Телефон: {}", self.phone_digits));
        } else {
            parts.push("Телефон: не распознан, проверь контакт вручную".to_string());
        }

        parts.join("\n")
    }
}
