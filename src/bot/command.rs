//! Command parsing for inbound text.

use crate::funnel::Input;

/// What an inbound message asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` — begin or restart the funnel.
    Start,
    /// `/cancel` — abort the funnel.
    Cancel,
    /// Any other slash command; ignored.
    Unknown(String),
    /// Free text answer.
    Text(String),
}

impl Command {
    /// Funnel input for this command, if it has one.
    pub fn into_input(self) -> Option<Input> {
        match self {
            Self::Start => Some(Input::Start),
            Self::Cancel => Some(Input::Cancel),
            Self::Text(text) => Some(Input::Text(text)),
            Self::Unknown(_) => None,
        }
    }
}

/// Parses message content into a Command.
pub struct CommandParser;

impl CommandParser {
    pub fn parse(content: &str) -> Command {
        let trimmed = content.trim();
        if !trimmed.starts_with('/') {
            return Command::Text(content.to_string());
        }

        // "/start@my_bot payload" → "/start"
        let head = trimmed.split_whitespace().next().unwrap_or(trimmed);
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        match name.as_str() {
            "/start" => Command::Start,
            "/cancel" | "/stop" => Command::Cancel,
            _ => Command::Unknown(name),
        }
    }
}
