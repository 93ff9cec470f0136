//! Funnel state machine — the states and the transition table between them.

use serde::{Deserialize, Serialize};

use super::classify::{is_affirmative, is_child_flow};
use super::model::{AnswerField, Answers};

use FunnelState as S;

/// The states of the qualification dialogue.
///
/// Mostly linear: Start → AskWho → AskGoal → [AskAge] → AskFormat →
/// AskLevel → AskSchedule → AskConfirm (self-loop) → AskContact → End.
/// Cancelled is reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelState {
    Start,
    AskWho,
    AskGoal,
    AskAge,
    AskFormat,
    AskLevel,
    AskSchedule,
    AskConfirm,
    AskContact,
    End,
    Cancelled,
}

impl FunnelState {
    /// Every state, in flow order.
    pub const ALL: [FunnelState; 11] = [
        Self::Start,
        Self::AskWho,
        Self::AskGoal,
        Self::AskAge,
        Self::AskFormat,
        Self::AskLevel,
        Self::AskSchedule,
        Self::AskConfirm,
        Self::AskContact,
        Self::End,
        Self::Cancelled,
    ];

    /// Whether the conversation is over in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Cancelled)
    }

    /// The answer captured from free text while in this state, if any.
    ///
    /// AskConfirm reads the reply but never stores it.
    pub fn captures(&self) -> Option<AnswerField> {
        match self {
            Self::AskWho => Some(AnswerField::Who),
            Self::AskGoal => Some(AnswerField::Goal),
            Self::AskAge => Some(AnswerField::Age),
            Self::AskFormat => Some(AnswerField::Format),
            Self::AskLevel => Some(AnswerField::Level),
            Self::AskSchedule => Some(AnswerField::Schedule),
            Self::AskContact => Some(AnswerField::ContactRaw),
            Self::Start | Self::AskConfirm | Self::End | Self::Cancelled => None,
        }
    }

    /// Check if `target` is reachable in one step from `self`.
    ///
    /// Cancellation and restart are global and always allowed from a
    /// non-terminal state; everything else must be an edge of [`TRANSITIONS`].
    pub fn can_transition_to(&self, target: FunnelState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if target == Self::Cancelled || target == Self::Start {
            return true;
        }
        TRANSITIONS
            .iter()
            .any(|edge| edge.from == *self && edge.to == target)
    }
}

impl Default for FunnelState {
    fn default() -> Self {
        Self::Start
    }
}

impl std::fmt::Display for FunnelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::AskWho => "ask_who",
            Self::AskGoal => "ask_goal",
            Self::AskAge => "ask_age",
            Self::AskFormat => "ask_format",
            Self::AskLevel => "ask_level",
            Self::AskSchedule => "ask_schedule",
            Self::AskConfirm => "ask_confirm",
            Self::AskContact => "ask_contact",
            Self::End => "end",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// Condition attached to an edge of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Any input.
    Always,
    /// The `who` answer names a child.
    ChildFlow,
    /// The reply starts with an affirmative marker.
    Affirmative,
}

impl Guard {
    /// Evaluate the guard. `answers` already contain the value captured
    /// from `input` on this step.
    pub fn holds(&self, answers: &Answers, input: &str) -> bool {
        match self {
            Self::Always => true,
            Self::ChildFlow => is_child_flow(answers.who.as_deref().unwrap_or_default()),
            Self::Affirmative => is_affirmative(input),
        }
    }
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: FunnelState,
    pub guard: Guard,
    pub to: FunnelState,
}

impl Edge {
    const fn new(from: FunnelState, guard: Guard, to: FunnelState) -> Self {
        Self { from, guard, to }
    }
}

/// Text-driven edges. Rows are tried in order; the first whose guard holds
/// wins, so guarded rows precede their fallback.
pub const TRANSITIONS: &[Edge] = &[
    Edge::new(S::Start, Guard::Always, S::AskWho),
    Edge::new(S::AskWho, Guard::Always, S::AskGoal),
    Edge::new(S::AskGoal, Guard::ChildFlow, S::AskAge),
    Edge::new(S::AskGoal, Guard::Always, S::AskFormat),
    Edge::new(S::AskAge, Guard::Always, S::AskFormat),
    Edge::new(S::AskFormat, Guard::Always, S::AskLevel),
    Edge::new(S::AskLevel, Guard::Always, S::AskSchedule),
    Edge::new(S::AskSchedule, Guard::Always, S::AskConfirm),
    Edge::new(S::AskConfirm, Guard::Affirmative, S::AskContact),
    Edge::new(S::AskConfirm, Guard::Always, S::AskConfirm),
    Edge::new(S::AskContact, Guard::Always, S::End),
];

/// Find the edge taken from `from` for the given input, if any.
pub fn next_edge(from: FunnelState, answers: &Answers, input: &str) -> Option<&'static Edge> {
    TRANSITIONS
        .iter()
        .find(|edge| edge.from == from && edge.guard.holds(answers, input))
}
