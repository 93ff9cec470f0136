//! Lead qualification funnel — the conversation engine.
//!
//! A short scripted dialogue asks who the course is for, the goal, the
//! child's age (child flow only), format, level and schedule, then offers a
//! trial lesson. Objections loop on the offer; a "yes" leads to the contact
//! question, whose answer finalizes a `LeadRecord`.

pub mod classify;
pub mod engine;
pub mod model;
pub mod prompts;
pub mod state;

pub use classify::{PhoneRule, is_affirmative, is_child_flow};
pub use engine::{AnswerMutation, FunnelEngine, Input, Transition};
pub use model::{AnswerField, Answers, LeadRecord, Session};
pub use prompts::QuickReplies;
pub use state::{FunnelState, TRANSITIONS};
