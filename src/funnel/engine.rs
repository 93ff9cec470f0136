//! FunnelEngine — the pure transition function of the dialogue.
//!
//! `step` looks at a state, the answers so far and one input, and returns
//! what should happen next. It never touches a session directly; callers
//! apply the returned [`Transition`] with [`Session::apply`].
//!
//! [`Session::apply`]: super::model::Session::apply

use super::classify::{PhoneRule, clean_text};
use super::model::{AnswerField, Answers};
use super::prompts::{QuickReplies, prompt_for, quick_replies_for};
use super::state::{FunnelState, next_edge};

/// One inbound event for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Begin (or restart) the dialogue.
    Start,
    /// Abort the dialogue.
    Cancel,
    /// A free-text message.
    Text(String),
}

/// Change to apply to the collected answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerMutation {
    None,
    Clear,
    Set { field: AnswerField, value: String },
    SetContact { raw: String, phone_digits: String },
}

/// Result of feeding one input to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: FunnelState,
    pub next: FunnelState,
    pub mutation: AnswerMutation,
    pub prompt: String,
    pub quick_replies: Option<QuickReplies>,
}

impl Transition {
    /// Whether this transition ends the conversation.
    pub fn is_terminal(&self) -> bool {
        self.next.is_terminal()
    }
}

/// Evaluates funnel transitions.
#[derive(Debug, Clone, Default)]
pub struct FunnelEngine {
    phone_rule: PhoneRule,
}

impl FunnelEngine {
    pub fn new(phone_rule: PhoneRule) -> Self {
        Self { phone_rule }
    }

    /// Compute the transition for `input` from `state`.
    ///
    /// Returns `None` only for free text in a terminal state, where no
    /// conversation is running.
    pub fn step(&self, state: FunnelState, answers: &Answers, input: &Input) -> Option<Transition> {
        match input {
            Input::Start => Some(self.restart(state)),
            Input::Cancel => Some(Transition {
                from: state,
                next: FunnelState::Cancelled,
                mutation: AnswerMutation::Clear,
                prompt: prompt_for(state, FunnelState::Cancelled, answers),
                quick_replies: quick_replies_for(state, FunnelState::Cancelled),
            }),
            Input::Text(text) => self.on_text(state, answers, text),
        }
    }

    /// Restarting always runs the `Start` row with a clean slate.
    fn restart(&self, from: FunnelState) -> Transition {
        let empty = Answers::default();
        let next = next_edge(FunnelState::Start, &empty, "")
            .map(|edge| edge.to)
            .unwrap_or(FunnelState::AskWho);
        Transition {
            from,
            next,
            mutation: AnswerMutation::Clear,
            prompt: prompt_for(FunnelState::Start, next, &empty),
            quick_replies: quick_replies_for(FunnelState::Start, next),
        }
    }

    fn on_text(&self, state: FunnelState, answers: &Answers, text: &str) -> Option<Transition> {
        if state.is_terminal() {
            return None;
        }

        let value = clean_text(text);
        let mutation = self.mutation_for(state, &value);

        // Guards and prompts see the answers as they will be after this step.
        let mut projected = answers.clone();
        projected.apply(&mutation);

        let edge = next_edge(state, &projected, &value)?;
        Some(Transition {
            from: state,
            next: edge.to,
            prompt: prompt_for(state, edge.to, &projected),
            quick_replies: quick_replies_for(state, edge.to),
            mutation,
        })
    }

    fn mutation_for(&self, state: FunnelState, value: &str) -> AnswerMutation {
        match state.captures() {
            Some(AnswerField::ContactRaw) => AnswerMutation::SetContact {
                raw: value.to_string(),
                phone_digits: self.phone_rule.extract(value),
            },
            Some(field) => AnswerMutation::Set {
                field,
                value: value.to_string(),
            },
            None if state == FunnelState::Start => AnswerMutation::Clear,
            None => AnswerMutation::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::model::Session;
    use crate::funnel::prompts;

    fn text(s: &str) -> Input {
        Input::Text(s.to_string())
    }

    /// Feed inputs to a session, returning the last transition.
    fn drive(engine: &FunnelEngine, session: &mut Session, inputs: &[Input]) -> Transition {
        let mut last = None;
        for input in inputs {
            let t = engine
                .step(session.state, &session.answers, input)
                .expect("input should be accepted");
            if *input != Input::Start {
                assert!(
                    session.state.can_transition_to(t.next),
                    "illegal edge {} -> {}",
                    session.state,
                    t.next
                );
            }
            session.apply(&t);
            last = Some(t);
        }
        last.unwrap()
    }

    fn to_confirm(engine: &FunnelEngine, session: &mut Session) {
        drive(
            engine,
            session,
            &[
                Input::Start,
                text("для себя"),
                text("разговорный"),
                text("онлайн"),
                text("B1"),
                text("вечер"),
            ],
        );
        assert_eq!(session.state, FunnelState::AskConfirm);
    }

    #[test]
    fn start_asks_who_and_clears_keyboard() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        let t = drive(&engine, &mut session, &[Input::Start]);
        assert_eq!(t.next, FunnelState::AskWho);
        assert_eq!(t.mutation, AnswerMutation::Clear);
        assert_eq!(t.quick_replies, Some(QuickReplies::Clear));
        assert!(t.prompt.contains(prompts::ASK_WHO));
    }

    #[test]
    fn adult_flow_skips_age() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        let t = drive(
            &engine,
            &mut session,
            &[Input::Start, text("для себя"), text("разговорный")],
        );
        assert_eq!(t.next, FunnelState::AskFormat);
        assert_eq!(t.prompt, prompts::ASK_FORMAT);
        assert!(session.answers.age.is_none());
    }

    #[test]
    fn child_flow_asks_age() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        let t = drive(
            &engine,
            &mut session,
            &[Input::Start, text("для ребёнка"), text("экзамен")],
        );
        assert_eq!(t.next, FunnelState::AskAge);
        assert_eq!(t.prompt, prompts::ASK_AGE);

        let t = drive(&engine, &mut session, &[text(" 10 ")]);
        assert_eq!(t.next, FunnelState::AskFormat);
        assert_eq!(session.answers.age.as_deref(), Some("10"));
    }

    #[test]
    fn schedule_offers_yes_no_with_summary() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        drive(
            &engine,
            &mut session,
            &[Input::Start, text("для себя"), text("работа"), text("офлайн"), text("не знаю")],
        );
        let t = drive(&engine, &mut session, &[text("утро, выходные")]);
        assert_eq!(t.next, FunnelState::AskConfirm);
        assert_eq!(t.quick_replies, Some(QuickReplies::yes_no()));
        assert!(t.prompt.contains("цель — работа"));
        assert!(t.prompt.contains("уровень — не знаю"));
        assert_eq!(session.answers.schedule.as_deref(), Some("утро, выходные"));
    }

    #[test]
    fn objection_loops_then_yes_advances() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        to_confirm(&engine, &mut session);
        let before = session.answers.clone();

        let t = drive(&engine, &mut session, &[text("нет, дорого")]);
        assert_eq!(t.next, FunnelState::AskConfirm);
        assert_eq!(t.mutation, AnswerMutation::None);
        assert_eq!(t.prompt, prompts::ASK_BLOCKER);
        assert_eq!(session.answers, before);

        let t = drive(&engine, &mut session, &[text("цена")]);
        assert_eq!(t.next, FunnelState::AskConfirm);

        let t = drive(&engine, &mut session, &[text("да")]);
        assert_eq!(t.next, FunnelState::AskContact);
        assert_eq!(t.quick_replies, Some(QuickReplies::Clear));
    }

    #[test]
    fn contact_extracts_phone_and_ends() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        to_confirm(&engine, &mut session);
        drive(&engine, &mut session, &[text("Да")]);

        let t = engine
            .step(session.state, &session.answers, &text("Иван, +7 999 123 45 67"))
            .unwrap();
        let lead = session.apply(&t).expect("lead emitted at end");
        assert_eq!(t.next, FunnelState::End);
        assert_eq!(t.prompt, prompts::THANKS);
        assert_eq!(lead.phone_digits, "79991234567");
        assert_eq!(lead.contact_raw, "Иван, +7 999 123 45 67");
        assert!(lead.age.is_none());
    }

    #[test]
    fn contact_without_phone_keeps_raw_text() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        to_confirm(&engine, &mut session);
        drive(&engine, &mut session, &[text("да")]);
        let t = drive(&engine, &mut session, &[text("Иван, напишите в телеграм")]);
        assert_eq!(t.next, FunnelState::End);
        assert_eq!(session.answers.phone_digits.as_deref(), Some(""));
        assert_eq!(
            session.answers.contact_raw.as_deref(),
            Some("Иван, напишите в телеграм")
        );
    }

    #[test]
    fn empty_answers_are_accepted() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        let t = drive(&engine, &mut session, &[Input::Start, text("   "), text("")]);
        assert_eq!(t.next, FunnelState::AskFormat);
        assert_eq!(session.answers.who.as_deref(), Some(""));
        assert_eq!(session.answers.goal.as_deref(), Some(""));
    }

    #[test]
    fn cancel_from_level_clears_answers() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        drive(
            &engine,
            &mut session,
            &[Input::Start, text("для себя"), text("работа"), text("онлайн")],
        );
        assert_eq!(session.state, FunnelState::AskLevel);

        let t = engine
            .step(session.state, &session.answers, &Input::Cancel)
            .unwrap();
        assert!(session.apply(&t).is_none());
        assert_eq!(session.state, FunnelState::Cancelled);
        assert!(session.answers.is_empty());
        assert_eq!(t.prompt, prompts::CANCELLED);
    }

    #[test]
    fn start_mid_conversation_restarts() {
        let engine = FunnelEngine::default();
        let mut session = Session::new("s");
        drive(
            &engine,
            &mut session,
            &[Input::Start, text("для ребёнка"), text("экзамен"), text("8")],
        );
        let t = drive(&engine, &mut session, &[Input::Start]);
        assert_eq!(t.from, FunnelState::AskFormat);
        assert_eq!(t.next, FunnelState::AskWho);
        assert!(session.answers.is_empty());
    }

    #[test]
    fn text_after_terminal_state_is_ignored() {
        let engine = FunnelEngine::default();
        assert!(engine
            .step(FunnelState::End, &Answers::default(), &text("ещё вопрос"))
            .is_none());
        assert!(engine
            .step(FunnelState::Cancelled, &Answers::default(), &text("привет"))
            .is_none());
        // A start trigger still works from a terminal state.
        assert!(engine
            .step(FunnelState::End, &Answers::default(), &Input::Start)
            .is_some());
    }

    #[test]
    fn step_is_pure() {
        let engine = FunnelEngine::default();
        let mut answers = Answers::default();
        answers.set(AnswerField::Who, "для детей");
        let input = text("учёба");
        let a = engine.step(FunnelState::AskGoal, &answers, &input);
        let b = engine.step(FunnelState::AskGoal, &answers, &input);
        assert_eq!(a, b);
        assert_eq!(answers.goal, None);
    }

    #[test]
    fn custom_phone_rule_is_used() {
        let engine = FunnelEngine::new(PhoneRule::new(11, 11));
        let mut answers = Answers::default();
        answers.set(AnswerField::Who, "для себя");
        let t = engine
            .step(FunnelState::AskContact, &answers, &text("999 123 45 67"))
            .unwrap();
        assert_eq!(
            t.mutation,
            AnswerMutation::SetContact {
                raw: "999 123 45 67".to_string(),
                phone_digits: String::new(),
            }
        );
    }
}
