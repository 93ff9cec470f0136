//! Prompt texts and quick-reply directives for each edge of the funnel.

use serde::{Deserialize, Serialize};

use super::model::{AnswerField, Answers};
use super::state::FunnelState;

pub const GREETING: &str = "Привет! Давай быстро разберёмся и подберём вариант 🙂";
pub const ASK_WHO: &str = "Для себя курс ищешь или для ребёнка?";
pub const ASK_GOAL: &str = "Ок. Какая цель: разговорный, работа, учёба, переезд или экзамен?";
pub const ASK_AGE: &str = "Сколько лет ребёнку?";
pub const ASK_FORMAT: &str = "Онлайн или офлайн удобнее?";
pub const ASK_LEVEL: &str = "Уровень примерно знаешь? Если нет — так и напиши: “не знаю”.";
pub const ASK_SCHEDULE: &str = "По времени как удобнее: утро/день/вечер? И будни или выходные?";
pub const CALL_TO_ACTION: &str = "Предлагаю начать с пробного урока: там быстро определим уровень и подберём план. Записать тебя?";
pub const ASK_BLOCKER: &str = "Ок. Что больше стопорит: цена, время или сомнения по уровню?";
pub const ASK_CONTACT: &str =
    "Супер. Напиши, пожалуйста, имя и номер телефона/WhatsApp (можно одним сообщением).";
pub const THANKS: &str = "Принято ✅ Передам менеджеру, чтобы он/она связались с тобой. Если хочешь — напиши ещё, в какое время лучше писать/звонить.";
pub const CANCELLED: &str = "Ок, остановились. Если что — напиши /start.";

pub const YES: &str = "Да";
pub const NO: &str = "Нет";

/// How the transport should change its reply keyboard along with a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "options")]
pub enum QuickReplies {
    /// Show exactly these options as buttons.
    Offer(Vec<String>),
    /// Remove any buttons shown earlier.
    Clear,
}

impl QuickReplies {
    pub fn yes_no() -> Self {
        Self::Offer(vec![YES.to_string(), NO.to_string()])
    }
}

/// The short recap shown before the call-to-action.
pub fn summary(answers: &Answers) -> String {
    let field = |f: AnswerField| answers.get(f).unwrap_or_default();
    format!(
        "Ок, понял(а): {}, цель — {}, формат — {}, уровень — {}.",
        field(AnswerField::Who),
        field(AnswerField::Goal),
        field(AnswerField::Format),
        field(AnswerField::Level),
    )
}

/// Prompt sent when moving along `from → to`. `answers` are the answers
/// after the move.
pub fn prompt_for(from: FunnelState, to: FunnelState, answers: &Answers) -> String {
    match (from, to) {
        (_, FunnelState::Start | FunnelState::AskWho) => format!("{GREETING}\n{ASK_WHO}"),
        (_, FunnelState::AskGoal) => ASK_GOAL.to_string(),
        (_, FunnelState::AskAge) => ASK_AGE.to_string(),
        (_, FunnelState::AskFormat) => ASK_FORMAT.to_string(),
        (_, FunnelState::AskLevel) => ASK_LEVEL.to_string(),
        (_, FunnelState::AskSchedule) => ASK_SCHEDULE.to_string(),
        (FunnelState::AskConfirm, FunnelState::AskConfirm) => ASK_BLOCKER.to_string(),
        (_, FunnelState::AskConfirm) => format!("{}\n{CALL_TO_ACTION}", summary(answers)),
        (_, FunnelState::AskContact) => ASK_CONTACT.to_string(),
        (_, FunnelState::End) => THANKS.to_string(),
        (_, FunnelState::Cancelled) => CANCELLED.to_string(),
    }
}

/// Keyboard change for `from → to`; `None` leaves the current keyboard alone.
pub fn quick_replies_for(from: FunnelState, to: FunnelState) -> Option<QuickReplies> {
    match (from, to) {
        (_, FunnelState::AskWho) => Some(QuickReplies::Clear),
        (FunnelState::AskSchedule, FunnelState::AskConfirm) => Some(QuickReplies::yes_no()),
        (FunnelState::AskConfirm, FunnelState::AskContact) => Some(QuickReplies::Clear),
        (_, FunnelState::Cancelled) => Some(QuickReplies::Clear),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_answers() -> Answers {
        let mut answers = Answers::default();
        answers.set(AnswerField::Who, "для себя");
        answers.set(AnswerField::Goal, "разговорный");
        answers.set(AnswerField::Format, "онлайн");
        answers.set(AnswerField::Level, "A2");
        answers.set(AnswerField::Schedule, "вечер, будни");
        answers
    }

    #[test]
    fn summary_lists_collected_answers() {
        assert_eq!(
            summary(&sample_answers()),
            "Ок, понял(а): для себя, цель — разговорный, формат — онлайн, уровень — A2."
        );
    }

    #[test]
    fn summary_tolerates_blank_answers() {
        let text = summary(&Answers::default());
        assert_eq!(text, "Ок, понял(а): , цель — , формат — , уровень — .");
    }

    #[test]
    fn confirm_prompt_depends_on_origin() {
        let answers = sample_answers();
        let first = prompt_for(FunnelState::AskSchedule, FunnelState::AskConfirm, &answers);
        assert!(first.starts_with("Ок, понял(а): для себя"));
        assert!(first.ends_with(CALL_TO_ACTION));

        let again = prompt_for(FunnelState::AskConfirm, FunnelState::AskConfirm, &answers);
        assert_eq!(again, ASK_BLOCKER);
    }

    #[test]
    fn greeting_opens_the_dialogue() {
        let text = prompt_for(FunnelState::Start, FunnelState::AskWho, &Answers::default());
        assert!(text.starts_with(GREETING));
        assert!(text.ends_with(ASK_WHO));
    }

    #[test]
    fn quick_reply_directives() {
        use FunnelState::*;
        assert_eq!(quick_replies_for(Start, AskWho), Some(QuickReplies::Clear));
        assert_eq!(quick_replies_for(AskSchedule, AskConfirm), Some(QuickReplies::yes_no()));
        assert_eq!(quick_replies_for(AskConfirm, AskConfirm), None);
        assert_eq!(quick_replies_for(AskConfirm, AskContact), Some(QuickReplies::Clear));
        assert_eq!(quick_replies_for(AskLevel, Cancelled), Some(QuickReplies::Clear));
        assert_eq!(quick_replies_for(AskWho, AskGoal), None);
        assert_eq!(quick_replies_for(AskContact, End), None);
    }

    #[test]
    fn quick_replies_serde() {
        let json = serde_json::to_value(QuickReplies::yes_no()).unwrap();
        assert_eq!(json["kind"], "offer");
        assert_eq!(json["options"][0], "Да");

        let clear = serde_json::to_value(QuickReplies::Clear).unwrap();
        assert_eq!(clear["kind"], "clear");
    }
}
