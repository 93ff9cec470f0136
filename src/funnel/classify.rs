//! Pure predicates and extraction rules applied to free-text answers.

use regex::Regex;

/// Substrings of the `who` answer that mean the course is for a child.
const CHILD_MARKERS: &[&str] = &["реб", "дете", "ребён"];

/// Prefixes of a lowercase reply that count as "yes".
const AFFIRMATIVE_MARKERS: &[&str] = &["д"];

/// Default accepted digit count for a phone number, inclusive.
pub const DEFAULT_PHONE_MIN_DIGITS: usize = 10;
pub const DEFAULT_PHONE_MAX_DIGITS: usize = 15;

/// Trim surrounding whitespace from a free-text answer.
pub fn clean_text(text: &str) -> String {
    text.trim().to_string()
}

/// Whether the lead is asking on behalf of a child.
pub fn is_child_flow(who: &str) -> bool {
    let who = who.to_lowercase();
    CHILD_MARKERS.iter().any(|marker| who.contains(marker))
}

/// Whether a reply to the call-to-action is a "yes".
pub fn is_affirmative(reply: &str) -> bool {
    let reply = reply.trim().to_lowercase();
    AFFIRMATIVE_MARKERS
        .iter()
        .any(|marker| reply.starts_with(marker))
}

/// Extracts phone digits from a free-text contact message.
#[derive(Debug, Clone)]
pub struct PhoneRule {
    non_digits: Regex,
    min_digits: usize,
    max_digits: usize,
}

impl PhoneRule {
    pub fn new(min_digits: usize, max_digits: usize) -> Self {
        Self {
            non_digits: Regex::new(r"\D+").unwrap(),
            min_digits,
            max_digits,
        }
    }

    pub fn min_digits(&self) -> usize {
        self.min_digits
    }

    pub fn max_digits(&self) -> usize {
        self.max_digits
    }

    /// All digits of `text`, in order.
    pub fn digits(&self, text: &str) -> String {
        self.non_digits.replace_all(text, "").into_owned()
    }

    /// The digit string when it has a plausible phone length, else empty.
    pub fn extract(&self, text: &str) -> String {
        let digits = self.digits(text);
        let count = digits.chars().count();
        if (self.min_digits..=self.max_digits).contains(&count) {
            digits
        } else {
            String::new()
        }
    }
}

impl Default for PhoneRule {
    fn default() -> Self {
        Self::new(DEFAULT_PHONE_MIN_DIGITS, DEFAULT_PHONE_MAX_DIGITS)
    }
}
