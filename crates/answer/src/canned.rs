//! Canned replies for greetings and dialect phrases
//!
//! Lookups run on the normalized question (trimmed, lowercased) before any
//! retrieval or generation work. Matches are exact; the tables are
//! compiled-in and every canned reply carries an empty source list.

use regex_lite::Regex;
use std::sync::OnceLock;

static RECALL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Normalize a question for table lookups and session logging.
pub fn normalize(question: &str) -> String {
    question.trim().to_lowercase()
}

/// Whether the normalized question asks what was previously asked.
pub fn is_recall_request(normalized: &str) -> bool {
    let pattern = RECALL_PATTERN
        .get_or_init(|| Regex::new(r"what.*(ask|say)|chnowa.*(9olt|soutlek)").unwrap());
    pattern.is_match(normalized)
}

/// Canned reply for greeting phrases.
pub fn greeting_reply(normalized: &str) -> Option<&'static str> {
    match normalized {
        "hi" => Some("Hi! I'm the Veridex assistant. How can I help you?"),
        "hello" => Some("Hello! I'm the Veridex assistant. What can I help you with?"),
        "aselma" => Some("Aslema! I'm the Veridex assistant. Kifech najem n3awnek?"),
        "salam" => Some("Salam! I'm the Veridex assistant. How can I help you?"),
        "labes" => Some("Labes! T7eb ts2el 3ala chhaja fel documents mte3ek?"),
        "good morning" => Some("Good morning! I'm the Veridex assistant. What can I do for you?"),
        "good evening" => Some("Good evening! I'm the Veridex assistant. Need help?"),
        _ => None,
    }
}

/// Canned reply for dialect phrases asking what the assistant is or does.
pub fn dialect_reply(normalized: &str) -> Option<&'static str> {
    match normalized {
        "ahkili 3ala veridex" => Some(
            "Veridex t7ell el documents mte3ek, tfahemhom, w tjaweb 3ala \
             les questions mte3ek minhom. T7eb tjarreb?",
        ),
        "chnowa tamel veridex" => Some(
            "Veridex ta9ra el PDFs elli t7ottohom fel corpus w tjaweb \
             m'beladhom. T7eb t3raf aktar?",
        ),
        "chnowa veridex" => Some(
            "Veridex hiya service ta3 questions w reponses 3ala el documents mte3ek.",
        ),
        _ => None,
    }
}
