//! Veridex Answer Library
//!
//! Turns ranked retrieval results into a reply:
//! 1. Canned shortcuts (recall, greetings, dialect phrases)
//! 2. Sufficiency threshold on the best retrieval score
//! 3. Grounding prompt construction and external generation
//! 4. Session logging and insufficient-answer notification

pub mod canned;
pub mod engine;
pub mod generator;
pub mod prompt;
pub mod session;

pub use engine::{AnswerEngine, QueryOutcome};
pub use generator::{create_generator, ChatGenerator, Generator, MockGenerator};
pub use session::SessionStore;
