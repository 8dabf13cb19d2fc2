//! Veridex Retrieval Library
//!
//! Ranks indexed chunks against a question and decides whether the corpus
//! can answer it.

pub mod ranker;

pub use ranker::{RetrievalRanker, RetrievedItem};
