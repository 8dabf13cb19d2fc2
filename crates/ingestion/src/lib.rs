//! Veridex Ingestion Library
//!
//! Turns PDF files in the corpus directory into embedded chunks in the
//! vector index:
//! 1. Hash document bytes to detect already-indexed content
//! 2. Extract text per page
//! 3. Split pages into overlapping character windows
//! 4. Embed the windows and write them to the index

pub mod chunker;
pub mod hasher;
pub mod pdf;
pub mod pipeline;

pub use pipeline::{IngestReport, IngestionPipeline};
