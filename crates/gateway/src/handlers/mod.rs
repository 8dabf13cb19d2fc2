//! API handlers module

pub mod health;
pub mod ingest;
pub mod list;
pub mod query;
pub mod upload;
