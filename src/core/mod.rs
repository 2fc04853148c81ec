//! Core sync logic.

pub mod ingest;
pub mod names;
pub mod nationality;
pub mod resolver;
