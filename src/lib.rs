//! Catalog Sync Library
//!
//! Fills a local movie catalog from TMDB: movies, categories, directors and
//! leading cast, without ever creating a duplicate row.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod preflight;
pub mod services;
pub mod store;

pub use error::{Error, IngestError, Result};
