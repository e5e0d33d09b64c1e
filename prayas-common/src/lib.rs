//! Shared library for the Prayas institute backend services.
//!
//! Holds the pieces every service needs: the common error type,
//! root-folder/config resolution, domain document models, the audit
//! sink, and the injected session context.

pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod session;

pub use error::{Error, Result};
