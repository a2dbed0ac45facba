//! Infrastructure layer
//!
//! Adapters implementing the domain ports against concrete backends, plus
//! configuration loading.

pub mod config;
pub mod identity;
pub mod persistence;

pub use config::Config;
