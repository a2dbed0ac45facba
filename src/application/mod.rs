//! Application layer
//!
//! This layer contains use cases that orchestrate domain logic to implement
//! application-specific workflows. Use cases coordinate the identity provider
//! and the user record service to fulfill account requests.

pub mod account;
