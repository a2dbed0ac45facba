//! User account records for a competitive-programming companion.
//!
//! `domain` holds the user entity, the error taxonomy and the ports;
//! `infrastructure` provides the document store and identity adapters;
//! `application` wires them into account use cases.

pub mod application;
pub mod domain;
pub mod infrastructure;
