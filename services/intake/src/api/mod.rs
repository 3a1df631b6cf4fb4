//! Intake HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules, the shared error helpers, and the response
//! types collected into the OpenAPI document.
pub mod error;
pub mod incidents;
pub mod openapi;
pub mod slack;
pub mod system;
pub mod types;
