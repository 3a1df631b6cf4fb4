//! Slack incident intake service library crate.
//!
//! # Purpose
//! Exposes request authentication, interaction decoding, the intake pipeline,
//! downstream dispatchers, storage implementations and the HTTP surface for
//! use by the binary and tests.
//!
//! # Notes
//! Module boundaries follow the path of a submission: `auth` → `interaction`
//! → `pipeline` → `store` / `dispatch`, with `api` and `app` on top.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod interaction;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod store;
