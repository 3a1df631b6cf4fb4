//! Slack interaction decoding.
//!
//! # Purpose
//! Parses inbound interaction bodies and decodes incident form submissions
//! into validated drafts.
//!
//! # Notes
//! The widget-to-field mapping lives in [`fields`] as data; [`decoder`] only
//! knows how each widget kind is read.
pub mod command;
pub mod decoder;
pub mod envelope;
pub mod fields;
pub mod payload;

pub use command::SlashCommand;
pub use decoder::{DecodeError, decode, decode_value};
pub use envelope::InboundInteraction;
pub use payload::InteractionPayload;
