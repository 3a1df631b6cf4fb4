//! Incident data model module.
//!
//! # Purpose
//! Re-exports the incident draft/record types shared by the decoder, store,
//! dispatchers, and HTTP API.
mod incident;

pub use incident::{
    DraftFields, IncidentDraft, IncidentRecord, MAX_DESCRIPTION_LEN, MAX_PRODUCT_LEN,
    MAX_SUPPORT_MESSAGE_LEN, Severity, ValidationError,
};
