//! Interaction payload decoder.
//!
//! # Purpose and responsibility
//! Turns a modal submission into a validated [`IncidentDraft`] by walking the
//! field table in [`super::fields`].
//!
//! # Key invariants and assumptions
//! - Decoding is fail-fast: the first missing required field is reported and
//!   nothing after it is examined.
//! - Date/time pairs are combined as `{date}T{time}:00` before parsing.
//! - Field constraint violations are reported as [`DecodeError::Validation`],
//!   separate from shape problems.
use super::fields::{
    AFFECTED_PRODUCTS, DESCRIPTION, END_TIME, FieldSpec, INCIDENT_FORM_CALLBACK_ID,
    INCIDENT_FORM_FIELDS, INTERACTION_TYPE, MESSAGE_FOR_SUPPORT, P1_CUSTOMER_AFFECTED,
    SEPARATE_CHANNEL_CREATION, SEVERITY, START_TIME, STATUSPAGE_NOTIFICATION,
    SUSPECTED_AFFECTED_COMPONENTS, SUSPECTED_OWNING_TEAM, Widget,
};
use super::payload::{ActionState, InteractionPayload, ViewState};
use crate::model::{DraftFields, IncidentDraft, ValidationError};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unrecognized interaction (type {kind}, callback {callback_id:?})")]
    UnrecognizedInteraction {
        kind: String,
        callback_id: Option<String>,
    },
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid date/time for field: {0}")]
    InvalidDateTime(&'static str),
    #[error("malformed interaction payload: {0}")]
    MalformedPayload(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Choices(Vec<String>),
    Flag(bool),
    Timestamp(NaiveDateTime),
}

/// Decode an untyped interaction document.
pub fn decode_value(value: serde_json::Value) -> Result<IncidentDraft, DecodeError> {
    let payload: InteractionPayload = serde_json::from_value(value)
        .map_err(|err| DecodeError::MalformedPayload(err.to_string()))?;
    decode(&payload)
}

/// Decode a parsed interaction into an incident draft.
///
/// # Errors
/// - [`DecodeError::UnrecognizedInteraction`] for anything other than a
///   `view_submission` of the incident form.
/// - [`DecodeError::MissingField`] / [`DecodeError::InvalidDateTime`] for the
///   first absent or unreadable field.
/// - [`DecodeError::Validation`] when the assembled draft violates a field
///   constraint.
pub fn decode(payload: &InteractionPayload) -> Result<IncidentDraft, DecodeError> {
    let view = match payload.view.as_ref() {
        Some(view)
            if payload.kind == INTERACTION_TYPE
                && view.callback_id.as_deref() == Some(INCIDENT_FORM_CALLBACK_ID) =>
        {
            view
        }
        _ => {
            return Err(DecodeError::UnrecognizedInteraction {
                kind: payload.kind.clone(),
                callback_id: payload.view.as_ref().and_then(|v| v.callback_id.clone()),
            });
        }
    };

    let mut values = HashMap::with_capacity(INCIDENT_FORM_FIELDS.len());
    for spec in INCIDENT_FORM_FIELDS {
        match read_field(&view.state, spec)? {
            Some(value) => {
                values.insert(spec.name, value);
            }
            None if spec.required => return Err(DecodeError::MissingField(spec.name)),
            None => {}
        }
    }

    let mut decoded = DecodedFields { values };
    let fields = DraftFields {
        description: decoded.text(DESCRIPTION)?,
        affected_products: decoded.choices(AFFECTED_PRODUCTS)?,
        severity: decoded.text(SEVERITY)?,
        suspected_owning_team: decoded.choices(SUSPECTED_OWNING_TEAM)?,
        start_time: decoded.timestamp(START_TIME)?,
        end_time: decoded.timestamp(END_TIME)?,
        p1_customer_affected: decoded.flag(P1_CUSTOMER_AFFECTED),
        suspected_affected_components: decoded.choices(SUSPECTED_AFFECTED_COMPONENTS)?,
        message_for_support: decoded.optional_text(MESSAGE_FOR_SUPPORT),
        statuspage_notification: decoded.flag(STATUSPAGE_NOTIFICATION),
        separate_channel_creation: decoded.flag(SEPARATE_CHANNEL_CREATION),
    };
    Ok(IncidentDraft::new(fields)?)
}

fn read_field(state: &ViewState, spec: &FieldSpec) -> Result<Option<FieldValue>, DecodeError> {
    let action = state.action(spec.block_id, spec.action_id);
    let value = match spec.widget {
        Widget::SingleSelect => action
            .and_then(|a| a.selected_option.as_ref())
            .and_then(|option| non_blank(&option.value))
            .map(FieldValue::Text),
        Widget::MultiSelect => {
            let values: Vec<String> = action
                .map(ActionState::option_values)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|value| non_blank(&value))
                .collect();
            (!values.is_empty()).then_some(FieldValue::Choices(values))
        }
        Widget::TextInput => action
            .and_then(|a| a.value.as_deref())
            .and_then(non_blank)
            .map(FieldValue::Text),
        Widget::CheckboxFlag { value } => Some(FieldValue::Flag(
            action.map(|a| a.has_option(value)).unwrap_or(false),
        )),
        Widget::DateTime {
            time_block_id,
            time_action_id,
        } => {
            let date = action.and_then(|a| a.selected_date.as_deref());
            let time = state
                .action(time_block_id, time_action_id)
                .and_then(|a| a.selected_time.as_deref());
            let (Some(date), Some(time)) = (date, time) else {
                return Err(DecodeError::InvalidDateTime(spec.name));
            };
            let timestamp =
                parse_date_time(date, time).ok_or(DecodeError::InvalidDateTime(spec.name))?;
            Some(FieldValue::Timestamp(timestamp))
        }
    };
    Ok(value)
}

/// Combine a date-picker and time-picker value into one timestamp.
pub fn parse_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let combined = format!("{}T{}:00", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&combined, "%Y-%m-%dT%H:%M:%S").ok()
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

struct DecodedFields {
    values: HashMap<&'static str, FieldValue>,
}

impl DecodedFields {
    fn text(&mut self, name: &'static str) -> Result<String, DecodeError> {
        match self.values.remove(name) {
            Some(FieldValue::Text(value)) => Ok(value),
            _ => Err(DecodeError::MissingField(name)),
        }
    }

    fn optional_text(&mut self, name: &'static str) -> Option<String> {
        match self.values.remove(name) {
            Some(FieldValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    fn choices(&mut self, name: &'static str) -> Result<Vec<String>, DecodeError> {
        match self.values.remove(name) {
            Some(FieldValue::Choices(values)) => Ok(values),
            _ => Err(DecodeError::MissingField(name)),
        }
    }

    fn timestamp(&mut self, name: &'static str) -> Result<NaiveDateTime, DecodeError> {
        match self.values.remove(name) {
            Some(FieldValue::Timestamp(value)) => Ok(value),
            _ => Err(DecodeError::InvalidDateTime(name)),
        }
    }

    fn flag(&mut self, name: &'static str) -> bool {
        matches!(self.values.remove(name), Some(FieldValue::Flag(true)))
    }
}
