//! Incident draft and record definitions.
//!
//! # Purpose
//! Defines the validated, not-yet-persisted [`IncidentDraft`] produced by the
//! interaction decoder and the [`IncidentRecord`] owned by the store once the
//! draft has been persisted.
//!
//! # Key invariants
//! - A draft can only be built through [`IncidentDraft::new`], which enforces
//!   every field constraint. There is no partially-populated draft.
//! - Multi-value fields are always sequences or sets, never bare strings.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

pub const MAX_DESCRIPTION_LEN: usize = 250;
pub const MAX_SUPPORT_MESSAGE_LEN: usize = 250;
pub const MAX_PRODUCT_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(ValidationError::UnknownSeverity(other.to_string())),
        }
    }
}

/// Field constraint violations raised while constructing a draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
    #[error("end_time must not be before start_time")]
    EndBeforeStart,
}

/// Unvalidated draft input.
///
/// The decoder fills this from an interaction payload and the Postgres store
/// fills it from a row. Only [`IncidentDraft::new`] turns it into something
/// the rest of the service accepts.
#[derive(Debug, Clone)]
pub struct DraftFields {
    pub affected_products: Vec<String>,
    pub severity: String,
    pub suspected_owning_team: Vec<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub p1_customer_affected: bool,
    pub suspected_affected_components: Vec<String>,
    pub description: String,
    pub message_for_support: Option<String>,
    pub statuspage_notification: bool,
    pub separate_channel_creation: bool,
}

/// A fully validated incident that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IncidentDraft {
    #[schema(value_type = Vec<String>)]
    affected_products: BTreeSet<String>,
    severity: Severity,
    suspected_owning_team: Vec<String>,
    #[schema(value_type = String, format = DateTime)]
    start_time: NaiveDateTime,
    #[schema(value_type = String, format = DateTime)]
    end_time: NaiveDateTime,
    p1_customer_affected: bool,
    #[schema(value_type = Vec<String>)]
    suspected_affected_components: BTreeSet<String>,
    description: String,
    message_for_support: Option<String>,
    statuspage_notification: bool,
    separate_channel_creation: bool,
}

impl IncidentDraft {
    pub fn new(fields: DraftFields) -> Result<Self, ValidationError> {
        let affected_products = normalize_set(fields.affected_products);
        if affected_products.is_empty() {
            return Err(ValidationError::Empty("affected_products"));
        }
        if affected_products
            .iter()
            .any(|product| product.chars().count() > MAX_PRODUCT_LEN)
        {
            return Err(ValidationError::TooLong {
                field: "affected_products",
                max: MAX_PRODUCT_LEN,
            });
        }

        let severity = fields.severity.parse::<Severity>()?;

        // Order is meaningful for teams; only blanks and repeats are dropped.
        let mut suspected_owning_team: Vec<String> = Vec::new();
        for team in fields.suspected_owning_team {
            let team = team.trim().to_string();
            if !team.is_empty() && !suspected_owning_team.contains(&team) {
                suspected_owning_team.push(team);
            }
        }
        if suspected_owning_team.is_empty() {
            return Err(ValidationError::Empty("suspected_owning_team"));
        }

        let suspected_affected_components = normalize_set(fields.suspected_affected_components);
        if suspected_affected_components.is_empty() {
            return Err(ValidationError::Empty("suspected_affected_components"));
        }

        if fields.end_time < fields.start_time {
            return Err(ValidationError::EndBeforeStart);
        }

        let description = fields.description.trim().to_string();
        if description.is_empty() {
            return Err(ValidationError::Empty("description"));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "description",
                max: MAX_DESCRIPTION_LEN,
            });
        }

        let message_for_support = fields
            .message_for_support
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty());
        if let Some(message) = &message_for_support {
            if message.chars().count() > MAX_SUPPORT_MESSAGE_LEN {
                return Err(ValidationError::TooLong {
                    field: "message_for_support",
                    max: MAX_SUPPORT_MESSAGE_LEN,
                });
            }
        }

        Ok(Self {
            affected_products,
            severity,
            suspected_owning_team,
            start_time: fields.start_time,
            end_time: fields.end_time,
            p1_customer_affected: fields.p1_customer_affected,
            suspected_affected_components,
            description,
            message_for_support,
            statuspage_notification: fields.statuspage_notification,
            separate_channel_creation: fields.separate_channel_creation,
        })
    }

    pub fn affected_products(&self) -> &BTreeSet<String> {
        &self.affected_products
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn suspected_owning_team(&self) -> &[String] {
        &self.suspected_owning_team
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    pub fn p1_customer_affected(&self) -> bool {
        self.p1_customer_affected
    }

    pub fn suspected_affected_components(&self) -> &BTreeSet<String> {
        &self.suspected_affected_components
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn message_for_support(&self) -> Option<&str> {
        self.message_for_support.as_deref()
    }

    pub fn statuspage_notification(&self) -> bool {
        self.statuspage_notification
    }

    pub fn separate_channel_creation(&self) -> bool {
        self.separate_channel_creation
    }
}

fn normalize_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// A persisted incident. Core fields never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IncidentRecord {
    pub id: i64,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub incident: IncidentDraft,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").expect("timestamp")
    }

    fn fields() -> DraftFields {
        DraftFields {
            affected_products: vec!["product_1".to_string()],
            severity: "high".to_string(),
            suspected_owning_team: vec!["team_1".to_string()],
            start_time: at("2024-01-01T00:00:00"),
            end_time: at("2024-01-01T01:00:00"),
            p1_customer_affected: false,
            suspected_affected_components: vec!["component_1".to_string()],
            description: "db outage".to_string(),
            message_for_support: None,
            statuspage_notification: false,
            separate_channel_creation: false,
        }
    }

    #[test]
    fn builds_valid_draft() {
        let draft = IncidentDraft::new(fields()).expect("draft");
        assert_eq!(draft.severity(), Severity::High);
        assert!(draft.affected_products().contains("product_1"));
        assert_eq!(draft.suspected_owning_team(), ["team_1".to_string()]);
        assert_eq!(draft.description(), "db outage");
    }

    #[test]
    fn rejects_empty_collections() {
        let mut input = fields();
        input.affected_products = vec!["  ".to_string()];
        assert_eq!(
            IncidentDraft::new(input).unwrap_err(),
            ValidationError::Empty("affected_products")
        );

        let mut input = fields();
        input.suspected_owning_team.clear();
        assert_eq!(
            IncidentDraft::new(input).unwrap_err(),
            ValidationError::Empty("suspected_owning_team")
        );

        let mut input = fields();
        input.suspected_affected_components.clear();
        assert_eq!(
            IncidentDraft::new(input).unwrap_err(),
            ValidationError::Empty("suspected_affected_components")
        );
    }

    #[test]
    fn rejects_end_before_start() {
        let mut input = fields();
        input.end_time = at("2023-12-31T23:00:00");
        assert_eq!(
            IncidentDraft::new(input).unwrap_err(),
            ValidationError::EndBeforeStart
        );
    }

    #[test]
    fn enforces_text_bounds() {
        let mut input = fields();
        input.description = "   ".to_string();
        assert_eq!(
            IncidentDraft::new(input).unwrap_err(),
            ValidationError::Empty("description")
        );

        let mut input = fields();
        input.description = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(matches!(
            IncidentDraft::new(input).unwrap_err(),
            ValidationError::TooLong {
                field: "description",
                ..
            }
        ));

        let mut input = fields();
        input.message_for_support = Some("y".repeat(MAX_SUPPORT_MESSAGE_LEN + 1));
        assert!(matches!(
            IncidentDraft::new(input).unwrap_err(),
            ValidationError::TooLong {
                field: "message_for_support",
                ..
            }
        ));
    }

    #[test]
    fn blank_support_message_becomes_none() {
        let mut input = fields();
        input.message_for_support = Some("  ".to_string());
        let draft = IncidentDraft::new(input).expect("draft");
        assert_eq!(draft.message_for_support(), None);
    }

    #[test]
    fn severity_parsing_is_case_insensitive_and_closed() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("low".parse::<Severity>().unwrap(), Severity::Low);
        assert!(matches!(
            "critical".parse::<Severity>(),
            Err(ValidationError::UnknownSeverity(_))
        ));
    }

    #[test]
    fn team_order_is_preserved_and_deduplicated() {
        let mut input = fields();
        input.suspected_owning_team = vec![
            "team_2".to_string(),
            "team_1".to_string(),
            "team_2".to_string(),
        ];
        let draft = IncidentDraft::new(input).expect("draft");
        assert_eq!(
            draft.suspected_owning_team(),
            ["team_2".to_string(), "team_1".to_string()]
        );
    }

    #[test]
    fn record_serializes_flat() {
        let record = IncidentRecord {
            id: 7,
            created_at: Utc::now(),
            status: None,
            incident: IncidentDraft::new(fields()).expect("draft"),
        };
        let value = serde_json::to_value(&record).expect("json");
        assert_eq!(value["id"], 7);
        assert_eq!(value["severity"], "high");
        assert_eq!(value["affected_products"][0], "product_1");
        assert_eq!(value["start_time"], "2024-01-01T00:00:00");
    }
}
