//! Declarative mapping from incident form widgets to incident fields.
//!
//! Each entry names the logical field, where its widget lives in
//! `view.state.values`, and how the widget's value is read. The decoder walks
//! this table in order and stops at the first missing required field, so the
//! order here is the order in which problems are reported to the submitter.

/// How a widget's state is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    /// `selected_option.value`.
    SingleSelect,
    /// `selected_options[*].value`, with a bare `selected_option` accepted.
    MultiSelect,
    /// `value` of a plain text input.
    TextInput,
    /// True iff `value` is among the block's `selected_options`.
    CheckboxFlag { value: &'static str },
    /// Date picker at the field's own ids plus a time picker at `time_*`.
    DateTime {
        time_block_id: &'static str,
        time_action_id: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub block_id: &'static str,
    pub action_id: &'static str,
    pub widget: Widget,
    pub required: bool,
}

pub const INTERACTION_TYPE: &str = "view_submission";
pub const INCIDENT_FORM_CALLBACK_ID: &str = "incident_form";

pub const DESCRIPTION: &str = "description";
pub const AFFECTED_PRODUCTS: &str = "affected_products";
pub const SEVERITY: &str = "severity";
pub const SUSPECTED_OWNING_TEAM: &str = "suspected_owning_team";
pub const START_TIME: &str = "start_time";
pub const END_TIME: &str = "end_time";
pub const P1_CUSTOMER_AFFECTED: &str = "p1_customer_affected";
pub const SUSPECTED_AFFECTED_COMPONENTS: &str = "suspected_affected_components";
pub const MESSAGE_FOR_SUPPORT: &str = "message_for_support";
pub const STATUSPAGE_NOTIFICATION: &str = "statuspage_notification";
pub const SEPARATE_CHANNEL_CREATION: &str = "separate_channel_creation";

const FLAGS_BLOCK: &str = "flags_for_statuspage_notification";
const FLAGS_ACTION: &str = "flags_for_statuspage_notification_action";

pub const INCIDENT_FORM_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: DESCRIPTION,
        block_id: "description",
        action_id: "description_action",
        widget: Widget::TextInput,
        required: true,
    },
    FieldSpec {
        name: AFFECTED_PRODUCTS,
        block_id: "affected_products",
        action_id: "affected_products_action",
        widget: Widget::MultiSelect,
        required: true,
    },
    FieldSpec {
        name: SEVERITY,
        block_id: "severity",
        action_id: "severity_action",
        widget: Widget::SingleSelect,
        required: true,
    },
    FieldSpec {
        name: SUSPECTED_OWNING_TEAM,
        block_id: "suspected_owning_team",
        action_id: "suspected_owning_team_action",
        widget: Widget::MultiSelect,
        required: true,
    },
    FieldSpec {
        name: START_TIME,
        block_id: "start_time",
        action_id: "start_time_action",
        widget: Widget::DateTime {
            time_block_id: "start_time_picker",
            time_action_id: "start_time_picker_action",
        },
        required: true,
    },
    FieldSpec {
        name: END_TIME,
        block_id: "end_time",
        action_id: "end_time_action",
        widget: Widget::DateTime {
            time_block_id: "end_time_picker",
            time_action_id: "end_time_picker_action",
        },
        required: true,
    },
    FieldSpec {
        name: P1_CUSTOMER_AFFECTED,
        block_id: "p1_customer_affected",
        action_id: "p1_customer_affected_action",
        widget: Widget::CheckboxFlag {
            value: "p1_customer_affected",
        },
        required: false,
    },
    FieldSpec {
        name: SUSPECTED_AFFECTED_COMPONENTS,
        block_id: "suspected_affected_components",
        action_id: "suspected_affected_components_action",
        widget: Widget::MultiSelect,
        required: true,
    },
    FieldSpec {
        name: MESSAGE_FOR_SUPPORT,
        block_id: "message_for_sp",
        action_id: "message_for_sp_action",
        widget: Widget::TextInput,
        required: false,
    },
    FieldSpec {
        name: STATUSPAGE_NOTIFICATION,
        block_id: FLAGS_BLOCK,
        action_id: FLAGS_ACTION,
        widget: Widget::CheckboxFlag {
            value: "statuspage_notification",
        },
        required: false,
    },
    FieldSpec {
        name: SEPARATE_CHANNEL_CREATION,
        block_id: FLAGS_BLOCK,
        action_id: FLAGS_ACTION,
        widget: Widget::CheckboxFlag {
            value: "separate_channel_creation",
        },
        required: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn field_names_are_unique() {
        let names: HashSet<_> = INCIDENT_FORM_FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), INCIDENT_FORM_FIELDS.len());
    }

    #[test]
    fn description_is_checked_first() {
        assert_eq!(INCIDENT_FORM_FIELDS[0].name, DESCRIPTION);
    }

    #[test]
    fn shared_checkbox_blocks_use_distinct_values() {
        let flags: Vec<_> = INCIDENT_FORM_FIELDS
            .iter()
            .filter(|f| f.block_id == FLAGS_BLOCK)
            .map(|f| f.widget)
            .collect();
        assert_eq!(flags.len(), 2);
        assert_ne!(flags[0], flags[1]);
    }
}
