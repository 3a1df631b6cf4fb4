//! Typed view of the Slack interaction payload.
//!
//! Only the parts of the payload the decoder reads are modeled. Every lookup
//! is optional so that absent widgets surface as decode errors naming the
//! field rather than as deserialization failures for the whole payload.
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionPayload {
    /// Empty when the payload carries no `type`; such payloads are not ours.
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<InteractionUser>,
    #[serde(default)]
    pub view: Option<View>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct View {
    #[serde(default, alias = "callbackId")]
    pub callback_id: Option<String>,
    #[serde(default)]
    pub state: ViewState,
}

/// `view.state.values`: block id -> action id -> widget state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, ActionState>>,
}

impl ViewState {
    pub fn action(&self, block_id: &str, action_id: &str) -> Option<&ActionState> {
        self.values.get(block_id)?.get(action_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionState {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "selectedOption")]
    pub selected_option: Option<SelectedOption>,
    #[serde(default, alias = "selectedOptions")]
    pub selected_options: Option<OneOrMany<SelectedOption>>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, alias = "selectedDate")]
    pub selected_date: Option<String>,
    #[serde(default, alias = "selectedTime")]
    pub selected_time: Option<String>,
}

impl ActionState {
    /// Values of a choice widget, always as a sequence.
    ///
    /// Multi-selects report `selected_options`; single selects used for
    /// multi-valued fields report `selected_option`. Both collapse here.
    pub fn option_values(&self) -> Vec<String> {
        match (&self.selected_options, &self.selected_option) {
            (Some(options), _) => options
                .as_slice()
                .iter()
                .map(|option| option.value.clone())
                .collect(),
            (None, Some(option)) => vec![option.value.clone()],
            (None, None) => Vec::new(),
        }
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.selected_options
            .as_ref()
            .map(|options| options.as_slice().iter().any(|option| option.value == value))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

/// Accepts either a JSON array or a single bare item.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => std::slice::from_ref(item),
        }
    }
}
