//! Stand-in for integrations whose credentials are not configured.
//!
//! Every call fails with [`DispatchError::NotConfigured`], so a missing
//! integration shows up as a reported partial failure instead of a silent
//! success.
use super::{AlertDispatcher, DispatchError, ModalOpener, TicketDispatcher, TicketKey};
use crate::model::IncidentRecord;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy)]
pub struct DisabledDispatcher {
    integration: &'static str,
}

impl DisabledDispatcher {
    pub fn new(integration: &'static str) -> Self {
        Self { integration }
    }
}

#[async_trait]
impl AlertDispatcher for DisabledDispatcher {
    async fn send(&self, _incident: &IncidentRecord) -> Result<(), DispatchError> {
        Err(DispatchError::NotConfigured(self.integration))
    }
}

#[async_trait]
impl TicketDispatcher for DisabledDispatcher {
    async fn open(&self, _incident: &IncidentRecord) -> Result<TicketKey, DispatchError> {
        Err(DispatchError::NotConfigured(self.integration))
    }
}

#[async_trait]
impl ModalOpener for DisabledDispatcher {
    async fn open_modal(&self, _trigger_id: &str) -> Result<(), DispatchError> {
        Err(DispatchError::NotConfigured(self.integration))
    }
}
