//! Per-tenant delivery channel registry.
//!
//! Replaces a process-wide singleton manager with an explicit map owned by
//! the composition root: lifetime and test isolation are both visible at the
//! wiring site.

use std::collections::HashMap;
use std::sync::Arc;

use super::DeliveryChannel;

/// Maps tenant ids to their configured delivery channel clients.
#[derive(Default)]
pub struct ChannelRegistry {
    clients: HashMap<String, Arc<dyn DeliveryChannel>>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the channel client for a tenant.
    pub fn register(&mut self, tenant_id: &str, client: Arc<dyn DeliveryChannel>) {
        self.clients.insert(tenant_id.to_owned(), client);
    }

    /// Look up the channel client for a tenant.
    pub fn get(&self, tenant_id: &str) -> Option<Arc<dyn DeliveryChannel>> {
        self.clients.get(tenant_id).map(Arc::clone)
    }

    /// Remove a tenant's client, returning whether one was registered.
    pub fn remove(&mut self, tenant_id: &str) -> bool {
        self.clients.remove(tenant_id).is_some()
    }

    /// Number of registered tenants.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no tenants are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
