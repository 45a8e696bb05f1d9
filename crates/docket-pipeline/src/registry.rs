//! Per-tenant run exclusion

use crate::error::PipelineError;
use docket_domain::TenantId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct RegistryState {
    next_token: u64,
    running: HashMap<TenantId, u64>,
}

/// Tenants with a run in flight
///
/// Acquisition is an atomic insert-if-absent. Each entry carries a token, and
/// only the guard holding that token can remove it, so an entry is released
/// exactly once.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl RunRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // The state is a plain map, consistent even after a panic elsewhere.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the tenant, or fail without touching the registry
    pub fn try_acquire(&self, tenant: &TenantId) -> Result<RunGuard, PipelineError> {
        let mut state = self.lock();
        if state.running.contains_key(tenant) {
            return Err(PipelineError::AlreadyRunning(tenant.to_string()));
        }
        state.next_token += 1;
        let token = state.next_token;
        state.running.insert(tenant.clone(), token);
        debug!(tenant = %tenant, token, "Run lock acquired");

        Ok(RunGuard {
            registry: self.clone(),
            tenant: tenant.clone(),
            token,
        })
    }

    /// Whether a run is in flight for the tenant
    pub fn is_running(&self, tenant: &TenantId) -> bool {
        self.lock().running.contains_key(tenant)
    }

    /// Tenants with a run in flight, sorted
    pub fn running(&self) -> Vec<TenantId> {
        let mut tenants: Vec<TenantId> = self.lock().running.keys().cloned().collect();
        tenants.sort();
        tenants
    }
}

/// Proof of a held tenant claim; dropping it releases the claim
#[derive(Debug)]
pub struct RunGuard {
    registry: RunRegistry,
    tenant: TenantId,
    token: u64,
}

impl RunGuard {
    /// Tenant this guard holds
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut state = self.registry.lock();
        if state.running.get(&self.tenant) == Some(&self.token) {
            state.running.remove(&self.tenant);
            debug!(tenant = %self.tenant, token = self.token, "Run lock released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> TenantId {
        TenantId::parse(id).unwrap()
    }

    #[test]
    fn test_second_acquire_rejected() {
        let registry = RunRegistry::new();
        let guard = registry.try_acquire(&tenant("acme")).unwrap();

        let err = registry.try_acquire(&tenant("acme")).unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyRunning(_)));
        assert!(registry.is_running(guard.tenant()));
    }

    #[test]
    fn test_tenants_are_independent() {
        let registry = RunRegistry::new();
        let _a = registry.try_acquire(&tenant("acme")).unwrap();
        let _b = registry.try_acquire(&tenant("globex")).unwrap();
        assert_eq!(registry.running(), vec![tenant("acme"), tenant("globex")]);
    }

    #[test]
    fn test_drop_releases() {
        let registry = RunRegistry::new();
        drop(registry.try_acquire(&tenant("acme")).unwrap());
        assert!(!registry.is_running(&tenant("acme")));
        assert!(registry.try_acquire(&tenant("acme")).is_ok());
    }

    #[test]
    fn test_rejected_acquire_leaves_holder_in_place() {
        let registry = RunRegistry::new();
        let first = registry.try_acquire(&tenant("acme")).unwrap();
        assert!(registry.try_acquire(&tenant("acme")).is_err());
        assert!(registry.is_running(&tenant("acme")));
        drop(first);
        assert!(registry.running().is_empty());
    }
}
