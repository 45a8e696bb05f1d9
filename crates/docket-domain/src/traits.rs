//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{GlobalConfig, OverrideSection, Section, Tenant, TenantId, TenantOverride};

/// Trait for persisting the global record, tenants and override sections
///
/// Implemented by the infrastructure layer (docket-store). Implementations
/// must be safe to share between tasks; the global record is read far more
/// often than it is written.
pub trait ConfigStore: Send + Sync {
    /// Error type for store operations
    type Error;

    /// Load the global record, falling back to the starter ruleset
    fn load_global(&self) -> Result<GlobalConfig, Self::Error>;

    /// Replace the global record
    fn save_global(&self, config: &GlobalConfig) -> Result<(), Self::Error>;

    /// Get a tenant by id
    fn get_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, Self::Error>;

    /// List every tenant, ordered by id
    fn list_tenants(&self) -> Result<Vec<Tenant>, Self::Error>;

    /// Create or update a tenant
    fn put_tenant(&self, tenant: &Tenant) -> Result<(), Self::Error>;

    /// Load every stored override section of a tenant
    fn load_override(&self, id: &TenantId) -> Result<TenantOverride, Self::Error>;

    /// Persist one section of a tenant's override, replacing what was stored
    fn save_override_section(&self, id: &TenantId, section: &OverrideSection)
        -> Result<(), Self::Error>;

    /// Delete one stored section; returns whether anything was removed
    fn remove_override_section(&self, id: &TenantId, section: Section)
        -> Result<bool, Self::Error>;
}
