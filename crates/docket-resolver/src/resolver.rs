//! Merge of the global record with a tenant override
//!
//! Merge policy per section:
//!
//! - **fields**: a tenant list replaces the global list wholesale
//! - **tags**: the global list is the base; a tenant entry adjusts `enabled`
//!   and individual parameter values, everything else stays global
//! - **prompt**, **output**, **model**: whole-value replacement

use crate::error::ResolverError;
use crate::validator::Validator;
use docket_domain::traits::ConfigStore;
use docket_domain::{
    Annotated, AnnotatedConfig, AnnotatedParameter, AnnotatedTag, GlobalConfig, GlobalSection,
    OverrideSection, ResolvedConfig, Section, Source, TagDef, TagOverride, TenantId,
    TenantOverride,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Merge global and override into an annotated configuration
///
/// Override entries for tags the global record no longer defines are ignored,
/// as are values for parameters the global tag no longer has.
///
/// # Examples
///
/// ```
/// use docket_domain::{FieldDef, GlobalConfig, Source, TenantOverride};
/// use docket_resolver::resolve_annotated;
///
/// let global = GlobalConfig::default();
/// let mut overrides = TenantOverride::default();
/// overrides.fields = Some(vec![FieldDef::new("amount", "Amount"), FieldDef::new("vendor", "Vendor")]);
///
/// let annotated = resolve_annotated(&global, &overrides);
/// assert_eq!(annotated.fields.len(), 2);
/// assert!(annotated.fields.iter().all(|f| f.source == Source::Override));
/// assert_eq!(annotated.model.source, Source::Global);
/// ```
pub fn resolve_annotated(global: &GlobalConfig, overrides: &TenantOverride) -> AnnotatedConfig {
    let fields = match &overrides.fields {
        Some(fields) => fields.iter().cloned().map(Annotated::overridden).collect(),
        None => global.fields.iter().cloned().map(Annotated::global).collect(),
    };

    let tags = global
        .tags
        .iter()
        .map(|tag| annotate_tag(tag, overrides.tags.as_ref().and_then(|m| m.get(&tag.id))))
        .collect();

    AnnotatedConfig {
        fields,
        tags,
        prompt: whole(&global.prompt, &overrides.prompt),
        output: whole(&global.output, &overrides.output),
        model: whole(&global.model, &overrides.model),
    }
}

/// Merge global and override into the plain effective configuration
pub fn resolve(global: &GlobalConfig, overrides: &TenantOverride) -> ResolvedConfig {
    resolve_annotated(global, overrides).resolved()
}

fn whole<T: Clone>(global: &T, overridden: &Option<T>) -> Annotated<T> {
    match overridden {
        Some(value) => Annotated::overridden(value.clone()),
        None => Annotated::global(global.clone()),
    }
}

fn annotate_tag(tag: &TagDef, adjustment: Option<&TagOverride>) -> AnnotatedTag {
    let (enabled, enabled_source) = match adjustment.and_then(|a| a.enabled) {
        Some(enabled) => (enabled, Source::Override),
        None => (tag.enabled, Source::Global),
    };

    let parameters = tag
        .parameters
        .iter()
        .map(|param| {
            let (value, source) = match adjustment.and_then(|a| a.parameters.get(&param.name)) {
                Some(value) => (value.clone(), Source::Override),
                None => (param.value.clone(), Source::Global),
            };
            AnnotatedParameter {
                name: param.name.clone(),
                description: param.description.clone(),
                value,
                source,
            }
        })
        .collect();

    AnnotatedTag {
        id: tag.id.clone(),
        label: tag.label.clone(),
        instructions: tag.instructions.clone(),
        enabled,
        source: if adjustment.is_some() {
            Source::Override
        } else {
            Source::Global
        },
        enabled_source,
        parameters,
    }
}

/// Store-backed configuration operations
///
/// Reads always go through the store, so edits made through this resolver
/// are visible to the next resolve.
pub struct ConfigResolver<S: ConfigStore> {
    store: Arc<S>,
    validator: Validator,
}

impl<S> ConfigResolver<S>
where
    S: ConfigStore,
    S::Error: std::fmt::Display,
{
    /// Create a resolver over a store
    pub fn new(store: Arc<S>, validator: Validator) -> Self {
        Self { store, validator }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn store_err(e: S::Error) -> ResolverError {
        ResolverError::Store(e.to_string())
    }

    fn ensure_tenant(&self, tenant: &TenantId) -> Result<(), ResolverError> {
        match self.store.get_tenant(tenant).map_err(Self::store_err)? {
            Some(_) => Ok(()),
            None => Err(ResolverError::NotFound(tenant.to_string())),
        }
    }

    /// Effective configuration of a tenant with provenance
    pub fn get_resolved_config(&self, tenant: &TenantId) -> Result<AnnotatedConfig, ResolverError> {
        self.ensure_tenant(tenant)?;
        let global = self.store.load_global().map_err(Self::store_err)?;
        let overrides = self.store.load_override(tenant).map_err(Self::store_err)?;
        Ok(resolve_annotated(&global, &overrides))
    }

    /// Validate and store one override section, replacing what was there
    pub fn put_override(
        &self,
        tenant: &TenantId,
        section: OverrideSection,
    ) -> Result<AnnotatedConfig, ResolverError> {
        self.ensure_tenant(tenant)?;
        let global = self.store.load_global().map_err(Self::store_err)?;
        self.validator.validate_override(&section, &global)?;

        self.store
            .save_override_section(tenant, &section)
            .map_err(Self::store_err)?;
        info!(tenant = %tenant, section = %section.section(), "Override saved");

        self.get_resolved_config(tenant)
    }

    /// Remove one override section; removing an absent section is a no-op
    pub fn delete_override(
        &self,
        tenant: &TenantId,
        section: Section,
    ) -> Result<AnnotatedConfig, ResolverError> {
        self.ensure_tenant(tenant)?;
        let removed = self
            .store
            .remove_override_section(tenant, section)
            .map_err(Self::store_err)?;
        if removed {
            info!(tenant = %tenant, section = %section, "Override reset");
        } else {
            debug!(tenant = %tenant, section = %section, "Override reset requested but none stored");
        }
        self.get_resolved_config(tenant)
    }

    /// Validate and replace one section of the global record
    pub fn put_global_section(&self, section: GlobalSection) -> Result<GlobalConfig, ResolverError> {
        self.validator.validate_global(&section)?;
        let name = section.section();

        let mut global = self.store.load_global().map_err(Self::store_err)?;
        global.apply(section);
        self.store.save_global(&global).map_err(Self::store_err)?;
        info!(section = %name, "Global section replaced");
        Ok(global)
    }

    /// Current global record
    pub fn global(&self) -> Result<GlobalConfig, ResolverError> {
        self.store.load_global().map_err(Self::store_err)
    }
}

/// Tag adjustments keyed by id, for building override payloads in code
pub fn tag_overrides<I, K>(entries: I) -> BTreeMap<String, TagOverride>
where
    I: IntoIterator<Item = (K, TagOverride)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
