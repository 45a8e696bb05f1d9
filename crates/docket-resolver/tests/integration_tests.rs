//! Integration tests for docket-resolver
//!
//! These tests drive the store-backed resolver through override writes and
//! resets, and check provenance properties over generated configurations.

use docket_domain::traits::ConfigStore;
use docket_domain::{
    FieldDef, GlobalConfig, GlobalSection, OverrideSection, Section, Source, TagDef, TagOverride,
    Tenant, TenantId, TenantOverride,
};
use docket_resolver::{
    resolve_annotated, tag_overrides, ConfigResolver, ResolverError, Validator,
};
use docket_store::FileConfigStore;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn setup() -> (TempDir, ConfigResolver<FileConfigStore>, TenantId) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileConfigStore::new(dir.path()).unwrap());
    let id = TenantId::parse("acme").unwrap();
    store
        .put_tenant(&Tenant::new(id.clone(), "Acme", dir.path().join("docs")))
        .unwrap();
    (dir, ConfigResolver::new(store, Validator::default()), id)
}

#[test]
fn test_unknown_tenant_not_found() {
    let (_dir, resolver, _) = setup();
    let ghost = TenantId::parse("ghost").unwrap();
    assert!(matches!(
        resolver.get_resolved_config(&ghost),
        Err(ResolverError::NotFound(_))
    ));
    assert!(matches!(
        resolver.put_override(&ghost, OverrideSection::Model("m".to_string())),
        Err(ResolverError::NotFound(_))
    ));
    assert!(matches!(
        resolver.delete_override(&ghost, Section::Model),
        Err(ResolverError::NotFound(_))
    ));
}

#[test]
fn test_put_override_replaces_and_annotates() {
    let (_dir, resolver, id) = setup();

    let payload = json!([{"key": "amount"}, {"key": "vendor"}]);
    let section = OverrideSection::from_json(Section::Fields, payload).unwrap();
    let annotated = resolver.put_override(&id, section).unwrap();
    assert_eq!(annotated.fields.len(), 2);
    assert!(annotated.fields.iter().all(|f| f.source == Source::Override));

    let annotated = resolver
        .put_override(&id, OverrideSection::Fields(vec![FieldDef::new("total", "Total")]))
        .unwrap();
    assert_eq!(annotated.fields.len(), 1);
    assert_eq!(annotated.fields[0].value.key, "total");
}

#[test]
fn test_empty_fields_override_rejected_and_not_stored() {
    let (_dir, resolver, id) = setup();
    let err = resolver
        .put_override(&id, OverrideSection::Fields(vec![]))
        .unwrap_err();
    assert!(matches!(err, ResolverError::Validation { section: Section::Fields, .. }));

    let annotated = resolver.get_resolved_config(&id).unwrap();
    assert!(annotated.fields.iter().all(|f| f.source == Source::Global));
}

#[test]
fn test_reset_is_idempotent_and_matches_fresh_tenant() {
    let (_dir, resolver, id) = setup();
    let fresh = resolver.get_resolved_config(&id).unwrap();

    resolver
        .put_override(&id, OverrideSection::Model("tenant-model".to_string()))
        .unwrap();
    resolver
        .put_override(
            &id,
            OverrideSection::Tags(tag_overrides([("urgent", TagOverride::enabled(false))])),
        )
        .unwrap();

    resolver.delete_override(&id, Section::Model).unwrap();
    let after = resolver.delete_override(&id, Section::Tags).unwrap();
    assert_eq!(after, fresh);

    let again = resolver.delete_override(&id, Section::Tags).unwrap();
    assert_eq!(again, fresh);
}

#[test]
fn test_global_write_visible_to_tenants() {
    let (_dir, resolver, id) = setup();
    resolver
        .put_global_section(GlobalSection::Model("next-model".to_string()))
        .unwrap();
    let annotated = resolver.get_resolved_config(&id).unwrap();
    assert_eq!(annotated.model.value, "next-model");
    assert_eq!(annotated.model.source, Source::Global);

    assert!(resolver
        .put_global_section(GlobalSection::Tags(vec![TagDef::new("Bad Id", "x")]))
        .is_err());
    assert_eq!(resolver.global().unwrap().tags, GlobalConfig::default().tags);
}

#[test]
fn test_tag_override_for_unknown_tag_rejected() {
    let (_dir, resolver, id) = setup();
    let err = resolver
        .put_override(
            &id,
            OverrideSection::Tags(tag_overrides([("nosuch", TagOverride::enabled(true))])),
        )
        .unwrap_err();
    assert!(err.to_string().contains("unknown tag 'nosuch'"));
}

fn arb_tag() -> impl Strategy<Value = TagDef> {
    ("[a-z]{1,6}", prop::collection::vec("[a-z]{1,4}", 0..3)).prop_map(|(id, params)| {
        let mut tag = TagDef::new(id, "instructions");
        for (i, name) in params.into_iter().enumerate() {
            tag = tag.with_parameter(format!("{}{}", name, i), i.to_string());
        }
        tag
    })
}

fn arb_global() -> impl Strategy<Value = GlobalConfig> {
    (
        prop::collection::vec("[a-z]{1,8}", 1..5),
        prop::collection::vec(arb_tag(), 0..4),
    )
        .prop_map(|(keys, tags)| {
            let mut global = GlobalConfig::default();
            global.fields = keys
                .into_iter()
                .enumerate()
                .map(|(i, k)| FieldDef::new(format!("{}{}", k, i), k))
                .collect();
            let mut seen = std::collections::HashSet::new();
            global.tags = tags.into_iter().filter(|t| seen.insert(t.id.clone())).collect();
            global
        })
}

proptest! {
    #[test]
    fn prop_absent_sections_are_global(global in arb_global()) {
        let annotated = resolve_annotated(&global, &TenantOverride::default());
        for section in Section::ALL {
            prop_assert!(annotated.section_sources(section).iter().all(|s| *s == Source::Global));
        }
    }

    #[test]
    fn prop_present_sections_follow_policy(
        global in arb_global(),
        toggle in any::<bool>(),
        set_enabled in any::<bool>(),
        set_first_param in any::<bool>(),
    ) {
        let mut overrides = TenantOverride::default();
        overrides.fields = Some(vec![FieldDef::new("only", "Only")]);
        overrides.model = Some("m".to_string());

        let mut map = std::collections::BTreeMap::new();
        for tag in &global.tags {
            let mut adjustment = TagOverride::default();
            if set_enabled {
                adjustment.enabled = Some(toggle);
            }
            if set_first_param {
                if let Some(param) = tag.parameters.first() {
                    adjustment.parameters.insert(param.name.clone(), "x".to_string());
                }
            }
            map.insert(tag.id.clone(), adjustment);
        }
        overrides.tags = Some(map);

        let annotated = resolve_annotated(&global, &overrides);
        prop_assert!(annotated.section_sources(Section::Fields).iter().all(|s| *s == Source::Override));
        prop_assert_eq!(annotated.model.source, Source::Override);
        prop_assert_eq!(annotated.prompt.source, Source::Global);

        for tag in &annotated.tags {
            let expected = if set_enabled { Source::Override } else { Source::Global };
            prop_assert_eq!(tag.enabled_source, expected);
            for (i, param) in tag.parameters.iter().enumerate() {
                let expected = if set_first_param && i == 0 { Source::Override } else { Source::Global };
                prop_assert_eq!(param.source, expected);
            }
        }
    }
}
