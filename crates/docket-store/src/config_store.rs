//! File-backed configuration store
//!
//! Layout under the data root:
//!
//! ```text
//! global.json
//! tenants/<id>/tenant.json
//! tenants/<id>/overrides/<section>.json
//! ```

use crate::atomic::{read_json, remove_if_exists, write_json};
use crate::error::{Result, StoreError};
use docket_domain::traits::ConfigStore;
use docket_domain::{
    GlobalConfig, OverrideSection, Section, Tenant, TenantId, TenantOverride,
};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// Configuration store keeping one JSON file per record
///
/// The global record is cached after the first read and the cache is replaced
/// only by [`ConfigStore::save_global`].
pub struct FileConfigStore {
    root: PathBuf,
    global_cache: RwLock<Option<GlobalConfig>>,
}

impl FileConfigStore {
    /// Open (or lazily create) a store rooted at the given directory
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("tenants"))?;
        Ok(Self {
            root,
            global_cache: RwLock::new(None),
        })
    }

    /// Data root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything belonging to one tenant
    pub fn tenant_dir(&self, id: &TenantId) -> PathBuf {
        self.root.join("tenants").join(id.as_str())
    }

    fn global_path(&self) -> PathBuf {
        self.root.join("global.json")
    }

    fn section_path(&self, id: &TenantId, section: Section) -> PathBuf {
        self.tenant_dir(id)
            .join("overrides")
            .join(format!("{}.json", section.as_str()))
    }

    fn lock_err<E>(_: E) -> StoreError {
        StoreError::Lock("global config cache".to_string())
    }
}

impl ConfigStore for FileConfigStore {
    type Error = StoreError;

    fn load_global(&self) -> Result<GlobalConfig> {
        if let Some(cached) = self.global_cache.read().map_err(Self::lock_err)?.as_ref() {
            return Ok(cached.clone());
        }

        // Fill under the write lock so a concurrent save cannot be overtaken
        // by a stale read.
        let mut cache = self.global_cache.write().map_err(Self::lock_err)?;
        if let Some(cached) = cache.as_ref() {
            return Ok(cached.clone());
        }

        let config = match read_json::<GlobalConfig>(&self.global_path())? {
            Some(config) => config,
            None => {
                debug!("No global record stored, using starter ruleset");
                GlobalConfig::default()
            }
        };

        *cache = Some(config.clone());
        Ok(config)
    }

    fn save_global(&self, config: &GlobalConfig) -> Result<()> {
        let mut cache = self.global_cache.write().map_err(Self::lock_err)?;
        write_json(&self.global_path(), config)?;
        *cache = Some(config.clone());
        info!("Global configuration saved");
        Ok(())
    }

    fn get_tenant(&self, id: &TenantId) -> Result<Option<Tenant>> {
        read_json(&self.tenant_dir(id).join("tenant.json"))
    }

    fn list_tenants(&self) -> Result<Vec<Tenant>> {
        let entries = match fs::read_dir(self.root.join("tenants")) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut tenants = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                debug!(path = %entry.path().display(), "Skipping non-directory under tenants");
                continue;
            }
            if let Some(tenant) = read_json::<Tenant>(&entry.path().join("tenant.json"))? {
                tenants.push(tenant);
            }
        }
        tenants.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tenants)
    }

    fn put_tenant(&self, tenant: &Tenant) -> Result<()> {
        write_json(&self.tenant_dir(&tenant.id).join("tenant.json"), tenant)?;
        debug!(tenant = %tenant.id, "Tenant saved");
        Ok(())
    }

    fn load_override(&self, id: &TenantId) -> Result<TenantOverride> {
        let mut overrides = TenantOverride::default();
        for section in Section::ALL {
            let path = self.section_path(id, section);
            if let Some(payload) = read_json::<Value>(&path)? {
                let decoded = OverrideSection::from_json(section, payload)
                    .map_err(|reason| StoreError::Corrupt { path, reason })?;
                overrides.set(decoded);
            }
        }
        Ok(overrides)
    }

    fn save_override_section(&self, id: &TenantId, section: &OverrideSection) -> Result<()> {
        write_json(&self.section_path(id, section.section()), &section.to_json())?;
        debug!(tenant = %id, section = %section.section(), "Override section saved");
        Ok(())
    }

    fn remove_override_section(&self, id: &TenantId, section: Section) -> Result<bool> {
        let removed = remove_if_exists(&self.section_path(id, section))?;
        debug!(tenant = %id, section = %section, removed, "Override section removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_domain::FieldDef;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn tenant(id: &str) -> Tenant {
        Tenant::new(TenantId::parse(id).unwrap(), id.to_uppercase(), format!("/docs/{}", id))
    }

    #[test]
    fn test_global_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path()).unwrap();
        assert_eq!(store.load_global().unwrap(), GlobalConfig::default());
    }

    #[test]
    fn test_global_cache_invalidated_by_save() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path()).unwrap();
        store.load_global().unwrap();

        let mut global = GlobalConfig::default();
        global.model = "changed".to_string();
        store.save_global(&global).unwrap();
        assert_eq!(store.load_global().unwrap().model, "changed");
    }

    #[test]
    fn test_global_cache_ignores_external_edits() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path()).unwrap();
        store.save_global(&GlobalConfig::default()).unwrap();
        store.load_global().unwrap();

        let mut edited = GlobalConfig::default();
        edited.model = "edited-behind-our-back".to_string();
        write_json(&dir.path().join("global.json"), &edited).unwrap();

        assert_eq!(store.load_global().unwrap().model, GlobalConfig::default().model);
    }

    #[test]
    fn test_global_save_wins_over_concurrent_first_load() {
        let dir = TempDir::new().unwrap();
        let mut old = GlobalConfig::default();
        old.model = "old".to_string();
        let mut new = GlobalConfig::default();
        new.model = "new".to_string();

        for _ in 0..200 {
            write_json(&dir.path().join("global.json"), &old).unwrap();
            let store = Arc::new(FileConfigStore::new(dir.path()).unwrap());

            let loader = {
                let store = store.clone();
                thread::spawn(move || store.load_global().unwrap())
            };
            store.save_global(&new).unwrap();
            loader.join().unwrap();

            assert_eq!(store.load_global().unwrap().model, "new");
        }
    }

    #[test]
    fn test_stray_files_under_tenants_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path()).unwrap();
        store.put_tenant(&tenant("acme")).unwrap();
        fs::write(dir.path().join("tenants").join(".DS_Store"), b"junk").unwrap();

        let tenants = store.list_tenants().unwrap();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0].id.as_str(), "acme");
    }

    #[test]
    fn test_tenants_sorted() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path()).unwrap();
        store.put_tenant(&tenant("zeta")).unwrap();
        store.put_tenant(&tenant("acme")).unwrap();

        let ids: Vec<String> = store
            .list_tenants()
            .unwrap()
            .into_iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(ids, vec!["acme", "zeta"]);
        assert!(store.get_tenant(&TenantId::parse("nobody").unwrap()).unwrap().is_none());
    }

    #[test]
    fn test_override_sections_roundtrip_independently() {
        let dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(dir.path()).unwrap();
        let id = TenantId::parse("acme").unwrap();

        store
            .save_override_section(&id, &OverrideSection::Fields(vec![FieldDef::new("a", "A")]))
            .unwrap();
        store
            .save_override_section(&id, &OverrideSection::Model("m2".to_string()))
            .unwrap();

        let loaded = store.load_override(&id).unwrap();
        assert_eq!(loaded.fields.as_ref().map(Vec::len), Some(1));
        assert_eq!(loaded.model.as_deref(), Some("m2"));
        assert!(loaded.prompt.is_none());

        assert!(store.remove_override_section(&id, Section::Model).unwrap());
        assert!(!store.remove_override_section(&id, Section::Model).unwrap());
        assert!(store.load_override(&id).unwrap().model.is_none());
    }
}
