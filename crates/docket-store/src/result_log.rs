//! Per-tenant result log
//!
//! Each tenant's records live in a single JSON array at
//! `tenants/<id>/results.json`. Every mutation is a read-modify-write of the
//! whole file performed under that tenant's lock and finished with an atomic
//! replace, so concurrent writers never lose an append or update and readers
//! never observe a partial file.

use crate::atomic::{read_json, write_json};
use crate::error::{Result, StoreError};
use chrono::Utc;
use docket_domain::{Outcome, RecordId, RecordMeta, RecordStatus, ResultRecord, TenantId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Page size used when a listing does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page a listing may return
pub const MAX_PAGE_SIZE: usize = 250;

/// Filter and pagination of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Only records with this status
    #[serde(default)]
    pub status: Option<RecordStatus>,

    /// Page size, clamped to `1..=250`; 50 when absent
    #[serde(default)]
    pub limit: Option<usize>,

    /// Records to skip
    #[serde(default)]
    pub offset: usize,
}

impl ListQuery {
    /// Effective page size
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    /// Records on this page, newest first
    pub records: Vec<ResultRecord>,

    /// Matching records across all pages
    pub total: usize,

    /// Whether records remain past this page
    pub has_more: bool,
}

/// Append-only per-tenant log of result records
pub struct ResultLog {
    root: PathBuf,
    locks: Mutex<HashMap<TenantId, Arc<Mutex<()>>>>,
}

impl ResultLog {
    /// Create a log rooted at the store's data directory
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn path(&self, tenant: &TenantId) -> PathBuf {
        self.root
            .join("tenants")
            .join(tenant.as_str())
            .join("results.json")
    }

    fn tenant_lock(&self, tenant: &TenantId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| StoreError::Lock("result log registry".to_string()))?;
        Ok(locks.entry(tenant.clone()).or_default().clone())
    }

    fn load(&self, tenant: &TenantId) -> Result<Vec<ResultRecord>> {
        Ok(read_json(&self.path(tenant))?.unwrap_or_default())
    }

    /// Run a read-modify-write under the tenant's critical section
    fn mutate<T>(
        &self,
        tenant: &TenantId,
        f: impl FnOnce(&mut Vec<ResultRecord>) -> Result<T>,
    ) -> Result<T> {
        let lock = self.tenant_lock(tenant)?;
        let _guard = lock
            .lock()
            .map_err(|_| StoreError::Lock(format!("result log of {}", tenant)))?;

        let mut records = self.load(tenant)?;
        let value = f(&mut records)?;
        write_json(&self.path(tenant), &records)?;
        Ok(value)
    }

    /// Record a new outcome under a fresh id and the current timestamp
    pub fn append(
        &self,
        tenant: &TenantId,
        outcome: &Outcome,
        meta: &RecordMeta,
    ) -> Result<ResultRecord> {
        let record = ResultRecord::from_outcome(RecordId::new(), outcome, meta, Utc::now());
        self.mutate(tenant, |records| {
            records.push(record.clone());
            Ok(())
        })?;
        debug!(tenant = %tenant, id = %record.id, status = record.status.as_str(), "Result appended");
        Ok(record)
    }

    /// Newest-first page of records
    pub fn list(&self, tenant: &TenantId, query: &ListQuery) -> Result<ResultPage> {
        let mut records = self.load(tenant)?;
        if let Some(status) = query.status {
            records.retain(|r| r.status == status);
        }

        // Later appends win ties on identical timestamps.
        records.reverse();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = records.len();
        let limit = query.effective_limit();
        let page: Vec<ResultRecord> = records.into_iter().skip(query.offset).take(limit).collect();
        let has_more = query.offset.saturating_add(page.len()) < total;

        Ok(ResultPage {
            records: page,
            total,
            has_more,
        })
    }

    /// Fetch one record
    pub fn get(&self, tenant: &TenantId, id: RecordId) -> Result<ResultRecord> {
        self.load(tenant)?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("result {}", id)))
    }

    /// Replace a record's content in place, keeping its id
    ///
    /// The replacement's `retried_from` is the timestamp of the content it
    /// replaces.
    pub fn update(
        &self,
        tenant: &TenantId,
        id: RecordId,
        outcome: &Outcome,
        meta: &RecordMeta,
    ) -> Result<ResultRecord> {
        let updated = self.mutate(tenant, |records| {
            let slot = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("result {}", id)))?;

            let mut replacement = ResultRecord::from_outcome(id, outcome, meta, Utc::now());
            replacement.retried_from = Some(slot.timestamp);
            *slot = replacement.clone();
            Ok(replacement)
        })?;
        debug!(tenant = %tenant, id = %id, status = updated.status.as_str(), "Result updated");
        Ok(updated)
    }

    /// Every failed record, in log order
    pub fn list_failed(&self, tenant: &TenantId) -> Result<Vec<ResultRecord>> {
        let mut records = self.load(tenant)?;
        records.retain(ResultRecord::is_failed);
        Ok(records)
    }
}
