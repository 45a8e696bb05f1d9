//! Worklist enumeration

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use docket_domain::RecordId;
use std::path::{Path, PathBuf};

/// One document scheduled for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// File name inside the tenant folder
    pub filename: String,

    /// Full path of the document
    pub path: PathBuf,

    /// Record replaced by this attempt, for retries
    pub retry_of: Option<RecordId>,
}

impl WorkItem {
    /// Item for a document in a folder
    pub fn new(folder: &Path, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            path: folder.join(&filename),
            filename,
            retry_of: None,
        }
    }

    /// Item re-running the document of an existing record
    pub fn retry(folder: &Path, filename: impl Into<String>, id: RecordId) -> Self {
        Self {
            retry_of: Some(id),
            ..Self::new(folder, filename)
        }
    }
}

/// Documents directly inside `folder` with an accepted extension, sorted by name
///
/// `filter` narrows the list to names containing it, ignoring case.
pub async fn scan_folder(
    folder: &Path,
    config: &PipelineConfig,
    filter: Option<&str>,
) -> Result<Vec<WorkItem>, PipelineError> {
    let filter = filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !config.accepts(&name) {
            continue;
        }
        if let Some(filter) = &filter {
            if !name.to_lowercase().contains(filter.as_str()) {
                continue;
            }
        }
        names.push(name);
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| WorkItem::new(folder, name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn folder() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "A.PDF", "notes.txt", "invoice-march.pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_scan_filters_and_sorts() {
        let dir = folder();
        let items = scan_folder(dir.path(), &PipelineConfig::default(), None)
            .await
            .unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf", "invoice-march.pdf"]);
        assert_eq!(items[0].path, dir.path().join("A.PDF"));
        assert!(items.iter().all(|i| i.retry_of.is_none()));
    }

    #[tokio::test]
    async fn test_scan_name_filter() {
        let dir = folder();
        let items = scan_folder(dir.path(), &PipelineConfig::default(), Some("MARCH"))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].filename, "invoice-march.pdf");
    }

    #[tokio::test]
    async fn test_scan_missing_folder_errors() {
        let dir = TempDir::new().unwrap();
        let result = scan_folder(&dir.path().join("gone"), &PipelineConfig::default(), None).await;
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }
}
