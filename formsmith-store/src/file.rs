//! File-backed form store: one JSON document per form.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/forms/<form-id>.json    the form document
//! <root>/forms/<form-id>.lock    advisory lock for the save transaction
//! ```
//!
//! Writes are atomic (temp file + rename). The update transaction holds a
//! non-blocking exclusive lock across read, version check, reconcile, and
//! write; a second writer gets `LockBusy` instead of waiting.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use tokio::fs;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::roles::UserRole;
use crate::store::{reconcile, FormStore};
use crate::types::{FormAccess, FormDraft, FormId, FormRecord, FormSubmission, FormSummary};

/// A `FormStore` persisting each form as a JSON file.
pub struct FileFormStore {
    root: PathBuf,
    role: UserRole,
}

impl FileFormStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            role: UserRole::Owner,
        }
    }

    /// A store that resolves every caller to the given role.
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the forms directory
    pub fn forms_dir(&self) -> PathBuf {
        self.root.join("forms")
    }

    /// Path to a form's JSON file
    pub fn form_path(&self, id: &FormId) -> PathBuf {
        self.forms_dir().join(format!("{}.json", id))
    }

    /// Path to a form's lock file
    pub fn lock_path(&self, id: &FormId) -> PathBuf {
        self.forms_dir().join(format!("{}.lock", id))
    }

    /// Ensure the directory structure exists. Idempotent.
    pub async fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(self.forms_dir()).await?;
        Ok(())
    }

    async fn read_record(&self, id: &FormId) -> Result<FormRecord> {
        let path = self.form_path(id);
        if !path.exists() {
            return Err(StoreError::form_not_found(id));
        }
        let content = fs::read_to_string(&path).await?;
        let record: FormRecord = serde_json::from_str(&content)?;
        Ok(record)
    }

    async fn write_record(&self, record: &FormRecord) -> Result<()> {
        let content = serde_json::to_string_pretty(record)?;
        atomic_write(&self.form_path(&record.id), content.as_bytes()).await
    }

    /// Try to acquire the form's exclusive lock (non-blocking).
    async fn lock(&self, id: &FormId) -> Result<FormLock> {
        let lock_path = self.lock_path(id);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(FormLock { file }),
            Err(_) => Err(StoreError::LockBusy),
        }
    }

    fn check_can_edit(&self) -> Result<()> {
        if self.role.can_edit() {
            Ok(())
        } else {
            Err(StoreError::Forbidden { role: self.role })
        }
    }
}

/// RAII lock guard - releases on drop
struct FormLock {
    file: std::fs::File,
}

impl Drop for FormLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Atomic write via temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;

    // Rename (atomic on same filesystem)
    fs::rename(&temp_path, path).await?;

    Ok(())
}

#[async_trait]
impl FormStore for FileFormStore {
    async fn get_by_id(&self, id: &FormId) -> Result<FormAccess> {
        let record = self.read_record(id).await?;
        Ok(FormAccess {
            record,
            role: self.role,
        })
    }

    async fn create(&self, draft: FormDraft) -> Result<FormRecord> {
        self.check_can_edit()?;
        self.ensure_directories().await?;

        let now = Utc::now();
        let mut record = FormRecord {
            id: FormId::new(),
            name: draft.name,
            description: draft.description,
            organization_id: draft.organization_id,
            version: 1,
            created_at: now,
            updated_at: now,
            fields: draft.fields,
        };
        for (index, row) in record.fields.iter_mut().enumerate() {
            row.order = index as u32;
        }

        self.write_record(&record).await?;
        debug!(form = %record.id, "form created");
        Ok(record)
    }

    async fn update(&self, id: &FormId, submission: FormSubmission) -> Result<FormSummary> {
        self.check_can_edit()?;
        let _lock = self.lock(id).await?;

        let mut record = self.read_record(id).await?;
        if record.version != submission.expected_version {
            return Err(StoreError::PreconditionFailed {
                expected: submission.expected_version,
                found: record.version,
            });
        }

        reconcile(&mut record, submission);
        self.write_record(&record).await?;
        Ok(record.summary())
    }

    async fn list(&self) -> Result<Vec<FormSummary>> {
        let forms_dir = self.forms_dir();
        if !forms_dir.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let mut entries = fs::read_dir(&forms_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            let record: FormRecord = serde_json::from_str(&content)?;
            summaries.push(record.summary());
        }

        summaries.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(summaries)
    }

    async fn delete(&self, id: &FormId) -> Result<()> {
        self.check_can_edit()?;
        let path = self.form_path(id);
        if !path.exists() {
            return Err(StoreError::form_not_found(id));
        }
        fs::remove_file(&path).await?;

        let lock_path = self.lock_path(id);
        if lock_path.exists() {
            fs::remove_file(&lock_path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldRecord;
    use formsmith_fields::{FieldId, FieldRegistry, FieldTag};
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileFormStore) {
        let temp = TempDir::new().unwrap();
        let store = FileFormStore::new(temp.path());
        (temp, store)
    }

    fn draft() -> FormDraft {
        let registry = FieldRegistry::builtin();
        let heading = registry.create_default(&FieldTag::Heading, FieldId::from("h1"), "Survey");
        let email = registry.create_default(&FieldTag::Email, FieldId::from("e1"), "Email");
        FormDraft {
            name: "Survey".into(),
            description: "Annual".into(),
            organization_id: Some("org-1".into()),
            fields: vec![
                FieldRecord::from_definition(&heading, &registry, 0),
                FieldRecord::from_definition(&email, &registry, 1),
            ],
        }
    }

    #[tokio::test]
    async fn test_paths() {
        let (temp, store) = setup();
        let id = FormId::from("01ABC");
        assert_eq!(store.forms_dir(), temp.path().join("forms"));
        assert_eq!(
            store.form_path(&id),
            temp.path().join("forms").join("01ABC.json")
        );
    }

    #[tokio::test]
    async fn create_get_update_round_trip() {
        let (_temp, store) = setup();

        let record = store.create(draft()).await.unwrap();
        assert_eq!(record.version, 1);

        let access = store.get_by_id(&record.id).await.unwrap();
        assert_eq!(access.record, record);

        let before = access.record.updated_at;
        let summary = store
            .update(
                &record.id,
                FormSubmission {
                    expected_version: 1,
                    name: "Survey v2".into(),
                    description: "Annual".into(),
                    fields: record.fields.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(summary.version, 2);

        let reloaded = store.get_by_id(&record.id).await.unwrap().record;
        assert_eq!(reloaded.version, 2);
        assert_eq!(reloaded.name, "Survey v2");
        // The tenant set at creation is untouched by updates.
        assert_eq!(reloaded.organization_id.as_deref(), Some("org-1"));
        assert!(reloaded.updated_at >= before);
    }

    #[tokio::test]
    async fn stale_update_leaves_document_unchanged() {
        let (_temp, store) = setup();
        let record = store.create(draft()).await.unwrap();

        let err = store
            .update(
                &record.id,
                FormSubmission {
                    expected_version: 7,
                    name: "Stale".into(),
                    description: String::new(),
                    fields: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let reloaded = store.get_by_id(&record.id).await.unwrap().record;
        assert_eq!(reloaded, record);
    }

    #[tokio::test]
    async fn second_writer_gets_lock_busy() {
        let (_temp, store) = setup();
        let record = store.create(draft()).await.unwrap();

        let lock = store.lock(&record.id).await.unwrap();
        let err = store
            .update(
                &record.id,
                FormSubmission {
                    expected_version: 1,
                    name: "X".into(),
                    description: String::new(),
                    fields: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::LockBusy));

        // After release the update goes through.
        drop(lock);
        store
            .update(
                &record.id,
                FormSubmission {
                    expected_version: 1,
                    name: "X".into(),
                    description: String::new(),
                    fields: Vec::new(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_and_delete() {
        let (_temp, store) = setup();
        let a = store.create(draft()).await.unwrap();
        let b = store.create(draft()).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 2);

        store.delete(&a.id).await.unwrap();
        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, b.id);
    }

    #[tokio::test]
    async fn viewer_is_forbidden() {
        let temp = TempDir::new().unwrap();
        let store = FileFormStore::new(temp.path()).with_role(UserRole::Viewer);
        let err = store.create(draft()).await.unwrap_err();
        assert!(matches!(err, StoreError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn missing_form_is_not_found() {
        let (_temp, store) = setup();
        let err = store.get_by_id(&FormId::from("nope")).await.unwrap_err();
        assert!(matches!(err, StoreError::FormNotFound { .. }));
    }
}
