//! In-memory form store for tests and ephemeral sessions.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{Result, StoreError};
use crate::roles::UserRole;
use crate::store::{reconcile, FormStore};
use crate::types::{FormAccess, FormDraft, FormId, FormRecord, FormSubmission, FormSummary};

/// A `FormStore` backed by a map behind an async mutex.
///
/// The mutex makes every operation a transaction, mirroring the file store's
/// per-form lock.
pub struct MemoryFormStore {
    forms: Mutex<HashMap<FormId, FormRecord>>,
    role: UserRole,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::with_role(UserRole::Owner)
    }

    /// A store that resolves every caller to the given role.
    pub fn with_role(role: UserRole) -> Self {
        Self {
            forms: Mutex::new(HashMap::new()),
            role,
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

impl Default for MemoryFormStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FormStore for MemoryFormStore {
    async fn get_by_id(&self, id: &FormId) -> Result<FormAccess> {
        let forms = self.forms.lock().await;
        let record = forms
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::form_not_found(id))?;
        Ok(FormAccess {
            record,
            role: self.role,
        })
    }

    async fn create(&self, draft: FormDraft) -> Result<FormRecord> {
        self.check_can_edit()?;
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

        let mut forms = self.forms.lock().await;
        forms.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &FormId, submission: FormSubmission) -> Result<FormSummary> {
        self.check_can_edit()?;
        let mut forms = self.forms.lock().await;
        let record = forms
            .get_mut(id)
            .ok_or_else(|| StoreError::form_not_found(id))?;
        if record.version != submission.expected_version {
            return Err(StoreError::PreconditionFailed {
                expected: submission.expected_version,
                found: record.version,
            });
        }
        reconcile(record, submission);
        Ok(record.summary())
    }

    async fn list(&self) -> Result<Vec<FormSummary>> {
        let forms = self.forms.lock().await;
        let mut summaries: Vec<FormSummary> = forms.values().map(FormRecord::summary).collect();
        summaries.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(summaries)
    }

    async fn delete(&self, id: &FormId) -> Result<()> {
        self.check_can_edit()?;
        let mut forms = self.forms.lock().await;
        forms
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::form_not_found(id))
    }
}
