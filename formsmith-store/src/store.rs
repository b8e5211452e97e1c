//! The persistence collaborator contract and the save reconciliation.
//!
//! `FormStore` is the boundary the builder saves through. Both shipped
//! implementations (file-backed and in-memory) run the same reconciliation:
//! check the version precondition, three-way diff the submitted field rows
//! against the stored ones, bump the version by exactly one.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::error::Result;
use crate::types::{FormAccess, FormDraft, FormId, FormRecord, FormSubmission, FormSummary};

/// Async persistence boundary for form documents.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Fetch a form plus the caller's resolved role.
    async fn get_by_id(&self, id: &FormId) -> Result<FormAccess>;

    /// Create a new form with a fresh id at version 1.
    async fn create(&self, draft: FormDraft) -> Result<FormRecord>;

    /// Apply a full-list update under the optimistic-concurrency check.
    ///
    /// Fails with `PreconditionFailed` when the submitted expected version no
    /// longer matches the stored one; the stored record is left unchanged.
    async fn update(&self, id: &FormId, submission: FormSubmission) -> Result<FormSummary>;

    /// List all stored forms.
    async fn list(&self) -> Result<Vec<FormSummary>>;

    /// Delete a form document.
    async fn delete(&self, id: &FormId) -> Result<()>;
}

/// What an accepted update did, row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileStats {
    /// Rows present only in the submission.
    pub created: usize,
    /// Rows present on both sides, rewritten in place.
    pub updated: usize,
    /// Rows present only in storage.
    pub deleted: usize,
}

/// Reconcile a submission into a stored record.
///
/// The submitted list is authoritative for membership and order: rows only in
/// storage are deleted, rows on both sides are updated, rows only in the
/// submission are created. `order` is renumbered to the submitted position.
/// The version precondition must have been checked by the caller; this
/// increments the version by exactly one and refreshes `updated_at`.
pub fn reconcile(record: &mut FormRecord, submission: FormSubmission) -> ReconcileStats {
    let stored_ids: HashSet<_> = record.fields.iter().map(|row| row.id.clone()).collect();
    let submitted_ids: HashSet<_> = submission.fields.iter().map(|row| row.id.clone()).collect();

    let deleted = stored_ids.difference(&submitted_ids).count();
    let (mut created, mut updated) = (0, 0);
    for row in &submission.fields {
        if stored_ids.contains(&row.id) {
            updated += 1;
        } else {
            created += 1;
        }
    }
    let stats = ReconcileStats {
        created,
        updated,
        deleted,
    };

    record.name = submission.name;
    record.description = submission.description;
    record.fields = submission.fields;
    for (index, row) in record.fields.iter_mut().enumerate() {
        row.order = index as u32;
    }
    record.version += 1;
    record.updated_at = Utc::now();

    debug!(
        form = %record.id,
        version = record.version,
        created = stats.created,
        updated = stats.updated,
        deleted = stats.deleted,
        "form reconciled"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldRecord;
    use formsmith_fields::{FieldId, FieldRegistry, FieldTag};

    fn record_with_fields(ids: &[&str]) -> FormRecord {
        let registry = FieldRegistry::builtin();
        FormRecord {
            id: FormId::from("form1"),
            name: "Before".into(),
            description: String::new(),
            organization_id: None,
            version: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            fields: ids
                .iter()
                .enumerate()
                .map(|(i, id)| {
                    let def = registry.create_default(
                        &FieldTag::ShortText,
                        FieldId::from(*id),
                        "Text",
                    );
                    FieldRecord::from_definition(&def, &registry, i as u32)
                })
                .collect(),
        }
    }

    fn rows_for(ids: &[&str]) -> Vec<FieldRecord> {
        record_with_fields(ids).fields
    }

    #[test]
    fn three_way_diff_counts() {
        let mut record = record_with_fields(&["a", "b", "c"]);
        let submission = FormSubmission {
            expected_version: 3,
            name: "After".into(),
            description: "desc".into(),
            // "a" kept, "b" dropped, "c" kept, "d" new.
            fields: rows_for(&["c", "a", "d"]),
        };

        let stats = reconcile(&mut record, submission);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.updated, 2);
        assert_eq!(stats.deleted, 1);
    }

    #[test]
    fn version_increments_by_exactly_one() {
        let mut record = record_with_fields(&["a"]);
        let before = record.updated_at;
        let submission = FormSubmission {
            expected_version: 3,
            name: "After".into(),
            description: String::new(),
            fields: rows_for(&["a"]),
        };

        reconcile(&mut record, submission);
        assert_eq!(record.version, 4);
        assert!(record.updated_at >= before);
        assert_eq!(record.name, "After");
    }

    #[test]
    fn submitted_order_is_renumbered() {
        let mut record = record_with_fields(&["a", "b"]);
        let mut fields = rows_for(&["b", "a"]);
        // Stale client-side order values are ignored.
        fields[0].order = 7;
        fields[1].order = 7;
        let submission = FormSubmission {
            expected_version: 3,
            name: "X".into(),
            description: String::new(),
            fields,
        };

        reconcile(&mut record, submission);
        assert_eq!(record.fields[0].id, FieldId::from("b"));
        assert_eq!(record.fields[0].order, 0);
        assert_eq!(record.fields[1].id, FieldId::from("a"));
        assert_eq!(record.fields[1].order, 1);
    }

    #[test]
    fn empty_submission_deletes_everything() {
        let mut record = record_with_fields(&["a", "b"]);
        let submission = FormSubmission {
            expected_version: 3,
            name: "X".into(),
            description: String::new(),
            fields: Vec::new(),
        };

        let stats = reconcile(&mut record, submission);
        assert_eq!(stats.deleted, 2);
        assert_eq!(stats.created, 0);
        assert!(record.fields.is_empty());
    }
}
