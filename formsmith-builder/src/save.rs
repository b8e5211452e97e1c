//! The save round trip.
//!
//! One in-flight save per session. The session's field list is encoded into
//! positional rows, the store applies the optimistic-concurrency check, and
//! the store's response version is written back. On a conflict the session
//! keeps its local edits and its stale version so the caller can reload and
//! merge; nothing is silently retried here.

use tracing::{debug, warn};

use formsmith_fields::FieldRegistry;
use formsmith_store::{FieldRecord, FormDraft, FormStore, FormSubmission, FormSummary};

use crate::error::SaveError;
use crate::session::BuilderSession;

/// Save the session's current state through the store.
///
/// A session without a form id is created (and adopts the minted id); one
/// with a form id is updated under its `expected_version` precondition. The
/// `is_saving` latch is held for the whole round trip and released on every
/// exit path.
pub async fn save(
    session: &mut BuilderSession,
    registry: &FieldRegistry,
    store: &dyn FormStore,
) -> std::result::Result<FormSummary, SaveError> {
    if session.is_saving() {
        return Err(SaveError::SaveInFlight);
    }
    if session.form_name().trim().is_empty() {
        return Err(SaveError::Validation {
            message: "form name must not be empty".to_string(),
        });
    }
    if !session.can_edit() {
        warn!(role = %session.user_role(), "save rejected for read-only role");
        return Err(SaveError::Authorization);
    }

    session.is_saving = true;
    let result = round_trip(session, registry, store).await;
    session.is_saving = false;
    result
}

async fn round_trip(
    session: &mut BuilderSession,
    registry: &FieldRegistry,
    store: &dyn FormStore,
) -> std::result::Result<FormSummary, SaveError> {
    let fields: Vec<FieldRecord> = session
        .fields()
        .iter()
        .enumerate()
        .map(|(index, def)| FieldRecord::from_definition(def, registry, index as u32))
        .collect();

    match session.form_id().cloned() {
        None => {
            // Tenancy is resolved by the hosting surface; drafts minted from a
            // bare session carry no organization.
            let draft = FormDraft {
                name: session.form_name().to_string(),
                description: session.form_description().to_string(),
                organization_id: None,
                fields,
            };
            let record = store.create(draft).await?;
            debug!(form = %record.id, version = record.version, "form created");
            session.set_form_id(record.id.clone());
            session.set_version(record.version);
            Ok(record.summary())
        }
        Some(form_id) => {
            let submission = FormSubmission {
                expected_version: session.version(),
                name: session.form_name().to_string(),
                description: session.form_description().to_string(),
                fields,
            };
            let summary = store.update(&form_id, submission).await?;
            debug!(form = %form_id, version = summary.version, "form saved");
            session.set_version(summary.version);
            Ok(summary)
        }
    }
}
