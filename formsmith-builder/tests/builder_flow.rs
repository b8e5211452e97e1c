//! End-to-end builder flow: edit a form through the session, persist it
//! through the file store, and reopen it in a fresh session.

use serde_json::json;
use tempfile::TempDir;

use formsmith_builder::{save, BuilderSession, ItemBounds, SaveError};
use formsmith_fields::{build_validator, FieldRegistry, FieldTag};
use formsmith_store::{FileFormStore, FormStore, MemoryFormStore, UserRole};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

fn rows(n: usize) -> Vec<ItemBounds> {
    (0..n).map(|i| ItemBounds::new(i as f64 * 48.0, 48.0)).collect()
}

#[tokio::test]
async fn edit_save_reload_round_trip_through_the_file_store() {
    init_tracing();
    let registry = FieldRegistry::builtin();
    let temp = TempDir::new().unwrap();
    let store = FileFormStore::new(temp.path());

    // Build the form the way the surface would: palette drags plus edits.
    let mut session = BuilderSession::new(&registry, "Event Registration");

    session.begin_palette_drag(&FieldTag::FullName).unwrap();
    session.drag_over(49.0, &rows(2)).unwrap();
    let name_id = session.complete_drag(&registry).unwrap().unwrap();

    session.begin_palette_drag(&FieldTag::Email).unwrap();
    session.drag_over(97.0, &rows(3)).unwrap();
    let email_id = session.complete_drag(&registry).unwrap().unwrap();

    session
        .change_property(&email_id, "validators.required", json!(true))
        .unwrap();
    session
        .change_property(&email_id, "placeholder", json!("you@example.com"))
        .unwrap();
    session.set_form_description("Register for the annual event");

    // Drag the email field above the name field.
    session.begin_reorder_drag(&email_id).unwrap();
    session.drag_over(49.0, &rows(4)).unwrap();
    session.complete_drag(&registry).unwrap();
    let order: Vec<_> = session.fields().iter().map(|f| f.id.clone()).collect();
    assert_eq!(order[1], email_id);
    assert_eq!(order[2], name_id);

    let summary = save(&mut session, &registry, &store).await.unwrap();
    assert_eq!(summary.version, 1);

    // Reopen in a fresh session and confirm everything survived.
    let access = store.get_by_id(&summary.id).await.unwrap();
    let reopened = BuilderSession::from_snapshot(&registry, &access.record, access.role);
    assert_eq!(reopened.form_name(), "Event Registration");
    assert_eq!(reopened.form_description(), "Register for the annual event");
    assert_eq!(reopened.version(), 1);
    assert_eq!(reopened.fields().len(), 4);
    assert_eq!(reopened.fields()[1].id, email_id);
    assert!(reopened.fields()[1].validators.is_required());
    assert!(reopened.fields()[0].is_system_generated);

    // A follow-up save from the reopened session bumps the version by one.
    let mut reopened = reopened;
    reopened.remove_field(&name_id).unwrap();
    let summary = save(&mut reopened, &registry, &store).await.unwrap();
    assert_eq!(summary.version, 2);
    let record = store.get_by_id(&summary.id).await.unwrap().record;
    assert_eq!(record.fields.len(), 3);
}

#[tokio::test]
async fn validation_feedback_flows_through_tickets() {
    init_tracing();
    let registry = FieldRegistry::builtin();
    let mut session = BuilderSession::new(&registry, "Contact");
    let email_id = session
        .add_field(&registry, &FieldTag::Email, None, Some(1))
        .unwrap()
        .id
        .clone();
    session
        .change_property(&email_id, "validators.required", json!(true))
        .unwrap();

    let field = session.field(&email_id).unwrap().clone();
    let validator = build_validator(&registry, &field);

    // Preview fill: a malformed address, then a fix.
    let ticket = session.begin_validation(&email_id).unwrap();
    let outcome = validator.check(&json!("not-an-address")).await;
    assert!(session.apply_validation(&ticket, outcome));
    assert!(session.validation_message(&email_id).is_some());

    let ticket = session.begin_validation(&email_id).unwrap();
    let outcome = validator.check(&json!("ada@example.com")).await;
    assert!(session.apply_validation(&ticket, outcome));
    assert_eq!(session.validation_message(&email_id), None);
}

#[tokio::test]
async fn conflict_then_reload_then_retry() {
    init_tracing();
    let registry = FieldRegistry::builtin();
    let store = MemoryFormStore::new();

    let mut session = BuilderSession::new(&registry, "Shared Form");
    save(&mut session, &registry, &store).await.unwrap();
    let form_id = session.form_id().unwrap().clone();

    // A second writer saves first.
    let theirs = store.get_by_id(&form_id).await.unwrap();
    let mut other = BuilderSession::from_snapshot(&registry, &theirs.record, UserRole::Editor);
    other.set_form_name("Shared Form (renamed)");
    save(&mut other, &registry, &store).await.unwrap();

    session
        .add_field(&registry, &FieldTag::LongText, None, Some(1))
        .unwrap();
    let err = save(&mut session, &registry, &store).await.unwrap_err();
    assert!(matches!(err, SaveError::Conflict { .. }));

    // Reload, replay the edit on the fresh snapshot, and retry.
    let fresh = store.get_by_id(&form_id).await.unwrap();
    let mut session = BuilderSession::from_snapshot(&registry, &fresh.record, fresh.role);
    assert_eq!(session.form_name(), "Shared Form (renamed)");
    session
        .add_field(&registry, &FieldTag::LongText, None, Some(1))
        .unwrap();
    let summary = save(&mut session, &registry, &store).await.unwrap();
    assert_eq!(summary.version, 3);
}
