//! Builder session state machine.
//!
//! One `BuilderSession` per open form. All mutations are synchronous `&mut
//! self` methods, so every operation runs to completion before the next one
//! observes state. The async seams are elsewhere: validator evaluation
//! (fed back through tickets, last-write-wins) and the save round trip.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use formsmith_fields::{FieldDefinition, FieldId, FieldRegistry, FieldTag};
use formsmith_store::{FormId, FormRecord, UserRole};

use crate::drag::DragContext;
use crate::error::{Result, SessionError};

/// Per-field validation feedback with its generation counter.
#[derive(Debug, Clone, Default)]
struct ValidationState {
    seq: u64,
    message: Option<String>,
}

/// Handle for one in-flight validation evaluation.
///
/// Outcomes applied with a stale ticket (the field was re-validated or
/// removed in the meantime) are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTicket {
    field_id: FieldId,
    seq: u64,
}

/// Mutable editing state for one open form.
pub struct BuilderSession {
    form_id: Option<FormId>,
    form_name: String,
    form_description: String,
    /// Owned by the store's responses; never incremented locally.
    version: u64,
    pub(crate) fields: Vec<FieldDefinition>,
    selected_field_id: Option<FieldId>,
    pub(crate) is_preview_mode: bool,
    pub(crate) is_saving: bool,
    user_role: UserRole,
    pub(crate) drag: DragContext,
    validation: HashMap<FieldId, ValidationState>,
}

impl BuilderSession {
    /// Start a session for a brand-new form.
    ///
    /// Seeds the synthesized heading (mirroring the form name) and the submit
    /// button, both marked system-generated.
    pub fn new(registry: &FieldRegistry, name: impl Into<String>) -> Self {
        let form_name = name.into();
        let heading = registry
            .create_default(&FieldTag::Heading, FieldId::new(), &form_name)
            .system_generated();
        let submit = registry
            .create_default(
                &FieldTag::SubmitButton,
                FieldId::new(),
                FieldTag::SubmitButton.default_label(),
            )
            .system_generated();

        Self {
            form_id: None,
            form_name,
            form_description: String::new(),
            version: 0,
            fields: vec![heading, submit],
            selected_field_id: None,
            is_preview_mode: false,
            is_saving: false,
            user_role: UserRole::Owner,
            drag: DragContext::default(),
            validation: HashMap::new(),
        }
    }

    /// Resume a session from a persisted form.
    pub fn from_snapshot(registry: &FieldRegistry, record: &FormRecord, role: UserRole) -> Self {
        let fields = record.definitions(registry);
        debug!(form = %record.id, version = record.version, fields = fields.len(), "session opened");
        Self {
            form_id: Some(record.id.clone()),
            form_name: record.name.clone(),
            form_description: record.description.clone(),
            version: record.version,
            fields,
            selected_field_id: None,
            is_preview_mode: false,
            is_saving: false,
            user_role: role,
            drag: DragContext::default(),
            validation: HashMap::new(),
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.user_role = role;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn form_id(&self) -> Option<&FormId> {
        self.form_id.as_ref()
    }

    pub fn form_name(&self) -> &str {
        &self.form_name
    }

    pub fn form_description(&self) -> &str {
        &self.form_description
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, id: &FieldId) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn selected_field_id(&self) -> Option<&FieldId> {
        self.selected_field_id.as_ref()
    }

    pub fn selected_field(&self) -> Option<&FieldDefinition> {
        self.selected_field_id
            .as_ref()
            .and_then(|id| self.field(id))
    }

    pub fn is_preview_mode(&self) -> bool {
        self.is_preview_mode
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn user_role(&self) -> UserRole {
        self.user_role
    }

    /// Whether the caller's role permits editing; surfaces gate affordances
    /// with this, the store enforces it.
    pub fn can_edit(&self) -> bool {
        self.user_role.can_edit()
    }

    /// The last applied validation feedback for a field, if any.
    pub fn validation_message(&self, id: &FieldId) -> Option<&str> {
        self.validation
            .get(id)
            .and_then(|state| state.message.as_deref())
    }

    // =========================================================================
    // Structural operations
    // =========================================================================

    /// Insert a new field with the tag's registry defaults.
    ///
    /// `at_index` is clamped to the field count; `None` appends. Selection is
    /// left untouched.
    pub fn add_field(
        &mut self,
        registry: &FieldRegistry,
        tag: &FieldTag,
        label: Option<&str>,
        at_index: Option<usize>,
    ) -> Result<&FieldDefinition> {
        let label = label.unwrap_or_else(|| tag.default_label());
        let def = registry.create_default(tag, FieldId::new(), label);
        let index = at_index.unwrap_or(self.fields.len()).min(self.fields.len());
        self.insert_definition(index, def)
    }

    /// Insert an already-built definition at the given index.
    pub(crate) fn insert_definition(
        &mut self,
        index: usize,
        def: FieldDefinition,
    ) -> Result<&FieldDefinition> {
        if self.fields.iter().any(|f| f.id == def.id) {
            return Err(SessionError::DuplicateFieldId {
                id: def.id.to_string(),
            });
        }
        let index = index.min(self.fields.len());
        self.fields.insert(index, def);
        Ok(&self.fields[index])
    }

    /// Remove a field, returning it.
    ///
    /// Clears a matching selection in the same operation, drops the field's
    /// validation feedback, and cancels a drag of that field.
    pub fn remove_field(&mut self, id: &FieldId) -> Result<FieldDefinition> {
        let index = self
            .fields
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| SessionError::field_not_found(id))?;
        let removed = self.fields.remove(index);

        if self.selected_field_id.as_ref() == Some(id) {
            self.selected_field_id = None;
        }
        self.validation.remove(id);
        if self.drag.involves(id) {
            self.cancel_drag();
        }
        Ok(removed)
    }

    /// Change the selected field. `None` clears the selection. Idempotent.
    pub fn select_field(&mut self, id: Option<FieldId>) -> Result<()> {
        if let Some(id) = &id {
            if self.field(id).is_none() {
                return Err(SessionError::field_not_found(id));
            }
        }
        self.selected_field_id = id;
        Ok(())
    }

    /// Wholesale re-sequencing: the submitted list must be a permutation of
    /// the current field ids.
    pub fn reorder(&mut self, new_order: Vec<FieldId>) -> Result<()> {
        if new_order.len() != self.fields.len() {
            return Err(SessionError::invalid_reorder(format!(
                "expected {} ids, got {}",
                self.fields.len(),
                new_order.len()
            )));
        }
        let mut remaining: HashMap<FieldId, FieldDefinition> = self
            .fields
            .drain(..)
            .map(|f| (f.id.clone(), f))
            .collect();
        let mut reordered = Vec::with_capacity(new_order.len());
        for id in &new_order {
            match remaining.remove(id) {
                Some(def) => reordered.push(def),
                None => {
                    // Restore before failing so the session stays intact.
                    reordered.extend(remaining.into_values());
                    self.fields = reordered;
                    return Err(SessionError::invalid_reorder(format!(
                        "id {id} is not a current member (or repeats)"
                    )));
                }
            }
        }
        self.fields = reordered;
        Ok(())
    }

    // =========================================================================
    // Property edits
    // =========================================================================

    /// Shallow-merge `{key: value}` onto the field via its JSON image.
    ///
    /// Dotted keys address nested objects (`validators.required`). `id` and
    /// `type` are immutable; changing a field's type is delete + re-add.
    /// Editing the synthesized heading's label routes through
    /// `set_form_name`, keeping the form name the single source of truth.
    /// The updated field becomes the selection.
    pub fn change_property(&mut self, id: &FieldId, key: &str, value: Value) -> Result<()> {
        if self.is_preview_mode {
            return Err(SessionError::PreviewMode);
        }
        let root_key = key.split('.').next().unwrap_or(key);
        if root_key == "id" || root_key == "type" {
            return Err(SessionError::ImmutableProperty {
                key: key.to_string(),
            });
        }

        let index = self
            .fields
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| SessionError::field_not_found(id))?;

        let field = &self.fields[index];
        if key == "label" && field.is_system_generated && field.tag() == FieldTag::Heading {
            let name = value.as_str().ok_or_else(|| {
                SessionError::invalid_property(key, "expected a string")
            })?;
            let name = name.to_string();
            self.set_form_name(name);
            self.selected_field_id = Some(id.clone());
            return Ok(());
        }

        let mut image = serde_json::to_value(field)
            .map_err(|err| SessionError::invalid_property(key, err.to_string()))?;
        set_json_path(&mut image, key, value)
            .map_err(|message| SessionError::invalid_property(key, message))?;
        let updated: FieldDefinition = serde_json::from_value(image)
            .map_err(|err| SessionError::invalid_property(key, err.to_string()))?;

        self.fields[index] = updated;
        self.selected_field_id = Some(id.clone());
        Ok(())
    }

    /// Rename the form.
    ///
    /// The synthesized heading is an observer of the form name: its label is
    /// rewritten in the same operation, so the two can never drift.
    pub fn set_form_name(&mut self, name: impl Into<String>) {
        self.form_name = name.into();
        if let Some(heading) = self
            .fields
            .iter_mut()
            .find(|f| f.is_system_generated && f.tag() == FieldTag::Heading)
        {
            heading.label = self.form_name.clone();
        }
    }

    pub fn set_form_description(&mut self, description: impl Into<String>) {
        self.form_description = description.into();
    }

    // =========================================================================
    // Preview mode
    // =========================================================================

    /// Enter or leave preview. Entering cancels an in-progress drag;
    /// selection persists across the toggle.
    pub fn toggle_preview(&mut self, on: bool) {
        if on && !self.is_preview_mode {
            self.cancel_drag();
        }
        self.is_preview_mode = on;
    }

    // =========================================================================
    // Validation feedback (last-write-wins)
    // =========================================================================

    /// Start an evaluation for a field, invalidating any earlier ticket.
    pub fn begin_validation(&mut self, id: &FieldId) -> Result<ValidationTicket> {
        if self.field(id).is_none() {
            return Err(SessionError::field_not_found(id));
        }
        let state = self.validation.entry(id.clone()).or_default();
        state.seq += 1;
        Ok(ValidationTicket {
            field_id: id.clone(),
            seq: state.seq,
        })
    }

    /// Apply an evaluation outcome. Returns false (and changes nothing) when
    /// the ticket is stale or its field is gone.
    pub fn apply_validation(&mut self, ticket: &ValidationTicket, outcome: Option<String>) -> bool {
        match self.validation.get_mut(&ticket.field_id) {
            Some(state) if state.seq == ticket.seq => {
                state.message = outcome;
                true
            }
            _ => false,
        }
    }

    /// The store-owned version, applied from save/create responses.
    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub(crate) fn set_form_id(&mut self, id: FormId) {
        self.form_id = Some(id);
    }
}

/// Set a (possibly dotted) key path inside a JSON object image.
fn set_json_path(image: &mut Value, key: &str, value: Value) -> std::result::Result<(), String> {
    let mut current = image;
    let segments: Vec<&str> = key.split('.').collect();
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| "empty property key".to_string())?;

    for segment in parents {
        let map = current
            .as_object_mut()
            .ok_or_else(|| format!("'{segment}' is not an object"))?;
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }
    let map = current
        .as_object_mut()
        .ok_or_else(|| format!("'{last}' cannot be set on a non-object"))?;
    map.insert(last.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> FieldRegistry {
        FieldRegistry::builtin()
    }

    fn session() -> BuilderSession {
        BuilderSession::new(&registry(), "Customer Survey")
    }

    #[test]
    fn new_session_seeds_heading_and_submit() {
        let session = session();
        assert_eq!(session.fields().len(), 2);
        assert_eq!(session.fields()[0].tag(), FieldTag::Heading);
        assert_eq!(session.fields()[0].label, "Customer Survey");
        assert!(session.fields()[0].is_system_generated);
        assert_eq!(session.fields()[1].tag(), FieldTag::SubmitButton);
        assert_eq!(session.version(), 0);
        assert!(session.form_id().is_none());
    }

    #[test]
    fn add_field_clamps_index_and_keeps_selection() {
        let registry = registry();
        let mut session = session();
        session
            .select_field(Some(session.fields()[0].id.clone()))
            .unwrap();
        let selected_before = session.selected_field_id().cloned();

        let id = session
            .add_field(&registry, &FieldTag::Email, None, Some(99))
            .unwrap()
            .id
            .clone();
        // Clamped to the end.
        assert_eq!(session.fields().last().unwrap().id, id);
        assert_eq!(session.fields().last().unwrap().label, "Email");
        assert_eq!(session.selected_field_id().cloned(), selected_before);
    }

    #[test]
    fn add_field_at_index_inserts_between() {
        let registry = registry();
        let mut session = session();
        let id = session
            .add_field(&registry, &FieldTag::ShortText, Some("Name"), Some(1))
            .unwrap()
            .id
            .clone();
        assert_eq!(session.fields()[1].id, id);
        assert_eq!(session.fields().len(), 3);
    }

    #[test]
    fn remove_field_clears_matching_selection() {
        let registry = registry();
        let mut session = session();
        let id = session
            .add_field(&registry, &FieldTag::Email, None, None)
            .unwrap()
            .id
            .clone();
        session.select_field(Some(id.clone())).unwrap();

        let removed = session.remove_field(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(session.selected_field_id().is_none());
        assert!(session.field(&id).is_none());
    }

    #[test]
    fn remove_unknown_field_fails() {
        let mut session = session();
        let err = session.remove_field(&FieldId::from("nope")).unwrap_err();
        assert!(matches!(err, SessionError::FieldNotFound { .. }));
    }

    #[test]
    fn select_unknown_field_is_rejected_and_selection_unchanged() {
        let mut session = session();
        let id = session.fields()[0].id.clone();
        session.select_field(Some(id.clone())).unwrap();

        let err = session
            .select_field(Some(FieldId::from("nope")))
            .unwrap_err();
        assert!(matches!(err, SessionError::FieldNotFound { .. }));
        assert_eq!(session.selected_field_id(), Some(&id));
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let registry = registry();
        let mut session = session();
        session
            .add_field(&registry, &FieldTag::Email, None, None)
            .unwrap();
        let ids: Vec<FieldId> = session.fields().iter().map(|f| f.id.clone()).collect();

        // Reversed permutation is accepted.
        let mut reversed = ids.clone();
        reversed.reverse();
        session.reorder(reversed.clone()).unwrap();
        let now: Vec<FieldId> = session.fields().iter().map(|f| f.id.clone()).collect();
        assert_eq!(now, reversed);

        // Wrong length rejected.
        let err = session.reorder(vec![ids[0].clone()]).unwrap_err();
        assert!(matches!(err, SessionError::InvalidReorder { .. }));

        // Repeated id rejected.
        let err = session
            .reorder(vec![ids[0].clone(), ids[0].clone(), ids[0].clone()])
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidReorder { .. }));
        assert_eq!(session.fields().len(), 3);
    }

    #[test]
    fn change_property_merges_into_variant() {
        let registry = registry();
        let mut session = session();
        let id = session
            .add_field(&registry, &FieldTag::ShortText, None, None)
            .unwrap()
            .id
            .clone();

        session
            .change_property(&id, "placeholder", json!("Your answer"))
            .unwrap();
        let field = session.field(&id).unwrap();
        match &field.kind {
            formsmith_fields::FieldKind::ShortText { placeholder, .. } => {
                assert_eq!(placeholder.as_deref(), Some("Your answer"));
            }
            other => panic!("expected short text, got {other:?}"),
        }
        // The edited field becomes the selection.
        assert_eq!(session.selected_field_id(), Some(&id));
    }

    #[test]
    fn change_property_dotted_key_reaches_validators() {
        let registry = registry();
        let mut session = session();
        let id = session
            .add_field(&registry, &FieldTag::Email, None, None)
            .unwrap()
            .id
            .clone();

        session
            .change_property(&id, "validators.required", json!(true))
            .unwrap();
        assert!(session.field(&id).unwrap().validators.is_required());
    }

    #[test]
    fn change_property_rejects_id_and_type() {
        let registry = registry();
        let mut session = session();
        let id = session
            .add_field(&registry, &FieldTag::Email, None, None)
            .unwrap()
            .id
            .clone();

        for key in ["id", "type"] {
            let err = session
                .change_property(&id, key, json!("different"))
                .unwrap_err();
            assert!(matches!(err, SessionError::ImmutableProperty { .. }), "{key}");
        }
    }

    #[test]
    fn change_property_rejects_bad_shape() {
        let registry = registry();
        let mut session = session();
        let id = session
            .add_field(&registry, &FieldTag::Heading, None, None)
            .unwrap()
            .id
            .clone();

        let err = session
            .change_property(&id, "level", json!("not a number"))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidProperty { .. }));
        // Field unchanged.
        match session.field(&id).unwrap().kind {
            formsmith_fields::FieldKind::Heading { level, .. } => assert_eq!(level, 2),
            ref other => panic!("expected heading, got {other:?}"),
        }
    }

    #[test]
    fn form_name_mirror_both_directions() {
        let mut session = session();
        let heading_id = session.fields()[0].id.clone();

        // Renaming the form rewrites the heading label.
        session.set_form_name("Renamed Survey");
        assert_eq!(session.fields()[0].label, "Renamed Survey");
        assert_eq!(session.form_name(), "Renamed Survey");

        // Editing the heading label routes through the form name.
        session
            .change_property(&heading_id, "label", json!("Edited In Place"))
            .unwrap();
        assert_eq!(session.form_name(), "Edited In Place");
        assert_eq!(session.fields()[0].label, "Edited In Place");
    }

    #[test]
    fn preview_blocks_property_edits_but_not_selection() {
        let registry = registry();
        let mut session = session();
        let id = session
            .add_field(&registry, &FieldTag::Email, None, None)
            .unwrap()
            .id
            .clone();
        session.select_field(Some(id.clone())).unwrap();

        session.toggle_preview(true);
        let err = session
            .change_property(&id, "placeholder", json!("x"))
            .unwrap_err();
        assert!(matches!(err, SessionError::PreviewMode));
        // Selection persists and can still change.
        assert_eq!(session.selected_field_id(), Some(&id));
        session.select_field(None).unwrap();

        session.toggle_preview(false);
        session
            .change_property(&id, "placeholder", json!("x"))
            .unwrap();
    }

    #[test]
    fn stale_validation_ticket_is_ignored() {
        let registry = registry();
        let mut session = session();
        let id = session
            .add_field(&registry, &FieldTag::Email, None, None)
            .unwrap()
            .id
            .clone();

        let first = session.begin_validation(&id).unwrap();
        let second = session.begin_validation(&id).unwrap();

        // The newer evaluation lands first.
        assert!(session.apply_validation(&second, None));
        // The stale outcome is discarded.
        assert!(!session.apply_validation(&first, Some("Enter a valid email address".into())));
        assert_eq!(session.validation_message(&id), None);
    }

    #[test]
    fn removing_a_field_drops_its_validation_state() {
        let registry = registry();
        let mut session = session();
        let id = session
            .add_field(&registry, &FieldTag::Email, None, None)
            .unwrap()
            .id
            .clone();

        let ticket = session.begin_validation(&id).unwrap();
        session.remove_field(&id).unwrap();
        assert!(!session.apply_validation(&ticket, Some("too late".into())));
    }

    #[test]
    fn from_snapshot_restores_fields_and_version() {
        let registry = registry();
        let mut original = session();
        original
            .add_field(&registry, &FieldTag::Email, Some("Work email"), Some(1))
            .unwrap();

        let record = FormRecord {
            id: FormId::from("form1"),
            name: original.form_name().to_string(),
            description: String::new(),
            organization_id: None,
            version: 5,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            fields: original
                .fields()
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    formsmith_store::FieldRecord::from_definition(f, &registry, i as u32)
                })
                .collect(),
        };

        let restored = BuilderSession::from_snapshot(&registry, &record, UserRole::Editor);
        assert_eq!(restored.version(), 5);
        assert_eq!(restored.form_id(), Some(&FormId::from("form1")));
        assert_eq!(restored.fields().len(), 3);
        assert_eq!(restored.fields()[1].label, "Work email");
        assert_eq!(restored.user_role(), UserRole::Editor);
        assert!(restored.can_edit());
    }
}
