//! Persisted form records and the save wire shape.
//!
//! A form persists as one JSON document: form attributes plus an ordered list
//! of field records. A field record carries the field's definition image as an
//! opaque attribute bag, so older documents with since-removed variants still
//! load (they fall back at decode time instead of failing the whole form).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use ulid::Ulid;

use formsmith_fields::{FieldDefinition, FieldId, FieldRegistry, FieldTag};

/// Opaque, stable identifier for a form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(String);

impl FormId {
    /// Mint a new unique form id.
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Wrap an existing id string (e.g. from a persisted form).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FormId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FormId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FormId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One persisted field row: id, position, schema tag, and the definition
/// image as an attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub id: FieldId,
    /// Dense positional order within the form; index in the submitted list.
    pub order: u32,
    /// Persisted-schema type tag, denormalized for submission consumers.
    pub field_type: String,
    /// The field definition minus `id`, kept opaque so unknown variants
    /// survive a round trip.
    pub options: Value,
}

impl FieldRecord {
    /// Encode a definition into its persisted row.
    pub fn from_definition(def: &FieldDefinition, registry: &FieldRegistry, order: u32) -> Self {
        let field_type = registry.lookup(&def.tag()).schema_type().as_str().to_string();
        let mut options = serde_json::to_value(def).unwrap_or_else(|_| Value::Object(Default::default()));
        if let Value::Object(map) = &mut options {
            map.remove("id");
        }
        Self {
            id: def.id.clone(),
            order,
            field_type,
            options,
        }
    }

    /// Decode the persisted row back into a definition.
    ///
    /// A row whose variant no longer parses (removed type, corrupted
    /// attributes) falls back to the registry default for its tag rather than
    /// failing the whole form load.
    pub fn to_definition(&self, registry: &FieldRegistry) -> FieldDefinition {
        let mut image = self.options.clone();
        if let Value::Object(map) = &mut image {
            map.insert("id".to_string(), Value::String(self.id.to_string()));
        }
        match serde_json::from_value::<FieldDefinition>(image) {
            Ok(def) => def,
            Err(err) => {
                let tag = self
                    .options
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let label = self
                    .options
                    .get("label")
                    .and_then(Value::as_str)
                    .unwrap_or("Field");
                warn!(field = %self.id, tag, %err, "field row no longer parses, using registry default");
                registry.create_default(&FieldTag::from(tag), self.id.clone(), label)
            }
        }
    }
}

/// A complete persisted form document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    pub id: FormId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Owning tenant, supplied at creation and immutable afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Monotonic document version, incremented by exactly one per accepted
    /// update.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
}

impl FormRecord {
    /// The summary view returned from mutating operations.
    pub fn summary(&self) -> FormSummary {
        FormSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            version: self.version,
        }
    }

    /// Decode all field rows in order.
    pub fn definitions(&self, registry: &FieldRegistry) -> Vec<FieldDefinition> {
        let mut rows: Vec<&FieldRecord> = self.fields.iter().collect();
        rows.sort_by_key(|r| r.order);
        rows.into_iter().map(|r| r.to_definition(registry)).collect()
    }
}

/// The lightweight view returned from create/update responses and listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSummary {
    pub id: FormId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: u64,
}

/// A form record paired with the caller's resolved role.
#[derive(Debug, Clone, PartialEq)]
pub struct FormAccess {
    pub record: FormRecord,
    pub role: crate::roles::UserRole,
}

/// Payload for creating a new form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
}

/// Full-list save payload with the optimistic-concurrency precondition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    /// The version the client last saw; the store rejects the update when it
    /// no longer matches.
    pub expected_version: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<FieldRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsmith_fields::FieldKind;
    use serde_json::json;

    fn registry() -> FieldRegistry {
        FieldRegistry::builtin()
    }

    #[test]
    fn field_record_round_trip() {
        let registry = registry();
        let def = registry
            .create_default(&FieldTag::Email, FieldId::from("f1"), "Email")
            .required();

        let record = FieldRecord::from_definition(&def, &registry, 3);
        assert_eq!(record.id, FieldId::from("f1"));
        assert_eq!(record.order, 3);
        assert_eq!(record.field_type, "email");
        assert!(record.options.get("id").is_none());

        let back = record.to_definition(&registry);
        assert_eq!(back, def);
    }

    #[test]
    fn unparseable_row_falls_back_to_registry_default() {
        let registry = registry();
        let record = FieldRecord {
            id: FieldId::from("f9"),
            order: 0,
            field_type: "text".into(),
            options: json!({ "type": "holographic-input", "label": "Future" }),
        };

        let def = record.to_definition(&registry);
        assert_eq!(def.id, FieldId::from("f9"));
        assert_eq!(def.label, "Future");
        assert!(matches!(def.kind, FieldKind::ShortText { .. }));
    }

    #[test]
    fn definitions_sort_by_order() {
        let registry = registry();
        let a = registry.create_default(&FieldTag::Heading, FieldId::from("a"), "Title");
        let b = registry.create_default(&FieldTag::Email, FieldId::from("b"), "Email");

        let record = FormRecord {
            id: FormId::from("form1"),
            name: "Test".into(),
            description: String::new(),
            organization_id: None,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            fields: vec![
                FieldRecord::from_definition(&b, &registry, 1),
                FieldRecord::from_definition(&a, &registry, 0),
            ],
        };

        let defs = record.definitions(&registry);
        assert_eq!(defs[0].id, FieldId::from("a"));
        assert_eq!(defs[1].id, FieldId::from("b"));
    }

    #[test]
    fn form_record_json_round_trip() {
        let registry = registry();
        let def = registry.create_default(&FieldTag::Dropdown, FieldId::from("d1"), "Pick");
        let record = FormRecord {
            id: FormId::from("form1"),
            name: "Survey".into(),
            description: "Annual survey".into(),
            organization_id: Some("org-1".into()),
            version: 4,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            fields: vec![FieldRecord::from_definition(&def, &registry, 0)],
        };

        let json = serde_json::to_string_pretty(&record).unwrap();
        let parsed: FormRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
