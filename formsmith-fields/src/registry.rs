//! Type registry mapping each field tag to its capability bundle.
//!
//! One `FieldModule` per variant tag, registered at process start and
//! immutable afterwards. Lookups never fail: an unregistered tag resolves to
//! the Default module (placeholder display, no validators, `text` schema
//! type). Creating a field for an unrecognized tag falls back to the
//! short-text variant so older persisted forms referencing since-removed
//! types keep loading.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::modules;
use crate::types::{FieldDefinition, FieldId, FieldTag};
use crate::validate::ValueValidator;

/// The persisted-schema type tag a variant maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaType {
    Heading,
    Paragraph,
    Text,
    Textarea,
    Name,
    Email,
    Phone,
    Address,
    Number,
    Date,
    Time,
    Appointment,
    Signature,
    Select,
    Radio,
    Checkbox,
    FillBlank,
    Image,
    Button,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::Appointment => "appointment",
            Self::Signature => "signature",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::FillBlank => "fill-blank",
            Self::Image => "image",
            Self::Button => "button",
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the render collaborator receives for one field instance.
///
/// A data description only — how it gets drawn is not the engine's business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayDescription {
    /// Renderer component key, e.g. `"text-input"` or `"heading"`.
    pub component: String,
    pub label: String,
    pub preview: bool,
    /// Variant-specific presentation attributes, plus `value` when a runtime
    /// binding is supplied.
    pub props: Value,
}

impl DisplayDescription {
    /// Standard description: variant attributes as props, binding as `value`.
    pub fn for_field(
        component: &str,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> Self {
        let mut props =
            serde_json::to_value(&def.kind).unwrap_or_else(|_| Value::Object(Default::default()));
        if let (Value::Object(map), Some(value)) = (&mut props, binding) {
            map.insert("value".to_string(), value.clone());
        }
        Self {
            component: component.to_string(),
            label: def.label.clone(),
            preview,
            props,
        }
    }
}

/// How a single setting is edited in the settings panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingControl {
    Text,
    Toggle,
    Number,
    Select { choices: Vec<String> },
    OptionsEditor,
    ColorPicker,
}

/// One editable property in the settings panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingEntry {
    /// Property key as accepted by `change_property`.
    pub key: String,
    pub label: String,
    pub control: SettingControl,
}

impl SettingEntry {
    pub fn new(key: &str, label: &str, control: SettingControl) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            control,
        }
    }
}

/// What the settings-editor collaborator receives for one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsDescriptor {
    pub entries: Vec<SettingEntry>,
}

impl SettingsDescriptor {
    /// Every variant at least lets the operator edit the label.
    pub fn label_only() -> Self {
        Self {
            entries: vec![SettingEntry::new("label", "Label", SettingControl::Text)],
        }
    }

    pub fn with(mut self, entry: SettingEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Append the generic `required` toggle (input variants only).
    pub fn with_required(self) -> Self {
        self.with(SettingEntry::new(
            "validators.required",
            "Required",
            SettingControl::Toggle,
        ))
    }
}

/// The capability bundle registered for one variant tag.
pub trait FieldModule: Send + Sync {
    /// The tag this module is registered under.
    fn tag(&self) -> FieldTag;

    /// A fully-populated definition with this variant's registry defaults.
    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition;

    /// Render capability: definition plus optional runtime binding to a
    /// display description.
    fn display(&self, def: &FieldDefinition, binding: Option<&Value>, preview: bool)
        -> DisplayDescription;

    /// Settings-editor capability.
    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
    }

    /// Module-specific validation rules for this definition.
    fn validators(&self, _def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        Vec::new()
    }

    /// The persisted-schema type tag.
    fn schema_type(&self) -> SchemaType;
}

/// Fallback module for tags with no registration.
///
/// Renders a "not implemented" placeholder, supplies no validators, and maps
/// to the `text` schema type.
pub struct DefaultModule;

impl FieldModule for DefaultModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Other("default".to_string())
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            crate::types::FieldKind::ShortText {
                placeholder: None,
                max_length: None,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        _binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription {
            component: "not-implemented".to_string(),
            label: def.label.clone(),
            preview,
            props: serde_json::json!({ "tag": def.tag().as_str() }),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Text
    }
}

/// Registry of field modules, keyed by tag.
pub struct FieldRegistry {
    modules: HashMap<FieldTag, Arc<dyn FieldModule>>,
    fallback: Arc<dyn FieldModule>,
}

impl FieldRegistry {
    /// An empty registry with only the Default fallback.
    pub fn empty() -> Self {
        Self {
            modules: HashMap::new(),
            fallback: Arc::new(DefaultModule),
        }
    }

    /// The registry with all builtin variant modules.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for module in modules::builtin_modules() {
            registry.register(module);
        }
        debug!(modules = registry.modules.len(), "field registry built");
        registry
    }

    /// Register a module under its tag. Idempotent at process start; the
    /// last registration for a tag wins, which is how tests override
    /// individual modules.
    pub fn register(&mut self, module: Arc<dyn FieldModule>) {
        self.modules.insert(module.tag(), module);
    }

    /// Look up the module for a tag. Never fails: unknown tags resolve to
    /// the Default module with a warning.
    pub fn lookup(&self, tag: &FieldTag) -> &dyn FieldModule {
        match self.modules.get(tag) {
            Some(module) => module.as_ref(),
            None => {
                warn!(tag = %tag, "no module registered, using default");
                self.fallback.as_ref()
            }
        }
    }

    /// Create a definition with the tag's registry defaults.
    ///
    /// An unrecognized tag falls back to the short-text variant rather than
    /// failing, preserving forward compatibility with older persisted forms.
    pub fn create_default(&self, tag: &FieldTag, id: FieldId, label: &str) -> FieldDefinition {
        match self.modules.get(tag) {
            Some(module) => module.create_default(id, label),
            None => {
                warn!(tag = %tag, "unknown tag at creation, falling back to short text");
                match self.modules.get(&FieldTag::ShortText) {
                    Some(module) => module.create_default(id, label),
                    None => self.fallback.create_default(id, label),
                }
            }
        }
    }

    /// Registered tags (test and palette introspection).
    pub fn tags(&self) -> impl Iterator<Item = &FieldTag> {
        self.modules.keys()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
