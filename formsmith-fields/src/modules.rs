//! Builtin field modules, one per known variant tag.
//!
//! Each module bundles the registry defaults, display description, settings
//! descriptor, and validation rules for its variant. `builtin_modules` is the
//! single list the registry is seeded from.

use std::sync::Arc;

use serde_json::Value;

use crate::registry::{
    DisplayDescription, FieldModule, SchemaType, SettingControl, SettingEntry, SettingsDescriptor,
};
use crate::types::{Alignment, BlankSegment, FieldDefinition, FieldId, FieldKind, FieldTag, SelectOption};
use crate::validate::{
    AnswerKeyRule, AppointmentRule, DateRangeRule, EmailRule, LengthRule, NumberRule, PhoneRule,
    SelectionCountRule, TimeRangeRule, ValueValidator,
};

/// All builtin modules, in palette order.
pub fn builtin_modules() -> Vec<Arc<dyn FieldModule>> {
    vec![
        Arc::new(HeadingModule),
        Arc::new(ParagraphModule),
        Arc::new(ShortTextModule),
        Arc::new(LongTextModule),
        Arc::new(FullNameModule),
        Arc::new(EmailModule),
        Arc::new(PhoneModule),
        Arc::new(AddressModule),
        Arc::new(NumberModule),
        Arc::new(DateModule),
        Arc::new(TimeModule),
        Arc::new(AppointmentModule),
        Arc::new(SignatureModule),
        Arc::new(DropdownModule),
        Arc::new(SingleChoiceModule),
        Arc::new(MultiChoiceModule),
        Arc::new(FillInTheBlankModule),
        Arc::new(ImageModule),
        Arc::new(SubmitButtonModule),
    ]
}

pub struct HeadingModule;

impl FieldModule for HeadingModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Heading
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::Heading {
                level: 2,
                alignment: Alignment::Left,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("heading", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "level",
                "Heading level",
                SettingControl::Select {
                    choices: vec!["1".into(), "2".into(), "3".into()],
                },
            ))
            .with(SettingEntry::new(
                "alignment",
                "Alignment",
                SettingControl::Select {
                    choices: vec!["left".into(), "center".into(), "right".into()],
                },
            ))
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Heading
    }
}

pub struct ParagraphModule;

impl FieldModule for ParagraphModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Paragraph
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(id, label, FieldKind::Paragraph { text: String::new() })
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("paragraph", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only().with(SettingEntry::new(
            "text",
            "Text",
            SettingControl::Text,
        ))
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Paragraph
    }
}

pub struct ShortTextModule;

impl FieldModule for ShortTextModule {
    fn tag(&self) -> FieldTag {
        FieldTag::ShortText
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::ShortText {
                placeholder: None,
                max_length: None,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("text-input", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "placeholder",
                "Placeholder",
                SettingControl::Text,
            ))
            .with(SettingEntry::new(
                "max_length",
                "Max length",
                SettingControl::Number,
            ))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        match &def.kind {
            FieldKind::ShortText {
                max_length: Some(max),
                ..
            } => vec![Arc::new(LengthRule::new(None, Some(*max)))],
            _ => Vec::new(),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Text
    }
}

pub struct LongTextModule;

impl FieldModule for LongTextModule {
    fn tag(&self) -> FieldTag {
        FieldTag::LongText
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::LongText {
                placeholder: None,
                max_length: None,
                rows: 4,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("textarea", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "placeholder",
                "Placeholder",
                SettingControl::Text,
            ))
            .with(SettingEntry::new(
                "max_length",
                "Max length",
                SettingControl::Number,
            ))
            .with(SettingEntry::new("rows", "Rows", SettingControl::Number))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        match &def.kind {
            FieldKind::LongText {
                max_length: Some(max),
                ..
            } => vec![Arc::new(LengthRule::new(None, Some(*max)))],
            _ => Vec::new(),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Textarea
    }
}

pub struct FullNameModule;

impl FieldModule for FullNameModule {
    fn tag(&self) -> FieldTag {
        FieldTag::FullName
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::FullName {
                first_placeholder: Some("First name".to_string()),
                last_placeholder: Some("Last name".to_string()),
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("full-name", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "first_placeholder",
                "First name placeholder",
                SettingControl::Text,
            ))
            .with(SettingEntry::new(
                "last_placeholder",
                "Last name placeholder",
                SettingControl::Text,
            ))
            .with_required()
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Name
    }
}

pub struct EmailModule;

impl FieldModule for EmailModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Email
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::Email {
                placeholder: None,
                confirm: false,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("email-input", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "placeholder",
                "Placeholder",
                SettingControl::Text,
            ))
            .with(SettingEntry::new(
                "confirm",
                "Ask for confirmation",
                SettingControl::Toggle,
            ))
            .with_required()
    }

    fn validators(&self, _def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        vec![Arc::new(EmailRule)]
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Email
    }
}

pub struct PhoneModule;

impl FieldModule for PhoneModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Phone
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::Phone {
                placeholder: None,
                pattern: None,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("phone-input", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "placeholder",
                "Placeholder",
                SettingControl::Text,
            ))
            .with(SettingEntry::new(
                "pattern",
                "Custom pattern",
                SettingControl::Text,
            ))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        let pattern = match &def.kind {
            FieldKind::Phone { pattern, .. } => pattern.as_deref(),
            _ => None,
        };
        vec![Arc::new(PhoneRule::new(pattern))]
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Phone
    }
}

pub struct AddressModule;

impl FieldModule for AddressModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Address
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(id, label, FieldKind::Address { lines: 2 })
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("address", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new("lines", "Lines", SettingControl::Number))
            .with_required()
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Address
    }
}

pub struct NumberModule;

impl FieldModule for NumberModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Number
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::Number {
                min: None,
                max: None,
                step: None,
                allow_decimals: false,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("number-input", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new("min", "Minimum", SettingControl::Number))
            .with(SettingEntry::new("max", "Maximum", SettingControl::Number))
            .with(SettingEntry::new("step", "Step", SettingControl::Number))
            .with(SettingEntry::new(
                "allow_decimals",
                "Allow decimals",
                SettingControl::Toggle,
            ))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        match def.kind {
            FieldKind::Number {
                min,
                max,
                step,
                allow_decimals,
            } => vec![Arc::new(NumberRule::new(min, max, step, allow_decimals))],
            _ => Vec::new(),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Number
    }
}

pub struct DateModule;

impl FieldModule for DateModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Date
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(id, label, FieldKind::Date { min: None, max: None })
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("date-input", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new("min", "Earliest date", SettingControl::Text))
            .with(SettingEntry::new("max", "Latest date", SettingControl::Text))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        match def.kind {
            FieldKind::Date { min, max } => vec![Arc::new(DateRangeRule::new(min, max))],
            _ => Vec::new(),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Date
    }
}

pub struct TimeModule;

impl FieldModule for TimeModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Time
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(id, label, FieldKind::Time { min: None, max: None })
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("time-input", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new("min", "Earliest time", SettingControl::Text))
            .with(SettingEntry::new("max", "Latest time", SettingControl::Text))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        match def.kind {
            FieldKind::Time { min, max } => vec![Arc::new(TimeRangeRule::new(min, max))],
            _ => Vec::new(),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Time
    }
}

pub struct AppointmentModule;

impl FieldModule for AppointmentModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Appointment
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::Appointment {
                duration_minutes: 30,
                slot_interval_minutes: 15,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("appointment", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "duration_minutes",
                "Duration (minutes)",
                SettingControl::Number,
            ))
            .with(SettingEntry::new(
                "slot_interval_minutes",
                "Slot interval (minutes)",
                SettingControl::Number,
            ))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        match def.kind {
            FieldKind::Appointment {
                slot_interval_minutes,
                ..
            } => vec![Arc::new(AppointmentRule::new(slot_interval_minutes))],
            _ => Vec::new(),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Appointment
    }
}

pub struct SignatureModule;

impl FieldModule for SignatureModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Signature
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::Signature {
                canvas_height: 160,
                stroke_color: "#000000".to_string(),
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("signature-pad", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "canvas_height",
                "Canvas height",
                SettingControl::Number,
            ))
            .with(SettingEntry::new(
                "stroke_color",
                "Stroke color",
                SettingControl::ColorPicker,
            ))
            .with_required()
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Signature
    }
}

pub struct DropdownModule;

impl FieldModule for DropdownModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Dropdown
    }

    /// Seeds two placeholder options so a freshly dropped dropdown is
    /// immediately interactable.
    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::Dropdown {
                options: vec![
                    SelectOption::new("option-1").with_label("Option 1"),
                    SelectOption::new("option-2").with_label("Option 2"),
                ],
                allow_multiple: false,
                min_selections: None,
                max_selections: None,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("dropdown", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "options",
                "Options",
                SettingControl::OptionsEditor,
            ))
            .with(SettingEntry::new(
                "allow_multiple",
                "Allow multiple selections",
                SettingControl::Toggle,
            ))
            .with(SettingEntry::new(
                "min_selections",
                "Minimum selections",
                SettingControl::Number,
            ))
            .with(SettingEntry::new(
                "max_selections",
                "Maximum selections",
                SettingControl::Number,
            ))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        match def.kind {
            FieldKind::Dropdown {
                allow_multiple,
                min_selections,
                max_selections,
                ..
            } if allow_multiple && (min_selections.is_some() || max_selections.is_some()) => {
                vec![Arc::new(SelectionCountRule::new(
                    min_selections,
                    max_selections,
                ))]
            }
            _ => Vec::new(),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Select
    }
}

pub struct SingleChoiceModule;

impl FieldModule for SingleChoiceModule {
    fn tag(&self) -> FieldTag {
        FieldTag::SingleChoice
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::SingleChoice {
                options: vec![
                    SelectOption::new("option-1").with_label("Option 1"),
                    SelectOption::new("option-2").with_label("Option 2"),
                ],
                other_option: false,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("radio-group", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "options",
                "Options",
                SettingControl::OptionsEditor,
            ))
            .with(SettingEntry::new(
                "other_option",
                "Offer an \"Other\" choice",
                SettingControl::Toggle,
            ))
            .with_required()
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Radio
    }
}

pub struct MultiChoiceModule;

impl FieldModule for MultiChoiceModule {
    fn tag(&self) -> FieldTag {
        FieldTag::MultiChoice
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::MultiChoice {
                options: vec![
                    SelectOption::new("option-1").with_label("Option 1"),
                    SelectOption::new("option-2").with_label("Option 2"),
                ],
                min_selections: None,
                max_selections: None,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("checkbox-group", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "options",
                "Options",
                SettingControl::OptionsEditor,
            ))
            .with(SettingEntry::new(
                "min_selections",
                "Minimum selections",
                SettingControl::Number,
            ))
            .with(SettingEntry::new(
                "max_selections",
                "Maximum selections",
                SettingControl::Number,
            ))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        match def.kind {
            FieldKind::MultiChoice {
                min_selections,
                max_selections,
                ..
            } if min_selections.is_some() || max_selections.is_some() => {
                vec![Arc::new(SelectionCountRule::new(
                    min_selections,
                    max_selections,
                ))]
            }
            _ => Vec::new(),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Checkbox
    }
}

pub struct FillInTheBlankModule;

impl FieldModule for FillInTheBlankModule {
    fn tag(&self) -> FieldTag {
        FieldTag::FillInTheBlank
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::FillInTheBlank {
                segments: vec![
                    BlankSegment::Text {
                        text: "Type your sentence and add a ".to_string(),
                    },
                    BlankSegment::Blank { answer: None },
                ],
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("fill-in-the-blank", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "segments",
                "Sentence",
                SettingControl::OptionsEditor,
            ))
            .with_required()
    }

    fn validators(&self, def: &FieldDefinition) -> Vec<Arc<dyn ValueValidator>> {
        match &def.kind {
            FieldKind::FillInTheBlank { segments }
                if segments.iter().any(|s| {
                    matches!(s, BlankSegment::Blank { answer: Some(_) })
                }) =>
            {
                vec![Arc::new(AnswerKeyRule::new(segments))]
            }
            _ => Vec::new(),
        }
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::FillBlank
    }
}

pub struct ImageModule;

impl FieldModule for ImageModule {
    fn tag(&self) -> FieldTag {
        FieldTag::Image
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::Image {
                asset_key: None,
                alt_text: None,
                width: None,
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("image", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only()
            .with(SettingEntry::new(
                "asset_key",
                "Image",
                SettingControl::Text,
            ))
            .with(SettingEntry::new(
                "alt_text",
                "Alt text",
                SettingControl::Text,
            ))
            .with(SettingEntry::new("width", "Width", SettingControl::Number))
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Image
    }
}

pub struct SubmitButtonModule;

impl FieldModule for SubmitButtonModule {
    fn tag(&self) -> FieldTag {
        FieldTag::SubmitButton
    }

    fn create_default(&self, id: FieldId, label: &str) -> FieldDefinition {
        FieldDefinition::new(
            id,
            label,
            FieldKind::SubmitButton {
                text: "Submit".to_string(),
            },
        )
    }

    fn display(
        &self,
        def: &FieldDefinition,
        binding: Option<&Value>,
        preview: bool,
    ) -> DisplayDescription {
        DisplayDescription::for_field("submit-button", def, binding, preview)
    }

    fn settings(&self) -> SettingsDescriptor {
        SettingsDescriptor::label_only().with(SettingEntry::new(
            "text",
            "Button text",
            SettingControl::Text,
        ))
    }

    fn schema_type(&self) -> SchemaType {
        SchemaType::Button
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_modules_cover_every_known_tag_once() {
        let modules = builtin_modules();
        assert_eq!(modules.len(), FieldTag::KNOWN.len());
        for (module, tag) in modules.iter().zip(FieldTag::KNOWN) {
            assert_eq!(module.tag(), tag);
        }
    }

    #[test]
    fn create_default_tag_matches_module_tag() {
        for module in builtin_modules() {
            let def = module.create_default(FieldId::new(), "Label");
            assert_eq!(def.tag(), module.tag());
            assert_eq!(def.label, "Label");
        }
    }

    #[test]
    fn every_module_settings_lead_with_label() {
        for module in builtin_modules() {
            let settings = module.settings();
            assert_eq!(
                settings.entries.first().map(|e| e.key.as_str()),
                Some("label"),
                "module {} settings must start with label",
                module.tag()
            );
        }
    }

    #[test]
    fn display_only_modules_have_no_required_toggle() {
        for module in builtin_modules() {
            let def = module.create_default(FieldId::new(), "X");
            let has_required = module
                .settings()
                .entries
                .iter()
                .any(|e| e.key == "validators.required");
            assert_eq!(
                has_required,
                def.is_input(),
                "required toggle mismatch for {}",
                module.tag()
            );
        }
    }

    #[tokio::test]
    async fn fill_in_the_blank_without_answers_has_no_answer_rule() {
        let module = FillInTheBlankModule;
        let def = module.create_default(FieldId::new(), "Quiz");
        assert!(module.validators(&def).is_empty());

        let keyed = FieldDefinition::new(
            FieldId::new(),
            "Quiz",
            FieldKind::FillInTheBlank {
                segments: vec![BlankSegment::Blank {
                    answer: Some("4".into()),
                }],
            },
        );
        let rules = module.validators(&keyed);
        assert_eq!(rules.len(), 1);
        assert!(rules[0].check(&json!(["4"])).await.is_none());
    }

    #[test]
    fn dropdown_selection_rule_only_when_multiple() {
        let module = DropdownModule;
        let single = module.create_default(FieldId::new(), "Pick");
        assert!(module.validators(&single).is_empty());

        let multi = FieldDefinition::new(
            FieldId::new(),
            "Pick",
            FieldKind::Dropdown {
                options: vec![SelectOption::new("a")],
                allow_multiple: true,
                min_selections: Some(1),
                max_selections: None,
            },
        );
        assert_eq!(module.validators(&multi).len(), 1);
    }

    #[test]
    fn display_component_names_are_distinct_for_inputs() {
        let mut seen = std::collections::HashSet::new();
        for module in builtin_modules() {
            let def = module.create_default(FieldId::new(), "X");
            let display = module.display(&def, None, false);
            assert!(
                seen.insert(display.component.clone()),
                "duplicate component {}",
                display.component
            );
        }
    }
}
