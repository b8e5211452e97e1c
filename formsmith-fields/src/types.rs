//! Core field definition types.
//!
//! A `FieldDefinition` is one typed entry in a form: shared attributes (id,
//! label, generic validator config) plus a `FieldKind` variant carrying the
//! type-specific attributes. All types serialize to/from JSON via serde; the
//! variant discriminant lives under a `type` key.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Opaque, stable identifier for a field within a form.
///
/// Never reused after deletion. Freshly minted ids are ULIDs; ids loaded from
/// a persisted form are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Mint a new unique field id.
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

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FieldId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FieldId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The discriminant tag for a field variant.
///
/// Closed set of known tags plus an `Other` arm for tags read from older
/// persisted forms whose variant has since been removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldTag {
    Heading,
    Paragraph,
    ShortText,
    LongText,
    FullName,
    Email,
    Phone,
    Address,
    Number,
    Date,
    Time,
    Appointment,
    Signature,
    Dropdown,
    SingleChoice,
    MultiChoice,
    FillInTheBlank,
    Image,
    SubmitButton,
    Other(String),
}

impl FieldTag {
    /// All known tags, in palette order.
    pub const KNOWN: [FieldTag; 19] = [
        FieldTag::Heading,
        FieldTag::Paragraph,
        FieldTag::ShortText,
        FieldTag::LongText,
        FieldTag::FullName,
        FieldTag::Email,
        FieldTag::Phone,
        FieldTag::Address,
        FieldTag::Number,
        FieldTag::Date,
        FieldTag::Time,
        FieldTag::Appointment,
        FieldTag::Signature,
        FieldTag::Dropdown,
        FieldTag::SingleChoice,
        FieldTag::MultiChoice,
        FieldTag::FillInTheBlank,
        FieldTag::Image,
        FieldTag::SubmitButton,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::ShortText => "short-text",
            Self::LongText => "long-text",
            Self::FullName => "full-name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Number => "number",
            Self::Date => "date",
            Self::Time => "time",
            Self::Appointment => "appointment",
            Self::Signature => "signature",
            Self::Dropdown => "dropdown",
            Self::SingleChoice => "single-choice",
            Self::MultiChoice => "multi-choice",
            Self::FillInTheBlank => "fill-in-the-blank",
            Self::Image => "image",
            Self::SubmitButton => "submit-button",
            Self::Other(tag) => tag,
        }
    }

    /// Human-readable default label for a freshly inserted field.
    pub fn default_label(&self) -> &str {
        match self {
            Self::Heading => "Heading",
            Self::Paragraph => "Paragraph",
            Self::ShortText => "Short Text",
            Self::LongText => "Long Text",
            Self::FullName => "Full Name",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Address => "Address",
            Self::Number => "Number",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Appointment => "Appointment",
            Self::Signature => "Signature",
            Self::Dropdown => "Dropdown",
            Self::SingleChoice => "Single Choice",
            Self::MultiChoice => "Multi Choice",
            Self::FillInTheBlank => "Fill in the Blank",
            Self::Image => "Image",
            Self::SubmitButton => "Submit",
            Self::Other(_) => "Field",
        }
    }
}

impl From<String> for FieldTag {
    fn from(s: String) -> Self {
        match s.as_str() {
            "heading" => Self::Heading,
            "paragraph" => Self::Paragraph,
            "short-text" => Self::ShortText,
            "long-text" => Self::LongText,
            "full-name" => Self::FullName,
            "email" => Self::Email,
            "phone" => Self::Phone,
            "address" => Self::Address,
            "number" => Self::Number,
            "date" => Self::Date,
            "time" => Self::Time,
            "appointment" => Self::Appointment,
            "signature" => Self::Signature,
            "dropdown" => Self::Dropdown,
            "single-choice" => Self::SingleChoice,
            "multi-choice" => Self::MultiChoice,
            "fill-in-the-blank" => Self::FillInTheBlank,
            "image" => Self::Image,
            "submit-button" => Self::SubmitButton,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for FieldTag {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<FieldTag> for String {
    fn from(tag: FieldTag) -> Self {
        tag.as_str().to_string()
    }
}

impl std::fmt::Display for FieldTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Horizontal alignment for display variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// A single option in a dropdown or choice field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The text shown to the filler: explicit label, or the value itself.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

/// One segment of a fill-in-the-blank field: literal text or a blank slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "segment", rename_all = "kebab-case")]
pub enum BlankSegment {
    Text { text: String },
    Blank {
        /// Expected answer, compared case-insensitively after trimming.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer: Option<String>,
    },
}

/// Generic validation rules attached to input-bearing variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValidatorsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Author-configured regex. Malformed patterns are treated as no
    /// constraint at composition time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl ValidatorsConfig {
    pub fn is_empty(&self) -> bool {
        self.required.is_none()
            && self.pattern.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

fn default_heading_level() -> u8 {
    2
}

fn default_long_text_rows() -> u8 {
    4
}

fn default_address_lines() -> u8 {
    2
}

fn default_appointment_duration() -> u32 {
    30
}

fn default_slot_interval() -> u32 {
    15
}

fn default_canvas_height() -> u32 {
    160
}

fn default_stroke_color() -> String {
    "#000000".to_string()
}

fn default_submit_text() -> String {
    "Submit".to_string()
}

/// The type-specific attributes of a field, discriminated by a `type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Heading {
        #[serde(default = "default_heading_level")]
        level: u8,
        #[serde(default)]
        alignment: Alignment,
    },
    Paragraph {
        #[serde(default)]
        text: String,
    },
    ShortText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    LongText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(default = "default_long_text_rows")]
        rows: u8,
    },
    FullName {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        first_placeholder: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_placeholder: Option<String>,
    },
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        /// Ask the filler to type the address twice.
        #[serde(default)]
        confirm: bool,
    },
    Phone {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        /// Author-supplied override of the builtin phone pattern.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    Address {
        #[serde(default = "default_address_lines")]
        lines: u8,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
        #[serde(default)]
        allow_decimals: bool,
    },
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<chrono::NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<chrono::NaiveDate>,
    },
    Time {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<chrono::NaiveTime>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<chrono::NaiveTime>,
    },
    Appointment {
        #[serde(default = "default_appointment_duration")]
        duration_minutes: u32,
        #[serde(default = "default_slot_interval")]
        slot_interval_minutes: u32,
    },
    Signature {
        #[serde(default = "default_canvas_height")]
        canvas_height: u32,
        #[serde(default = "default_stroke_color")]
        stroke_color: String,
    },
    Dropdown {
        #[serde(default)]
        options: Vec<SelectOption>,
        #[serde(default)]
        allow_multiple: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_selections: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_selections: Option<usize>,
    },
    SingleChoice {
        #[serde(default)]
        options: Vec<SelectOption>,
        /// Offer a free-text "Other" choice.
        #[serde(default)]
        other_option: bool,
    },
    MultiChoice {
        #[serde(default)]
        options: Vec<SelectOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_selections: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_selections: Option<usize>,
    },
    FillInTheBlank {
        #[serde(default)]
        segments: Vec<BlankSegment>,
    },
    Image {
        /// Key into the asset storage collaborator; resolved to a URL by the
        /// renderer, never by the engine.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        asset_key: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt_text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
    },
    SubmitButton {
        #[serde(default = "default_submit_text")]
        text: String,
    },
}

impl FieldKind {
    /// The discriminant tag for this variant.
    pub fn tag(&self) -> FieldTag {
        match self {
            Self::Heading { .. } => FieldTag::Heading,
            Self::Paragraph { .. } => FieldTag::Paragraph,
            Self::ShortText { .. } => FieldTag::ShortText,
            Self::LongText { .. } => FieldTag::LongText,
            Self::FullName { .. } => FieldTag::FullName,
            Self::Email { .. } => FieldTag::Email,
            Self::Phone { .. } => FieldTag::Phone,
            Self::Address { .. } => FieldTag::Address,
            Self::Number { .. } => FieldTag::Number,
            Self::Date { .. } => FieldTag::Date,
            Self::Time { .. } => FieldTag::Time,
            Self::Appointment { .. } => FieldTag::Appointment,
            Self::Signature { .. } => FieldTag::Signature,
            Self::Dropdown { .. } => FieldTag::Dropdown,
            Self::SingleChoice { .. } => FieldTag::SingleChoice,
            Self::MultiChoice { .. } => FieldTag::MultiChoice,
            Self::FillInTheBlank { .. } => FieldTag::FillInTheBlank,
            Self::Image { .. } => FieldTag::Image,
            Self::SubmitButton { .. } => FieldTag::SubmitButton,
        }
    }

    /// Display-only variants carry no filler input and take no validators.
    pub fn is_input(&self) -> bool {
        !matches!(
            self,
            Self::Heading { .. }
                | Self::Paragraph { .. }
                | Self::Image { .. }
                | Self::SubmitButton { .. }
        )
    }
}

/// A complete field definition: shared attributes plus the typed variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: FieldId,
    pub label: String,
    /// Synthesized by the engine (e.g. the form-name heading), not placed by
    /// the operator.
    #[serde(default)]
    pub is_system_generated: bool,
    #[serde(default, skip_serializing_if = "ValidatorsConfig::is_empty")]
    pub validators: ValidatorsConfig,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDefinition {
    /// Create a definition with the given id, label, and variant.
    pub fn new(id: FieldId, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id,
            label: label.into(),
            is_system_generated: false,
            validators: ValidatorsConfig::default(),
            kind,
        }
    }

    pub fn tag(&self) -> FieldTag {
        self.kind.tag()
    }

    pub fn is_input(&self) -> bool {
        self.kind.is_input()
    }

    pub fn system_generated(mut self) -> Self {
        self.is_system_generated = true;
        self
    }

    pub fn with_validators(mut self, validators: ValidatorsConfig) -> Self {
        self.validators = validators;
        self
    }

    pub fn required(mut self) -> Self {
        self.validators.required = Some(true);
        self
    }
}
