//! Field definition model and type registry
//!
//! `formsmith-fields` is a standalone crate that owns the polymorphic field
//! model: typed field definitions, the per-variant capability registry, and
//! validator composition. It knows nothing about builder sessions or
//! persistence — consumers wire those around it.
//!
//! # Architecture
//!
//! - **Closed variant set, open tags**: `FieldKind` is the closed set of known
//!   variants; tags from older persisted forms parse as `FieldTag::Other` and
//!   fall back to safe defaults at the registry
//! - **Registry over tag dispatch**: per-variant behavior (defaults, display,
//!   settings, validation) lives in one `FieldModule` per tag, looked up at
//!   runtime, never in match statements scattered across consumers
//! - **Rules report, never fail**: validation rules return an optional inline
//!   message so one malformed field cannot abort its siblings

pub mod modules;
pub mod registry;
pub mod types;
pub mod validate;

pub use registry::{
    DisplayDescription, FieldModule, FieldRegistry, SchemaType, SettingControl, SettingEntry,
    SettingsDescriptor,
};
pub use types::{
    Alignment, BlankSegment, FieldDefinition, FieldId, FieldKind, FieldTag, SelectOption,
    ValidatorsConfig,
};
pub use validate::{build_validator, is_empty_value, ComposedValidator, ValueValidator};
