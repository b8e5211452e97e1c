//! Validator composition for field definitions.
//!
//! A composed validator chains the generic required check with the variant's
//! module-specific rules under short-circuit sequencing: if the required check
//! reports a problem, module rules never run. Rules report problems as return
//! values, never as errors, so one malformed field cannot abort evaluation of
//! its siblings. The contract is uniformly asynchronous; synchronous rules
//! simply return immediately.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::registry::FieldRegistry;
use crate::types::{BlankSegment, FieldDefinition, FieldKind};

/// A single validation rule over a runtime field value.
#[async_trait]
pub trait ValueValidator: Send + Sync {
    /// `None` means the value passes; `Some` carries the inline message.
    async fn check(&self, value: &Value) -> Option<String>;
}

/// A value counts as empty when it is missing, `null`, or the empty string.
///
/// Numeric `0` and boolean `false` are present values. An empty selection
/// array counts as empty (a multi-select with zero selections is missing).
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// The generic required rule.
pub struct RequiredRule;

#[async_trait]
impl ValueValidator for RequiredRule {
    async fn check(&self, value: &Value) -> Option<String> {
        if is_empty_value(value) {
            Some("This field is required".to_string())
        } else {
            None
        }
    }
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("builtin email pattern"));

/// Builtin email syntax check.
pub struct EmailRule;

#[async_trait]
impl ValueValidator for EmailRule {
    async fn check(&self, value: &Value) -> Option<String> {
        let text = present_str(value)?;
        if EMAIL_RE.is_match(text) {
            None
        } else {
            Some("Enter a valid email address".to_string())
        }
    }
}

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 ().-]{5,}$").expect("builtin phone pattern"));

/// Phone pattern check: builtin pattern, or an author-supplied override.
pub struct PhoneRule {
    pattern: Option<Regex>,
}

impl PhoneRule {
    /// Compile the author override if present. A malformed override is
    /// dropped (fail open) with a warning, leaving the builtin pattern.
    pub fn new(author_pattern: Option<&str>) -> Self {
        Self {
            pattern: author_pattern.and_then(compile_author_pattern),
        }
    }
}

#[async_trait]
impl ValueValidator for PhoneRule {
    async fn check(&self, value: &Value) -> Option<String> {
        let text = present_str(value)?;
        let matched = match &self.pattern {
            Some(re) => re.is_match(text),
            None => PHONE_RE.is_match(text),
        };
        if matched {
            None
        } else {
            Some("Enter a valid phone number".to_string())
        }
    }
}

/// Author-configured regex from the generic validator config.
pub struct PatternRule {
    regex: Regex,
}

impl PatternRule {
    /// `None` when the pattern does not compile — the rule is dropped rather
    /// than rejecting every input.
    pub fn new(pattern: &str) -> Option<Self> {
        compile_author_pattern(pattern).map(|regex| Self { regex })
    }
}

#[async_trait]
impl ValueValidator for PatternRule {
    async fn check(&self, value: &Value) -> Option<String> {
        let text = present_str(value)?;
        if self.regex.is_match(text) {
            None
        } else {
            Some("Value does not match the expected format".to_string())
        }
    }
}

fn compile_author_pattern(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            warn!(pattern, %err, "malformed author pattern, ignoring");
            None
        }
    }
}

/// Text length bounds from the generic config and variant `max_length`.
pub struct LengthRule {
    min: Option<usize>,
    max: Option<usize>,
}

impl LengthRule {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

#[async_trait]
impl ValueValidator for LengthRule {
    async fn check(&self, value: &Value) -> Option<String> {
        let text = present_str(value)?;
        let len = text.chars().count();
        if let Some(min) = self.min {
            if len < min {
                return Some(format!("Enter at least {min} characters"));
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return Some(format!("Enter at most {max} characters"));
            }
        }
        None
    }
}

/// Numeric bounds, step, and decimal checks.
pub struct NumberRule {
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
    allow_decimals: bool,
}

impl NumberRule {
    pub fn new(min: Option<f64>, max: Option<f64>, step: Option<f64>, allow_decimals: bool) -> Self {
        Self {
            min,
            max,
            step,
            allow_decimals,
        }
    }
}

#[async_trait]
impl ValueValidator for NumberRule {
    async fn check(&self, value: &Value) -> Option<String> {
        if is_empty_value(value) {
            return None;
        }
        let number = match value {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(n) => n,
                Err(_) => return Some("Enter a number".to_string()),
            },
            _ => return Some("Enter a number".to_string()),
        };
        if !self.allow_decimals && number.fract() != 0.0 {
            return Some("Enter a whole number".to_string());
        }
        if let Some(min) = self.min {
            if number < min {
                return Some(format!("Value must be at least {min}"));
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return Some(format!("Value must be at most {max}"));
            }
        }
        if let Some(step) = self.step {
            if step > 0.0 {
                let base = self.min.unwrap_or(0.0);
                let offset = (number - base) / step;
                if (offset - offset.round()).abs() > 1e-9 {
                    return Some(format!("Value must be a multiple of {step}"));
                }
            }
        }
        None
    }
}

/// Date range check over ISO `YYYY-MM-DD` values.
pub struct DateRangeRule {
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
}

impl DateRangeRule {
    pub fn new(min: Option<NaiveDate>, max: Option<NaiveDate>) -> Self {
        Self { min, max }
    }
}

#[async_trait]
impl ValueValidator for DateRangeRule {
    async fn check(&self, value: &Value) -> Option<String> {
        let text = present_str(value)?;
        let date = match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => return Some("Enter a valid date".to_string()),
        };
        if let Some(min) = self.min {
            if date < min {
                return Some(format!("Date must be on or after {min}"));
            }
        }
        if let Some(max) = self.max {
            if date > max {
                return Some(format!("Date must be on or before {max}"));
            }
        }
        None
    }
}

/// Time range check over `HH:MM` (or `HH:MM:SS`) values.
pub struct TimeRangeRule {
    min: Option<NaiveTime>,
    max: Option<NaiveTime>,
}

impl TimeRangeRule {
    pub fn new(min: Option<NaiveTime>, max: Option<NaiveTime>) -> Self {
        Self { min, max }
    }
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
}

#[async_trait]
impl ValueValidator for TimeRangeRule {
    async fn check(&self, value: &Value) -> Option<String> {
        let text = present_str(value)?;
        let time = match parse_time(text) {
            Some(t) => t,
            None => return Some("Enter a valid time".to_string()),
        };
        if let Some(min) = self.min {
            if time < min {
                return Some(format!("Time must be at or after {}", min.format("%H:%M")));
            }
        }
        if let Some(max) = self.max {
            if time > max {
                return Some(format!("Time must be at or before {}", max.format("%H:%M")));
            }
        }
        None
    }
}

/// Appointment slot check: a parseable datetime aligned to the slot interval.
pub struct AppointmentRule {
    slot_interval_minutes: u32,
}

impl AppointmentRule {
    pub fn new(slot_interval_minutes: u32) -> Self {
        Self {
            slot_interval_minutes,
        }
    }
}

#[async_trait]
impl ValueValidator for AppointmentRule {
    async fn check(&self, value: &Value) -> Option<String> {
        let text = present_str(value)?;
        let parsed = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M"));
        let when = match parsed {
            Ok(dt) => dt,
            Err(_) => return Some("Enter a valid appointment time".to_string()),
        };
        if self.slot_interval_minutes > 0 && when.minute() % self.slot_interval_minutes != 0 {
            return Some(format!(
                "Appointments start every {} minutes",
                self.slot_interval_minutes
            ));
        }
        None
    }
}

/// Selection-count bounds for multi-value choice variants.
pub struct SelectionCountRule {
    min: Option<usize>,
    max: Option<usize>,
}

impl SelectionCountRule {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

#[async_trait]
impl ValueValidator for SelectionCountRule {
    async fn check(&self, value: &Value) -> Option<String> {
        if is_empty_value(value) {
            return None;
        }
        let count = match value {
            Value::Array(items) => items.len(),
            // A scalar selection counts as one.
            _ => 1,
        };
        if let Some(min) = self.min {
            if count < min {
                return Some(format!("Select at least {min} options"));
            }
        }
        if let Some(max) = self.max {
            if count > max {
                return Some(format!("Select at most {max} options"));
            }
        }
        None
    }
}

/// Fill-in-the-blank answer-key comparison.
///
/// The runtime value is an array with one entry per blank. Answers are
/// compared case-insensitively after trimming; blanks without an expected
/// answer accept anything.
pub struct AnswerKeyRule {
    expected: Vec<Option<String>>,
}

impl AnswerKeyRule {
    pub fn new(segments: &[BlankSegment]) -> Self {
        let expected = segments
            .iter()
            .filter_map(|segment| match segment {
                BlankSegment::Blank { answer } => Some(answer.clone()),
                BlankSegment::Text { .. } => None,
            })
            .collect();
        Self { expected }
    }
}

#[async_trait]
impl ValueValidator for AnswerKeyRule {
    async fn check(&self, value: &Value) -> Option<String> {
        if is_empty_value(value) {
            return None;
        }
        let answers = match value {
            Value::Array(items) => items,
            _ => return Some("Answer all blanks".to_string()),
        };
        if answers.len() != self.expected.len() {
            return Some("Answer all blanks".to_string());
        }
        for (given, expected) in answers.iter().zip(&self.expected) {
            let Some(expected) = expected else { continue };
            let given = given.as_str().unwrap_or("");
            if !given.trim().eq_ignore_ascii_case(expected.trim()) {
                return Some("One or more answers are incorrect".to_string());
            }
        }
        None
    }
}

/// Treat empty values as passing and return the str payload otherwise.
///
/// Non-string payloads pass as well: type-shape complaints belong to the
/// variant rules that understand them.
fn present_str(value: &Value) -> Option<&str> {
    if is_empty_value(value) {
        return None;
    }
    value.as_str()
}

/// The composed per-field validation function.
///
/// Required runs first; when it reports a problem the module rules are
/// skipped, so an unfilled field is reported as missing rather than
/// malformed. Otherwise module rules run in order and the first problem wins.
pub struct ComposedValidator {
    required: bool,
    rules: Vec<Arc<dyn ValueValidator>>,
}

impl ComposedValidator {
    /// A validator that accepts everything (display variants).
    pub fn noop() -> Self {
        Self {
            required: false,
            rules: Vec::new(),
        }
    }

    pub fn new(required: bool, rules: Vec<Arc<dyn ValueValidator>>) -> Self {
        Self { required, rules }
    }

    /// Evaluate the chain against a runtime value.
    pub async fn check(&self, value: &Value) -> Option<String> {
        if self.required {
            if let Some(message) = RequiredRule.check(value).await {
                return Some(message);
            }
        }
        for rule in &self.rules {
            if let Some(message) = rule.check(value).await {
                return Some(message);
            }
        }
        None
    }
}

/// Build the composed validator for a field definition.
///
/// Display variants get a no-op validator regardless of their config. For
/// input variants the chain is: required (if configured), generic length and
/// pattern rules, then the variant's module-specific rules from the registry.
pub fn build_validator(registry: &FieldRegistry, def: &FieldDefinition) -> ComposedValidator {
    if !def.kind.is_input() {
        return ComposedValidator::noop();
    }

    let mut rules: Vec<Arc<dyn ValueValidator>> = Vec::new();

    if def.validators.min_length.is_some() || def.validators.max_length.is_some() {
        rules.push(Arc::new(LengthRule::new(
            def.validators.min_length,
            def.validators.max_length,
        )));
    }
    if let Some(pattern) = def.validators.pattern.as_deref() {
        if let Some(rule) = PatternRule::new(pattern) {
            rules.push(Arc::new(rule));
        }
    }

    rules.extend(registry.lookup(&def.tag()).validators(def));

    ComposedValidator::new(def.validators.is_required(), rules)
}
