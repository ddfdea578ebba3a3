//! Login form validation.
//!
//! Every validator is pure: it takes the raw field value and returns a fresh
//! [`ValidationResult`]. Expected user-input problems are values, never
//! errors.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Required phone prefix (Kenyan country code).
pub const PHONE_PREFIX: &str = "+254";
/// `+254` followed by nine digits.
pub const PHONE_MIN_LEN: usize = 13;
const NAME_MIN_LEN: usize = 2;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("valid name regex"));

/// Login form fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FirstName,
    LastName,
    Email,
    PhoneNumber,
}

impl Field {
    pub fn all() -> &'static [Field] {
        &[
            Field::FirstName,
            Field::LastName,
            Field::Email,
            Field::PhoneNumber,
        ]
    }

    /// Human label used in messages and prompts.
    pub fn label(self) -> &'static str {
        match self {
            Field::FirstName => "First name",
            Field::LastName => "Last name",
            Field::Email => "Email",
            Field::PhoneNumber => "Phone number",
        }
    }

    /// Serialized key (`firstName`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Email => "email",
            Field::PhoneNumber => "phoneNumber",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which rule a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Required,
    TooShort,
    InvalidCharacters,
    InvalidFormat,
    MissingCountryCode,
    WrongCountryCode,
    NonNumericBody,
}

/// A single failed rule with its user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub rule: Rule,
    pub message: String,
}

impl FieldError {
    fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of validating one field. Errors keep the order they were checked in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.errors.iter().map(|e| e.rule).collect()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

/// Raw login form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl FormInput {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Email => &self.email,
            Field::PhoneNumber => &self.phone_number,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::FirstName => self.first_name = value,
            Field::LastName => self.last_name = value,
            Field::Email => self.email = value,
            Field::PhoneNumber => self.phone_number = value,
        }
    }
}

/// Aggregated form validation. Only failing fields have an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValidation {
    pub errors: BTreeMap<Field, Vec<FieldError>>,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, field: Field) -> &[FieldError] {
        self.errors.get(&field).map_or(&[], Vec::as_slice)
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validates a person name. `label` is used in messages ("First name", ...).
pub fn validate_name(value: &str, label: &str) -> ValidationResult {
    if is_blank(value) {
        return ValidationResult::from_errors(vec![FieldError::new(
            Rule::Required,
            format!("{label} is required"),
        )]);
    }

    let mut errors = Vec::new();

    if value.trim().chars().count() < NAME_MIN_LEN {
        errors.push(FieldError::new(
            Rule::TooShort,
            format!("{label} must be at least {NAME_MIN_LEN} characters long"),
        ));
    }

    if !NAME_RE.is_match(value) {
        errors.push(FieldError::new(
            Rule::InvalidCharacters,
            format!("{label} can only contain letters and spaces"),
        ));
    }

    ValidationResult::from_errors(errors)
}

/// Validates an email address against the `local@domain.tld` shape.
pub fn validate_email(value: &str) -> ValidationResult {
    if is_blank(value) {
        return ValidationResult::from_errors(vec![FieldError::new(
            Rule::Required,
            "Email is required",
        )]);
    }

    if EMAIL_RE.is_match(value) {
        ValidationResult::default()
    } else {
        ValidationResult::from_errors(vec![FieldError::new(
            Rule::InvalidFormat,
            "Please enter a valid email address",
        )])
    }
}

/// Validates a phone number.
///
/// Once the value is non-blank, the checks are independent: a value can fail
/// the `+`, `+254`, length and digit checks all at once.
pub fn validate_phone_number(value: &str) -> ValidationResult {
    if is_blank(value) {
        return ValidationResult::from_errors(vec![FieldError::new(
            Rule::Required,
            "Phone number is required",
        )]);
    }

    let mut errors = Vec::new();

    if !value.starts_with('+') {
        errors.push(FieldError::new(
            Rule::MissingCountryCode,
            format!("Phone number must start with country code (e.g., {PHONE_PREFIX})"),
        ));
    }

    if !value.starts_with(PHONE_PREFIX) {
        errors.push(FieldError::new(
            Rule::WrongCountryCode,
            format!("Phone number must start with {PHONE_PREFIX}"),
        ));
    }

    if value.chars().count() < PHONE_MIN_LEN {
        errors.push(FieldError::new(
            Rule::TooShort,
            "Phone number is too short",
        ));
    }

    // The first character is assumed to be the `+`, whatever it actually is.
    let body: String = value.chars().skip(1).collect();
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new(
            Rule::NonNumericBody,
            "Phone number can only contain numbers after +",
        ));
    }

    ValidationResult::from_errors(errors)
}

/// Runs every field validator and keeps the failing fields.
pub fn validate_login_form(form: &FormInput) -> FormValidation {
    let mut errors = BTreeMap::new();

    for &field in Field::all() {
        let value = form.get(field);
        let result = match field {
            Field::FirstName | Field::LastName => validate_name(value, field.label()),
            Field::Email => validate_email(value),
            Field::PhoneNumber => validate_phone_number(value),
        };
        if !result.is_valid() {
            errors.insert(field, result.errors);
        }
    }

    FormValidation { errors }
}
