//! Login form flow: validate, then authenticate.

use std::collections::BTreeMap;

use crate::session::{SessionRecord, SessionStore};
use crate::storage::KeyValueStore;
use crate::validation::{self, Field, FieldError, FormInput};

/// Result of submitting the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in; the caller should move to the authenticated area.
    Authenticated(SessionRecord),
    /// Field validation failed; the session store was not touched.
    InvalidFields(BTreeMap<Field, Vec<FieldError>>),
    /// The session store rejected the login. Shown as a form-level error.
    Rejected(String),
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated(_))
    }
}

/// Validates `form` and, only if it is valid, logs in through `session`.
pub fn submit<S: KeyValueStore>(form: &FormInput, session: &mut SessionStore<S>) -> LoginOutcome {
    let validation = validation::validate_login_form(form);
    if !validation.is_valid() {
        tracing::debug!(
            fields = ?validation.errors.keys().collect::<Vec<_>>(),
            "login form has validation errors"
        );
        return LoginOutcome::InvalidFields(validation.errors);
    }

    match session.login(form) {
        Ok(record) => LoginOutcome::Authenticated(record),
        Err(err) => LoginOutcome::Rejected(err.to_string()),
    }
}

/// Editable login form state: current input plus the errors to display.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    input: FormInput,
    field_errors: BTreeMap<Field, Vec<FieldError>>,
    general_errors: Vec<String>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &FormInput {
        &self.input
    }

    /// Updates one field. Errors shown for that field are cleared.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.input.set(field, value);
        self.field_errors.remove(&field);
    }

    pub fn field_errors(&self, field: Field) -> &[FieldError] {
        self.field_errors.get(&field).map_or(&[], Vec::as_slice)
    }

    pub fn general_errors(&self) -> &[String] {
        &self.general_errors
    }

    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty() || !self.general_errors.is_empty()
    }

    /// Submits the form and records the resulting errors for display.
    pub fn submit<S: KeyValueStore>(&mut self, session: &mut SessionStore<S>) -> LoginOutcome {
        let outcome = submit(&self.input, session);
        match &outcome {
            LoginOutcome::Authenticated(_) => {
                self.field_errors.clear();
                self.general_errors.clear();
            }
            LoginOutcome::InvalidFields(errors) => {
                self.field_errors.clone_from(errors);
                self.general_errors.clear();
            }
            LoginOutcome::Rejected(message) => {
                self.field_errors.clear();
                self.general_errors = vec![message.clone()];
            }
        }
        outcome
    }
}
