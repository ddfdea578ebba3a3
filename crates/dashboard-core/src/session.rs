//! Authentication session state.
//!
//! [`SessionStore`] is the single owner of "who is logged in". It keeps the
//! in-memory state machine and mirrors it into a [`KeyValueStore`] under two
//! keys: [`AUTH_FLAG_KEY`] (`"true"`) and [`USER_KEY`] (JSON record). The two
//! keys are always written and removed together.
//!
//! ```text
//! Loading --initialize--> Anonymous | Authenticated
//! Anonymous --login--> Authenticated
//! Authenticated --logout--> Anonymous
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{KeyValueStore, StoreError};
use crate::validation::{FormInput, PHONE_MIN_LEN, PHONE_PREFIX};

pub const AUTH_FLAG_KEY: &str = "isAuthenticated";
pub const USER_KEY: &str = "user";
const AUTH_FLAG_VALUE: &str = "true";

static STRICT_PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+254\d{9}$").expect("valid phone regex"));

/// Identity of the authenticated user, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl SessionRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<&FormInput> for SessionRecord {
    fn from(form: &FormInput) -> Self {
        Self {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
            phone_number: form.phone_number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Persisted state not read yet.
    #[default]
    Loading,
    Anonymous,
    Authenticated(SessionRecord),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter a valid phone number starting with +254")]
    InvalidPhoneNumber,
    #[error("Already logged in as {0}. Log out first.")]
    AlreadyAuthenticated(String),
    #[error("Session has not been loaded yet")]
    NotInitialized,
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("Could not save the session")]
    Storage(#[from] StoreError),
}

/// Strict mock-authentication check: `+254` followed by exactly nine digits.
pub fn is_valid_login_phone(phone: &str) -> bool {
    phone.starts_with(PHONE_PREFIX)
        && phone.len() == PHONE_MIN_LEN
        && STRICT_PHONE_RE.is_match(phone)
}

/// Session state container over a key-value store.
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
    state: SessionState,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Creates a store in the `Loading` state. Call [`Self::initialize`] next.
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: SessionState::Loading,
        }
    }

    /// Creates and initializes in one step.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read or healed.
    pub fn load(store: S) -> Result<Self, StoreError> {
        let mut session = Self::new(store);
        session.initialize()?;
        Ok(session)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&SessionRecord> {
        match &self.state {
            SessionState::Authenticated(record) => Some(record),
            _ => None,
        }
    }

    /// Gate for authenticated-only features.
    ///
    /// # Errors
    /// Returns [`AuthError::NotAuthenticated`] unless someone is logged in.
    pub fn require_user(&self) -> Result<&SessionRecord, AuthError> {
        match &self.state {
            SessionState::Authenticated(record) => Ok(record),
            SessionState::Loading => Err(AuthError::NotInitialized),
            SessionState::Anonymous => Err(AuthError::NotAuthenticated),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Restores the persisted session.
    ///
    /// Both keys are read from one snapshot. A record that does not parse is
    /// cleared, unless another writer replaced it in the meantime, and the
    /// session resolves to `Anonymous`. Any other layout without both keys
    /// is simply `Anonymous`.
    ///
    /// # Errors
    /// Returns an error only if the backing store itself fails.
    pub fn initialize(&mut self) -> Result<&SessionState, StoreError> {
        tracing::debug!("checking for an existing session");
        let mut values = self
            .store
            .get_many(&[AUTH_FLAG_KEY, USER_KEY])?
            .into_iter();
        let flag = values.next().flatten();
        let raw_user = values.next().flatten();

        self.state = match (flag.as_deref(), raw_user) {
            (Some(AUTH_FLAG_VALUE), Some(raw)) => {
                match serde_json::from_str::<SessionRecord>(&raw) {
                    Ok(record) => {
                        tracing::info!(email = %record.email, "restored existing session");
                        SessionState::Authenticated(record)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "stored session is corrupted, clearing it");
                        let expected = [(AUTH_FLAG_KEY, AUTH_FLAG_VALUE), (USER_KEY, raw.as_str())];
                        if !self.store.delete_if_unchanged(&expected)? {
                            tracing::debug!("session changed while healing, left as is");
                        }
                        SessionState::Anonymous
                    }
                }
            }
            (flag, user) => {
                tracing::debug!(
                    flag = ?flag,
                    has_user = user.is_some(),
                    "no existing session found"
                );
                SessionState::Anonymous
            }
        };

        Ok(&self.state)
    }

    /// Authenticates with the given form and persists the session.
    ///
    /// The form is expected to be validated already; this applies its own
    /// stricter phone check. On any error, memory and store are unchanged.
    ///
    /// # Errors
    /// Returns [`AuthError`] if the session is not loaded, someone is already
    /// logged in, the phone number fails the strict check, or the store
    /// cannot be written.
    pub fn login(&mut self, form: &FormInput) -> Result<SessionRecord, AuthError> {
        tracing::info!(phone = %form.phone_number, "login attempt");

        match &self.state {
            SessionState::Loading => return Err(AuthError::NotInitialized),
            SessionState::Authenticated(current) => {
                return Err(AuthError::AlreadyAuthenticated(current.display_name()));
            }
            SessionState::Anonymous => {}
        }

        if !is_valid_login_phone(&form.phone_number) {
            tracing::info!("login rejected: phone number must be +254 followed by 9 digits");
            return Err(AuthError::InvalidPhoneNumber);
        }

        let record = SessionRecord::from(form);
        let serialized = serde_json::to_string(&record).map_err(StoreError::from)?;

        if let Err(err) = self
            .store
            .set_many(&[(AUTH_FLAG_KEY, AUTH_FLAG_VALUE), (USER_KEY, &serialized)])
        {
            // Anonymous had no keys; put the store back that way.
            if let Err(rollback) = self.store.delete_many(&[AUTH_FLAG_KEY, USER_KEY]) {
                tracing::error!(error = %rollback, "failed to roll back partial session write");
            }
            return Err(err.into());
        }

        tracing::info!(email = %record.email, "login successful, session saved");
        self.state = SessionState::Authenticated(record.clone());
        Ok(record)
    }

    /// Clears the session. Logging out while logged out is a no-op apart
    /// from removing any stray keys.
    ///
    /// The keys are deleted first; if that fails the in-memory state is kept.
    /// Returns whether a session was active.
    ///
    /// # Errors
    /// Returns [`AuthError::NotInitialized`] before [`Self::initialize`], or a
    /// storage error if the persisted keys cannot be removed.
    pub fn logout(&mut self) -> Result<bool, AuthError> {
        if self.is_loading() {
            return Err(AuthError::NotInitialized);
        }
        let was_authenticated = self.is_authenticated();
        tracing::info!(was_authenticated, "logging out");
        self.store.delete_many(&[AUTH_FLAG_KEY, USER_KEY])?;
        self.state = SessionState::Anonymous;
        Ok(was_authenticated)
    }
}
