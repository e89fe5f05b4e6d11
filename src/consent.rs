//! Persisted geolocation consent.
//!
//! All reads and writes of the two consent flags go through [`ConsentStore`],
//! so the resolver never touches storage keys directly.

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const PROMPT_SHOWN_KEY: &str = "locationPromptShown";
pub const DENIED_KEY: &str = "locationDenied";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsentFlags {
    pub prompt_shown: bool,
    pub denied: bool,
}

impl ConsentFlags {
    /// Whether the consent prompt has to be offered on load. A denial is only
    /// final once the prompt has actually been shown.
    pub fn needs_prompt(&self) -> bool {
        !self.prompt_shown
    }
}

pub struct ConsentStore {
    store: Box<dyn KeyValueStore>,
}

impl ConsentStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn get_consent_state(&self) -> Result<ConsentFlags, StorageError> {
        Ok(ConsentFlags {
            prompt_shown: self.read_flag(PROMPT_SHOWN_KEY)?,
            denied: self.read_flag(DENIED_KEY)?,
        })
    }

    pub fn set_consent_state(&mut self, shown: bool, denied: bool) -> Result<(), StorageError> {
        self.store.set(PROMPT_SHOWN_KEY, bool_str(shown))?;
        self.store.set(DENIED_KEY, bool_str(denied))?;
        Ok(())
    }

    pub fn reset_consent_state(&mut self) -> Result<(), StorageError> {
        self.store.remove(PROMPT_SHOWN_KEY)?;
        self.store.remove(DENIED_KEY)?;
        Ok(())
    }

    // Anything other than the literal "true" counts as unset.
    fn read_flag(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.store.get(key)?.as_deref() == Some("true"))
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
