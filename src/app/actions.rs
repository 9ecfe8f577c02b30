use std::collections::HashSet;

use crate::contacts::{normalize_number, Contact};
use crate::storage::{RosterEntry, RosterStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Contact),
    /// The roster already holds this number; nothing was written.
    Duplicate,
    /// The number had no digits left after normalizing.
    InvalidNumber,
}

/// Roster edits shared by the list-management flow and tests.
pub struct RosterActions<'a> {
    store: &'a RosterStore,
}

impl<'a> RosterActions<'a> {
    pub fn new(store: &'a RosterStore) -> Self {
        Self { store }
    }

    pub fn add_contact(
        &self,
        entry: &RosterEntry,
        name: &str,
        raw_number: &str,
        aliases: &str,
    ) -> Result<AddOutcome, StoreError> {
        let number = normalize_number(raw_number);
        if number.trim_start_matches('+').is_empty() {
            return Ok(AddOutcome::InvalidNumber);
        }
        let mut contacts = match self.store.load(entry) {
            Ok(contacts) => contacts,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(err) => return Err(err),
        };
        if contacts.iter().any(|contact| contact.number == number) {
            return Ok(AddOutcome::Duplicate);
        }
        let contact = Contact::new(name, &number, aliases);
        contacts.push(contact.clone());
        self.store.save(entry, &contacts)?;
        Ok(AddOutcome::Added(contact))
    }

    /// Drops every contact whose number is in `numbers` and returns how many remain.
    pub fn remove_contacts(
        &self,
        entry: &RosterEntry,
        numbers: &HashSet<String>,
    ) -> Result<usize, StoreError> {
        let remaining: Vec<Contact> = self
            .store
            .load(entry)?
            .into_iter()
            .filter(|contact| !numbers.contains(&contact.number))
            .collect();
        self.store.save(entry, &remaining)?;
        Ok(remaining.len())
    }
}
