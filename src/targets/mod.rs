//! Who the user wants to stay in touch with.

pub mod contact;
pub mod store;

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

pub use contact::{filter_contacts, load_contacts, Contact};
pub use store::{KeyValueStore, TargetStore};

/// Ids ticked in the contact picker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSelection {
    selected: BTreeSet<String>,
}

impl TargetSelection {
    /// Pre-ticks saved targets that are still in the address book.
    pub fn from_saved(saved: &[Contact], device: &[Contact]) -> Self {
        let selected = saved
            .iter()
            .filter(|target| device.iter().any(|c| c.id == target.id))
            .map(|target| target.id.clone())
            .collect();
        Self { selected }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Flips `id` and returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    /// Selected contacts in address-book order.
    pub fn apply(&self, device: &[Contact]) -> Vec<Contact> {
        device
            .iter()
            .filter(|contact| self.is_selected(&contact.id))
            .cloned()
            .collect()
    }
}

/// Uniformly picks the person to reconnect with. Targets without a name
/// cannot be asked about and are skipped.
pub fn pick_random<'a, R: Rng + ?Sized>(targets: &'a [Contact], rng: &mut R) -> Option<&'a Contact> {
    let named: Vec<&Contact> = targets
        .iter()
        .filter(|target| !target.name.trim().is_empty())
        .collect();
    named.choose(rng).copied()
}
