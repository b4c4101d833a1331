use std::io::Write;
use std::path::Path;

use eyre::{bail, Result};

use crate::targets::{filter_contacts, load_contacts, Contact, TargetSelection, TargetStore};

fn describe(contact: &Contact) -> String {
    let numbers: Vec<String> = contact
        .phone_numbers
        .iter()
        .filter_map(|phone| {
            let number = phone.number.as_deref()?;
            Some(match phone.label.as_deref() {
                Some(label) if !label.trim().is_empty() => format!("{label}: {number}"),
                _ => number.to_string(),
            })
        })
        .collect();
    if numbers.is_empty() {
        contact.name.clone()
    } else {
        format!("{} ({})", contact.name, numbers.join(", "))
    }
}

pub fn list_targets(output: &mut dyn Write, store: &TargetStore) -> Result<()> {
    let targets = store.load()?;
    if targets.is_empty() {
        writeln!(output, "No targets saved yet. Use `linkle targets select` to add some.")?;
        return Ok(());
    }
    for target in &targets {
        writeln!(output, "{:>6}  {}", target.id, describe(target))?;
    }
    Ok(())
}

pub fn remove_target(output: &mut dyn Write, store: &TargetStore, id: &str) -> Result<()> {
    if !store.remove(id)? {
        bail!("No saved target with id {}", id);
    }
    writeln!(output, "Target removed.")?;
    Ok(())
}

/// Loads the address book, keeps the saved targets that are still in it
/// ticked, flips every id in `toggles` and saves the result.
pub fn select_targets(
    output: &mut dyn Write,
    store: &TargetStore,
    contacts_file: &Path,
    toggles: &[String],
) -> Result<()> {
    let device = load_contacts(contacts_file)?;
    let mut selection = TargetSelection::from_saved(&store.load()?, &device);

    for id in toggles {
        if !device.iter().any(|contact| &contact.id == id) {
            bail!("No contact with id {} in {}", id, contacts_file.display());
        }
        selection.toggle(id);
    }

    let targets = selection.apply(&device);
    store.replace(&targets)?;
    writeln!(output, "Successfully updated {} targets!", targets.len())?;
    Ok(())
}

pub fn list_contacts(
    output: &mut dyn Write,
    store: &TargetStore,
    contacts_file: &Path,
    search: Option<&str>,
) -> Result<()> {
    let device = load_contacts(contacts_file)?;
    let selection = TargetSelection::from_saved(&store.load()?, &device);
    let matches = filter_contacts(&device, search.unwrap_or(""));

    if matches.is_empty() {
        if device.is_empty() {
            writeln!(output, "No contacts found.")?;
        } else {
            writeln!(output, "No contacts match your search.")?;
        }
        return Ok(());
    }
    for contact in matches {
        let mark = if selection.is_selected(&contact.id) { "[x]" } else { "[ ]" };
        writeln!(output, "{} {:>6}  {}", mark, contact.id, describe(contact))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::targets::KeyValueStore;

    const BOOK: &str = r#"[
        {"id": "1", "name": "Sam Lee", "phoneNumbers": [{"number": "010-1234-5678"}]},
        {"id": "2", "name": "Alex Kim", "phoneNumbers": [{"number": "010-9999-0000", "label": "mobile"}]},
        {"id": "3", "name": "Jo Park"}
    ]"#;

    fn setup() -> (tempfile::TempDir, TargetStore, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let book = dir.path().join("contacts.json");
        fs::write(&book, BOOK).unwrap();
        let store = TargetStore::new(KeyValueStore::open(dir.path()));
        (dir, store, book)
    }

    #[test]
    fn select_then_list_marks_saved_targets() {
        let (_dir, store, book) = setup();
        let mut out = Vec::new();
        select_targets(&mut out, &store, &book, &["3".to_string(), "1".to_string()]).unwrap();
        let ids: Vec<String> = store.load().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let mut out = Vec::new();
        list_contacts(&mut out, &store, &book, Some("5678")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[x]"));
        assert!(text.contains("Sam Lee (010-1234-5678)"));
        assert!(!text.contains("Alex"));
    }

    #[test]
    fn selecting_again_toggles_off() {
        let (_dir, store, book) = setup();
        let mut out = Vec::new();
        select_targets(&mut out, &store, &book, &["1".to_string(), "2".to_string()]).unwrap();
        select_targets(&mut out, &store, &book, &["1".to_string()]).unwrap();
        let ids: Vec<String> = store.load().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let (_dir, store, book) = setup();
        let mut out = Vec::new();
        assert!(select_targets(&mut out, &store, &book, &["99".to_string()]).is_err());
        assert!(remove_target(&mut out, &store, "99").is_err());
    }

    #[test]
    fn empty_target_list_says_so() {
        let (_dir, store, _book) = setup();
        let mut out = Vec::new();
        list_targets(&mut out, &store).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("No targets saved yet"));
    }

    #[test]
    fn phone_labels_are_shown_when_present() {
        let (_dir, store, book) = setup();
        let mut out = Vec::new();
        list_contacts(&mut out, &store, &book, Some("alex")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Alex Kim (mobile: 010-9999-0000)"), "{text}");
    }
}
