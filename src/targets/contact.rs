use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A person from the device address book, as exported by the phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
}

/// Reads an exported address book: a JSON array of contacts.
pub fn load_contacts(path: &Path) -> Result<Vec<Contact>> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read contacts from {}", path.display()))?;
    let contacts: Vec<Contact> = serde_json::from_str(&text)
        .wrap_err_with(|| format!("{} is not a JSON array of contacts", path.display()))?;
    tracing::debug!("Loaded {} contacts from {}", contacts.len(), path.display());
    Ok(contacts)
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Contacts whose name contains `term` (case-insensitive) or, when `term`
/// has digits, whose phone number digits contain those digits.
pub fn filter_contacts<'a>(contacts: &'a [Contact], term: &str) -> Vec<&'a Contact> {
    let term = term.trim().to_lowercase();
    let term_digits = digits(&term);

    contacts
        .iter()
        .filter(|contact| {
            let name_match = contact.name.to_lowercase().contains(&term);
            let phone_match = !term_digits.is_empty()
                && contact.phone_numbers.iter().any(|phone| {
                    phone
                        .number
                        .as_deref()
                        .map_or(false, |number| digits(number).contains(&term_digits))
                });
            name_match || phone_match
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, name: &str, number: Option<&str>) -> Contact {
        Contact {
            id: id.to_string(),
            name: name.to_string(),
            phone_numbers: number
                .map(|n| {
                    vec![PhoneNumber {
                        number: Some(n.to_string()),
                        label: Some("mobile".to_string()),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    fn book() -> Vec<Contact> {
        vec![
            contact("1", "Sam Lee", Some("+1 (555) 010-2030")),
            contact("2", "Alex Kim", Some("010-9876-5432")),
            contact("3", "Samantha", None),
        ]
    }

    #[test]
    fn deserializes_device_export_shape() {
        let json = r#"[{"id":"7","name":"Jo","phoneNumbers":[{"number":"123","label":"home"}]},{"id":"8"}]"#;
        let contacts: Vec<Contact> = serde_json::from_str(json).unwrap();
        assert_eq!(contacts[0].phone_numbers[0].number.as_deref(), Some("123"));
        assert_eq!(contacts[1].name, "");
        assert!(contacts[1].phone_numbers.is_empty());
    }

    #[test]
    fn name_search_is_case_insensitive() {
        let book = book();
        let ids: Vec<&str> = filter_contacts(&book, "SAM").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn phone_search_ignores_formatting() {
        let book = book();
        let found = filter_contacts(&book, "98765");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");

        let found = filter_contacts(&book, "555-010");
        assert_eq!(found[0].id, "1");
    }

    #[test]
    fn empty_term_matches_everyone() {
        assert_eq!(filter_contacts(&book(), "  ").len(), 3);
    }

    #[test]
    fn loads_contacts_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        fs::write(&path, serde_json::to_string(&book()).unwrap()).unwrap();
        assert_eq!(load_contacts(&path).unwrap(), book());

        fs::write(&path, "{}").unwrap();
        assert!(load_contacts(&path).is_err());
    }
}
