use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::targets::contact::Contact;

pub const TARGET_CONTACTS_KEY: &str = "@randomCallTargetContacts";
pub const ONBOARDING_COMPLETED_KEY: &str = "@onboardingCompleted";

const STORE_FILE: &str = "storage.json";
const STORE_TMP_FILE: &str = "storage.json.tmp";

/// String keys to string values, persisted as one JSON object on disk.
pub struct KeyValueStore {
    path: PathBuf,
}

impl KeyValueStore {
    pub fn open(dir: &Path) -> Self {
        Self {
            path: dir.join(STORE_FILE),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
            key: self.path.display().to_string(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(entries)?;

        // Written next to the store and renamed over it, so a crash mid-write
        // leaves the previous contents intact.
        let tmp_path = self.path.with_file_name(STORE_TMP_FILE);
        let mut tmp_file = File::create(&tmp_path).map_err(io_err)?;
        tmp_file.write_all(text.as_bytes()).map_err(io_err)?;
        tmp_file.sync_all().map_err(io_err)?;
        drop(tmp_file);
        fs::rename(&tmp_path, &self.path).map_err(io_err)?;
        debug!("Wrote {} keys to {}", entries.len(), self.path.display());
        Ok(())
    }
}

/// The contacts the user chose to be reminded about.
pub struct TargetStore {
    store: KeyValueStore,
}

impl TargetStore {
    pub fn new(store: KeyValueStore) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<Vec<Contact>, StoreError> {
        match self.store.get(TARGET_CONTACTS_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Corrupt {
                key: TARGET_CONTACTS_KEY.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    pub fn replace(&self, targets: &[Contact]) -> Result<(), StoreError> {
        self.store
            .set(TARGET_CONTACTS_KEY, serde_json::to_string(targets)?)?;
        info!("Target contacts updated: {}", targets.len());
        Ok(())
    }

    /// Returns whether a target with `id` was removed.
    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut targets = self.load()?;
        let before = targets.len();
        targets.retain(|contact| contact.id != id);
        if targets.len() == before {
            return Ok(false);
        }
        self.replace(&targets)?;
        Ok(true)
    }

    pub fn onboarding_completed(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(ONBOARDING_COMPLETED_KEY)?.is_some())
    }

    pub fn mark_onboarding_completed(&self) -> Result<(), StoreError> {
        self.store.set(ONBOARDING_COMPLETED_KEY, "true".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::contact::PhoneNumber;

    fn contact(id: &str, name: &str) -> Contact {
        Contact {
            id: id.to_string(),
            name: name.to_string(),
            phone_numbers: vec![PhoneNumber {
                number: Some("555".to_string()),
                label: None,
            }],
        }
    }

    #[test]
    fn missing_file_means_no_targets() {
        let dir = tempfile::tempdir().unwrap();
        let targets = TargetStore::new(KeyValueStore::open(dir.path()));
        assert!(targets.load().unwrap().is_empty());
        assert!(!targets.onboarding_completed().unwrap());
    }

    #[test]
    fn targets_round_trip_under_fixed_key() {
        let dir = tempfile::tempdir().unwrap();
        let targets = TargetStore::new(KeyValueStore::open(&dir.path().join("nested")));
        let saved = vec![contact("1", "Sam"), contact("2", "Alex")];
        targets.replace(&saved).unwrap();
        assert_eq!(targets.load().unwrap(), saved);

        // Stored as a JSON array string under the key.
        let raw = KeyValueStore::open(&dir.path().join("nested"))
            .get(TARGET_CONTACTS_KEY)
            .unwrap()
            .unwrap();
        let decoded: Vec<Contact> = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn remove_drops_only_the_matching_target() {
        let dir = tempfile::tempdir().unwrap();
        let targets = TargetStore::new(KeyValueStore::open(dir.path()));
        targets
            .replace(&[contact("1", "Sam"), contact("2", "Alex")])
            .unwrap();

        assert!(targets.remove("1").unwrap());
        assert!(!targets.remove("404").unwrap());
        let left = targets.load().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "2");
    }

    #[test]
    fn onboarding_flag_persists_beside_targets() {
        let dir = tempfile::tempdir().unwrap();
        let targets = TargetStore::new(KeyValueStore::open(dir.path()));
        targets.replace(&[contact("1", "Sam")]).unwrap();
        targets.mark_onboarding_completed().unwrap();

        let reopened = TargetStore::new(KeyValueStore::open(dir.path()));
        assert!(reopened.onboarding_completed().unwrap());
        assert_eq!(reopened.load().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_target_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyValueStore::open(dir.path());
        store.set(TARGET_CONTACTS_KEY, "not json".to_string()).unwrap();
        let err = TargetStore::new(store).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn writes_replace_the_file_without_leaving_a_temp_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyValueStore::open(dir.path());
        store.set(ONBOARDING_COMPLETED_KEY, "true".to_string()).unwrap();
        // Left over from an interrupted write.
        std::fs::write(dir.path().join(STORE_TMP_FILE), "{ half writ").unwrap();

        store.set(TARGET_CONTACTS_KEY, "[]".to_string()).unwrap();

        assert!(!dir.path().join(STORE_TMP_FILE).exists());
        assert_eq!(
            store.get(ONBOARDING_COMPLETED_KEY).unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(store.get(TARGET_CONTACTS_KEY).unwrap().as_deref(), Some("[]"));
    }
}
