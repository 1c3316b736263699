// In-process storage, lost when the process exits

use super::{Storage, validate_key};
use eyre::Result;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing() {
        let storage = MemoryStorage::new();
        assert!(storage.get("todos").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let mut storage = MemoryStorage::new();
        storage.set("todos", "first").unwrap();
        storage.set("todos", "second").unwrap();

        assert_eq!(storage.get("todos").unwrap().as_deref(), Some("second"));
        assert_eq!(storage.slots.len(), 1);
    }

    #[test]
    fn test_rejects_invalid_key() {
        let mut storage = MemoryStorage::new();
        assert!(storage.set("a/b", "x").is_err());
    }
}
