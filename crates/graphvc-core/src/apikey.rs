//! Storage for the user's own OpenAI API key.

use crate::error::{GraphvcError, GraphvcResult};
use crate::storage::KeyValueStore;

pub const APIKEY_STORAGE_KEY: &str = "graphvc_openai_api_key";

pub struct ApiKeyStore<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> ApiKeyStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn get(&self) -> Option<String> {
        self.store.get(APIKEY_STORAGE_KEY)
    }

    /// Store a key. Surrounding whitespace is dropped; empty keys are rejected.
    pub fn set(&self, key: &str) -> GraphvcResult<()> {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(GraphvcError::validation("API key cannot be empty"));
        }
        self.store.set(APIKEY_STORAGE_KEY, trimmed)
    }

    pub fn clear(&self) -> GraphvcResult<()> {
        self.store.remove(APIKEY_STORAGE_KEY)
    }

    /// The stored key with everything but its prefix and last four characters hidden.
    pub fn masked(&self) -> Option<String> {
        self.get().map(|key| mask(&key))
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_get_when_not_set() {
        let store = MemoryStore::new();
        assert_eq!(ApiKeyStore::new(&store).get(), None);
    }

    #[test]
    fn test_set_get_clear() {
        let store = MemoryStore::new();
        let keys = ApiKeyStore::new(&store);

        keys.set("  sk-new-key  ").unwrap();
        assert_eq!(store.get(APIKEY_STORAGE_KEY).as_deref(), Some("sk-new-key"));
        assert_eq!(keys.get().as_deref(), Some("sk-new-key"));

        keys.clear().unwrap();
        assert_eq!(store.get(APIKEY_STORAGE_KEY), None);
    }

    #[test]
    fn test_rejects_empty_key() {
        let store = MemoryStore::new();
        assert!(ApiKeyStore::new(&store).set("   ").is_err());
    }

    #[test]
    fn test_masked() {
        let store = MemoryStore::new();
        let keys = ApiKeyStore::new(&store);
        keys.set("sk-test-1234567890abcd").unwrap();
        assert_eq!(keys.masked().as_deref(), Some("sk-…abcd"));
        assert_eq!(mask("short"), "*****");
    }
}
