//! Anonymous trial gating.
//!
//! Anonymous callers without their own API key get [`MAX_TRIALS`]
//! generations. The count lives in client storage. Older clients stored a
//! single "trial used" flag; it is migrated to a count of one on first read.

use crate::error::GraphvcResult;
use crate::storage::KeyValueStore;

pub const TRIAL_COUNT_KEY: &str = "graphvc_trial_count";
pub const LEGACY_TRIAL_KEY: &str = "graphvc_trial_used";
pub const MAX_TRIALS: u32 = 3;

/// Trial counter over a key-value store.
pub struct TrialGate<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> TrialGate<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn migrate(&self) -> GraphvcResult<()> {
        if self.store.get(LEGACY_TRIAL_KEY).as_deref() == Some("true")
            && self.store.get(TRIAL_COUNT_KEY).is_none()
        {
            self.store.set(TRIAL_COUNT_KEY, "1")?;
            self.store.remove(LEGACY_TRIAL_KEY)?;
        }
        Ok(())
    }

    /// Generations used so far. Unparseable values count as zero.
    pub fn count(&self) -> GraphvcResult<u32> {
        self.migrate()?;
        Ok(self
            .store
            .get(TRIAL_COUNT_KEY)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0))
    }

    pub fn remaining(&self) -> GraphvcResult<u32> {
        Ok(MAX_TRIALS.saturating_sub(self.count()?))
    }

    pub fn is_exhausted(&self) -> GraphvcResult<bool> {
        Ok(self.count()? >= MAX_TRIALS)
    }

    /// Record one generation; returns the new count.
    pub fn increment(&self) -> GraphvcResult<u32> {
        let count = self.count()?.saturating_add(1);
        self.store.set(TRIAL_COUNT_KEY, &count.to_string())?;
        Ok(count)
    }

    pub fn reset(&self) -> GraphvcResult<()> {
        self.store.remove(TRIAL_COUNT_KEY)?;
        self.store.remove(LEGACY_TRIAL_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store_with(count: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store.set(TRIAL_COUNT_KEY, count).unwrap();
        store
    }

    #[test]
    fn test_zero_when_unused() {
        let store = MemoryStore::new();
        let gate = TrialGate::new(&store);
        assert_eq!(gate.count().unwrap(), 0);
        assert_eq!(gate.remaining().unwrap(), 3);
        assert!(!gate.is_exhausted().unwrap());
    }

    #[test]
    fn test_reads_stored_count() {
        let store = store_with("2");
        let gate = TrialGate::new(&store);
        assert_eq!(gate.count().unwrap(), 2);
        assert_eq!(gate.remaining().unwrap(), 1);
        assert!(!gate.is_exhausted().unwrap());
    }

    #[test]
    fn test_migrates_legacy_flag() {
        let store = MemoryStore::new();
        store.set(LEGACY_TRIAL_KEY, "true").unwrap();

        let gate = TrialGate::new(&store);
        assert_eq!(gate.count().unwrap(), 1);
        assert_eq!(store.get(TRIAL_COUNT_KEY).as_deref(), Some("1"));
        assert_eq!(store.get(LEGACY_TRIAL_KEY), None);
    }

    #[test]
    fn test_legacy_flag_ignored_when_count_present() {
        let store = store_with("2");
        store.set(LEGACY_TRIAL_KEY, "true").unwrap();

        let gate = TrialGate::new(&store);
        assert_eq!(gate.count().unwrap(), 2);
        assert_eq!(store.get(LEGACY_TRIAL_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn test_exhausted_at_and_over_limit() {
        let at = store_with("3");
        assert!(TrialGate::new(&at).is_exhausted().unwrap());
        assert_eq!(TrialGate::new(&at).remaining().unwrap(), 0);

        let over = store_with("10");
        assert!(TrialGate::new(&over).is_exhausted().unwrap());
        assert_eq!(TrialGate::new(&over).remaining().unwrap(), 0);
    }

    #[test]
    fn test_garbage_counts_as_zero() {
        let store = store_with("abc");
        assert_eq!(TrialGate::new(&store).count().unwrap(), 0);
    }

    #[test]
    fn test_increment() {
        let store = MemoryStore::new();
        let gate = TrialGate::new(&store);
        assert_eq!(gate.increment().unwrap(), 1);
        assert_eq!(store.get(TRIAL_COUNT_KEY).as_deref(), Some("1"));

        let store = store_with("2");
        let gate = TrialGate::new(&store);
        assert_eq!(gate.increment().unwrap(), 3);
        assert!(gate.is_exhausted().unwrap());

        gate.reset().unwrap();
        assert_eq!(gate.count().unwrap(), 0);
    }
}
