use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use groupsaga_core::LedgerKey;

use crate::Result;
use crate::traits::{Expiry, Ledger};

struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Process-local ledger with key expiry.
///
/// Only coordinates sagas running in the same process.
pub struct MemoryLedger {
    slots: Mutex<HashMap<String, Slot>>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Locks the map after dropping expired keys.
    fn live_slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        slots.retain(|_, slot| slot.is_live(now));
        slots
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn expires_at(expiry: Expiry, previous: Option<&Slot>) -> Option<Instant> {
    match expiry {
        Expiry::Never => None,
        Expiry::After(ttl) => Some(Instant::now() + ttl),
        Expiry::Keep => previous.and_then(|slot| slot.expires_at),
    }
}

fn write(slots: &mut HashMap<String, Slot>, key: &LedgerKey, value: &str, expiry: Expiry) {
    let expires_at = expires_at(expiry, slots.get(key.as_str()));
    slots.insert(
        key.as_str().to_string(),
        Slot {
            value: value.to_string(),
            expires_at,
        },
    );
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &LedgerKey) -> Result<Option<String>> {
        Ok(self
            .live_slots()
            .get(key.as_str())
            .map(|slot| slot.value.clone()))
    }

    fn set(&self, key: &LedgerKey, value: &str, expiry: Expiry) -> Result<()> {
        write(&mut self.live_slots(), key, value, expiry);
        Ok(())
    }

    fn set_if_absent(&self, key: &LedgerKey, value: &str, expiry: Expiry) -> Result<bool> {
        let mut slots = self.live_slots();
        if slots.contains_key(key.as_str()) {
            return Ok(false);
        }
        write(&mut slots, key, value, expiry);
        Ok(true)
    }

    fn compare_and_swap(
        &self,
        key: &LedgerKey,
        expected: &str,
        replacement: Option<(&str, Expiry)>,
    ) -> Result<bool> {
        let mut slots = self.live_slots();
        let matches = slots
            .get(key.as_str())
            .is_some_and(|slot| slot.value == expected);
        if !matches {
            return Ok(false);
        }
        match replacement {
            Some((value, expiry)) => write(&mut slots, key, value, expiry),
            None => {
                slots.remove(key.as_str());
            }
        }
        Ok(true)
    }

    fn delete(&self, key: &LedgerKey) -> Result<bool> {
        Ok(self.live_slots().remove(key.as_str()).is_some())
    }

    fn ttl(&self, key: &LedgerKey) -> Result<Option<Duration>> {
        let now = Instant::now();
        Ok(self
            .live_slots()
            .get(key.as_str())
            .and_then(|slot| slot.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }
}
