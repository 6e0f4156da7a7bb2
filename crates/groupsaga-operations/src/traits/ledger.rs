use std::sync::Arc;
use std::time::Duration;

use groupsaga_core::LedgerKey;

use crate::Result;

/// Expiry applied by a ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The value does not expire.
    Never,
    /// The value expires after the given time.
    After(Duration),
    /// Keep whatever expiry the key currently has (none for a new key).
    Keep,
}

/// Shared key-value store holding rollback records.
///
/// Every method is atomic for its key. No operation spans several keys.
pub trait Ledger: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn get(&self, key: &LedgerKey) -> Result<Option<String>>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn set(&self, key: &LedgerKey, value: &str, expiry: Expiry) -> Result<()>;

    /// Writes only if the key is absent. Returns whether the write happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn set_if_absent(&self, key: &LedgerKey, value: &str, expiry: Expiry) -> Result<bool>;

    /// Replaces the value only if it still equals `expected`. `None` as the
    /// replacement deletes the key. Returns whether the swap happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn compare_and_swap(
        &self,
        key: &LedgerKey,
        expected: &str,
        replacement: Option<(&str, Expiry)>,
    ) -> Result<bool>;

    /// Returns whether a key was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn delete(&self, key: &LedgerKey) -> Result<bool>;

    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn exists(&self, key: &LedgerKey) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Remaining time to live, `None` for a missing key or one without expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    fn ttl(&self, key: &LedgerKey) -> Result<Option<Duration>>;
}

impl<T: Ledger + ?Sized> Ledger for Arc<T> {
    fn get(&self, key: &LedgerKey) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &LedgerKey, value: &str, expiry: Expiry) -> Result<()> {
        (**self).set(key, value, expiry)
    }

    fn set_if_absent(&self, key: &LedgerKey, value: &str, expiry: Expiry) -> Result<bool> {
        (**self).set_if_absent(key, value, expiry)
    }

    fn compare_and_swap(
        &self,
        key: &LedgerKey,
        expected: &str,
        replacement: Option<(&str, Expiry)>,
    ) -> Result<bool> {
        (**self).compare_and_swap(key, expected, replacement)
    }

    fn delete(&self, key: &LedgerKey) -> Result<bool> {
        (**self).delete(key)
    }

    fn exists(&self, key: &LedgerKey) -> Result<bool> {
        (**self).exists(key)
    }

    fn ttl(&self, key: &LedgerKey) -> Result<Option<Duration>> {
        (**self).ttl(key)
    }
}
