use std::time::Duration;

use groupsaga_config::LedgerSettings;
use groupsaga_core::LedgerKey;
use redis::{Client, Connection, Script};
use tracing::debug;

use crate::Result;
use crate::traits::{Expiry, Ledger};

/// `ARGV[1]` expected value, `ARGV[2]` mode (`delete`, `keep`, `never` or
/// seconds to live), `ARGV[3]` replacement value.
const COMPARE_AND_SWAP: &str = r"
local current = redis.call('GET', KEYS[1])
if current ~= ARGV[1] then
    return 0
end
local mode = ARGV[2]
if mode == 'delete' then
    redis.call('DEL', KEYS[1])
elseif mode == 'keep' then
    redis.call('SET', KEYS[1], ARGV[3], 'KEEPTTL')
elseif mode == 'never' then
    redis.call('SET', KEYS[1], ARGV[3])
else
    redis.call('SET', KEYS[1], ARGV[3], 'EX', mode)
end
return 1
";

/// Ledger shared by every worker through Redis (6.0 or newer for `KEEPTTL`).
pub struct RedisLedger {
    client: Client,
    compare_and_swap: Script,
}

impl RedisLedger {
    /// Does not connect; the first operation does.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid Redis URL.
    pub fn open(url: &str) -> Result<Self> {
        debug!(url, "using redis ledger");
        Ok(Self {
            client: Client::open(url)?,
            compare_and_swap: Script::new(COMPARE_AND_SWAP),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the settings do not form a valid Redis URL.
    pub fn from_settings(settings: &LedgerSettings) -> Result<Self> {
        Self::open(&settings.redis_url())
    }

    fn connection(&self) -> Result<Connection> {
        Ok(self.client.get_connection()?)
    }
}

/// Arguments appended to `SET key value`.
fn set_options(expiry: Expiry) -> Vec<String> {
    match expiry {
        Expiry::Never => Vec::new(),
        Expiry::After(ttl) => vec!["EX".to_string(), seconds(ttl).to_string()],
        Expiry::Keep => vec!["KEEPTTL".to_string()],
    }
}

/// `ARGV[2]` and `ARGV[3]` of the compare-and-swap script.
fn swap_args(replacement: Option<(&str, Expiry)>) -> (String, String) {
    match replacement {
        None => ("delete".to_string(), String::new()),
        Some((value, Expiry::Keep)) => ("keep".to_string(), value.to_string()),
        Some((value, Expiry::Never)) => ("never".to_string(), value.to_string()),
        Some((value, Expiry::After(ttl))) => (seconds(ttl).to_string(), value.to_string()),
    }
}

/// Whole seconds, at least one: Redis rejects `EX 0`.
fn seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

impl Ledger for RedisLedger {
    fn get(&self, key: &LedgerKey) -> Result<Option<String>> {
        let mut con = self.connection()?;
        Ok(redis::cmd("GET").arg(key.as_str()).query(&mut con)?)
    }

    fn set(&self, key: &LedgerKey, value: &str, expiry: Expiry) -> Result<()> {
        let mut con = self.connection()?;
        redis::cmd("SET")
            .arg(key.as_str())
            .arg(value)
            .arg(set_options(expiry))
            .query::<()>(&mut con)?;
        Ok(())
    }

    fn set_if_absent(&self, key: &LedgerKey, value: &str, expiry: Expiry) -> Result<bool> {
        let mut con = self.connection()?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(key.as_str())
            .arg(value)
            .arg("NX")
            .arg(set_options(expiry))
            .query(&mut con)?;
        Ok(reply.is_some())
    }

    fn compare_and_swap(
        &self,
        key: &LedgerKey,
        expected: &str,
        replacement: Option<(&str, Expiry)>,
    ) -> Result<bool> {
        let mut con = self.connection()?;
        let (mode, value) = swap_args(replacement);
        let swapped: i64 = self
            .compare_and_swap
            .key(key.as_str())
            .arg(expected)
            .arg(mode)
            .arg(value)
            .invoke(&mut con)?;
        Ok(swapped == 1)
    }

    fn delete(&self, key: &LedgerKey) -> Result<bool> {
        let mut con = self.connection()?;
        let removed: i64 = redis::cmd("DEL").arg(key.as_str()).query(&mut con)?;
        Ok(removed > 0)
    }

    fn ttl(&self, key: &LedgerKey) -> Result<Option<Duration>> {
        let mut con = self.connection()?;
        // -2 for a missing key, -1 for a key without expiry.
        let millis: i64 = redis::cmd("PTTL").arg(key.as_str()).query(&mut con)?;
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }
}
