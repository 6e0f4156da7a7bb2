mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{
    LedgerBackend, LedgerSettings, NodeClientSettings, QueueSettings, RetrySettings, Settings,
};

pub type Result<T> = std::result::Result<T, ConfigError>;
