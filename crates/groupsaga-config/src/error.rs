use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value '{value}' for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid node name in configuration")]
    InvalidNode(#[from] groupsaga_core::CoreError),

    #[error("no nodes configured; set `nodes` in the config file or HOSTS in the environment")]
    NoNodes,

    #[error("queue needs at least one worker")]
    NoWorkers,
}
