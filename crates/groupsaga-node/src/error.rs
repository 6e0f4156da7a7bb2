use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}
