mod client;
mod error;
mod response;

pub use client::NodeClient;
pub use error::NodeError;
pub use response::NodeResponse;

pub type Result<T> = std::result::Result<T, NodeError>;
