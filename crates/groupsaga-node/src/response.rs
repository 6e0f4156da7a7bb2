/// Normalized outcome of a node call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeResponse {
    status: u16,
    body: String,
}

impl NodeResponse {
    /// Status used for calls that never reached the node.
    pub const UNREACHABLE_STATUS: u16 = 500;

    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Synthetic server error standing in for a transport failure.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::new(Self::UNREACHABLE_STATUS, reason)
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}
