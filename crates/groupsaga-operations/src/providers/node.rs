use groupsaga_config::NodeClientSettings;
use groupsaga_core::{GroupId, NodeName};
use groupsaga_node::{NodeClient, NodeResponse};

use crate::Result;
use crate::traits::NodeGateway;

/// [`NodeGateway`] over HTTP.
pub struct HttpNodeGateway {
    client: NodeClient,
}

impl HttpNodeGateway {
    #[must_use]
    pub fn new(client: NodeClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_settings(settings: &NodeClientSettings) -> Result<Self> {
        let client = NodeClient::new(settings.connect_timeout(), settings.request_timeout())?;
        Ok(Self::new(client))
    }
}

impl NodeGateway for HttpNodeGateway {
    fn create_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse {
        self.client.create_group(node.as_str(), group_id.as_str())
    }

    fn delete_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse {
        self.client.delete_group(node.as_str(), group_id.as_str())
    }

    fn get_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse {
        self.client.get_group(node.as_str(), group_id.as_str())
    }
}
