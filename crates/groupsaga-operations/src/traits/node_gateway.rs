use std::sync::Arc;

use groupsaga_core::{GroupId, NodeName};
use groupsaga_node::NodeResponse;

/// Remote create/delete/get-group calls against one node.
///
/// Implementations never return transport errors: an unreachable node is a
/// response with a server-error status.
pub trait NodeGateway: Send + Sync {
    fn create_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse;

    fn delete_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse;

    fn get_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse;
}

impl<T: NodeGateway + ?Sized> NodeGateway for Arc<T> {
    fn create_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse {
        (**self).create_group(node, group_id)
    }

    fn delete_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse {
        (**self).delete_group(node, group_id)
    }

    fn get_group(&self, node: &NodeName, group_id: &GroupId) -> NodeResponse {
        (**self).get_group(node, group_id)
    }
}
