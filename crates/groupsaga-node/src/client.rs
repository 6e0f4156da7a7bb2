use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::Result;
use crate::error::NodeError;
use crate::response::NodeResponse;

#[derive(Serialize)]
struct GroupPayload<'a> {
    #[serde(rename = "groupId")]
    group_id: &'a str,
}

/// Blocking client for the `/v1/group/` endpoint exposed by every node.
///
/// Calls never fail: anything that prevents a response from arriving is
/// reported as [`NodeResponse::unreachable`]. No retries happen here.
pub struct NodeClient {
    http: Client,
}

impl NodeClient {
    /// # Errors
    ///
    /// Returns [`NodeError::ClientBuild`] if the TLS backend or resolver
    /// cannot be initialized.
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(NodeError::ClientBuild)?;
        Ok(Self { http })
    }

    /// `POST http://{node}/v1/group/`: 201 created, 400 conflict or bad request.
    pub fn create_group(&self, node: &str, group_id: &str) -> NodeResponse {
        info!(group_id, node, "creating group");
        let request = self
            .http
            .post(collection_url(node))
            .json(&GroupPayload { group_id });
        self.send(node, request)
    }

    /// `DELETE http://{node}/v1/group/`: 200 deleted.
    pub fn delete_group(&self, node: &str, group_id: &str) -> NodeResponse {
        info!(group_id, node, "deleting group");
        let request = self
            .http
            .delete(collection_url(node))
            .json(&GroupPayload { group_id });
        self.send(node, request)
    }

    /// `GET http://{node}/v1/group/{group_id}`: 200 exists, 404 absent.
    pub fn get_group(&self, node: &str, group_id: &str) -> NodeResponse {
        info!(group_id, node, "getting group");
        let Some(url) = group_url(node, group_id) else {
            error!(node, "node address does not form a valid URL");
            return NodeResponse::unreachable(format!("invalid node address '{node}'"));
        };
        self.send(node, self.http.get(url))
    }

    fn send(&self, node: &str, request: RequestBuilder) -> NodeResponse {
        match request.send() {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text() {
                    Ok(body) => NodeResponse::new(status, body),
                    Err(err) => {
                        warn!(node, status, error = %err, "failed to read node response body");
                        NodeResponse::new(status, String::new())
                    }
                }
            }
            Err(err) => {
                error!(node, error = %err, "failed to connect to node");
                NodeResponse::unreachable(err.to_string())
            }
        }
    }
}

fn collection_url(node: &str) -> String {
    format!("http://{node}/v1/group/")
}

/// The id becomes one percent-encoded path segment, whatever it contains.
fn group_url(node: &str, group_id: &str) -> Option<Url> {
    let mut url = Url::parse(&collection_url(node)).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().push(group_id);
    Some(url)
}
