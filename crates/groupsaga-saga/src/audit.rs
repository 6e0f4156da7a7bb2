use std::fmt;
use std::time::{Duration, Instant};

/// What happened on one node during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NodeStatus {
    /// The step is running against the node.
    Visiting,
    /// The node processed the step and is part of the prefix.
    Processed,
    /// The node rejected the step or the step errored; the run stopped here.
    Stopped,
    /// The node was handed to compensation.
    Compensating,
    /// Compensation was due for the node but could not be started.
    Stranded,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Visiting => "visiting",
            Self::Processed => "processed",
            Self::Stopped => "stopped",
            Self::Compensating => "compensating",
            Self::Stranded => "stranded",
        })
    }
}

/// One node visit.
#[derive(Debug)]
pub struct NodeVisit {
    pub node: String,
    pub status: NodeStatus,
    pub reason: Option<String>,
    visited_at: Instant,
    settled_at: Option<Instant>,
}

impl NodeVisit {
    /// Time between visiting the node and its verdict, if it has one.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.settled_at
            .map(|settled| settled.duration_since(self.visited_at))
    }

    fn settle(&mut self, status: NodeStatus) {
        self.status = status;
        self.settled_at = Some(Instant::now());
    }
}

/// Node-by-node trail of a saga run, in visiting order.
#[derive(Debug, Default)]
pub struct SagaAuditLog {
    visits: Vec<NodeVisit>,
}

impl SagaAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn visit(&mut self, node: String) {
        self.visits.push(NodeVisit {
            node,
            status: NodeStatus::Visiting,
            reason: None,
            visited_at: Instant::now(),
            settled_at: None,
        });
    }

    pub(crate) fn processed(&mut self) {
        if let Some(visit) = self.visits.last_mut() {
            visit.settle(NodeStatus::Processed);
        }
    }

    pub(crate) fn stopped(&mut self, reason: String) {
        if let Some(visit) = self.visits.last_mut() {
            visit.settle(NodeStatus::Stopped);
            visit.reason = Some(reason);
        }
    }

    /// Moves every processed node to `status`. The stopping node keeps its
    /// own status.
    pub(crate) fn hand_over(&mut self, status: NodeStatus) {
        self.visits
            .iter_mut()
            .filter(|visit| visit.status == NodeStatus::Processed)
            .for_each(|visit| visit.settle(status));
    }

    #[must_use]
    pub fn visits(&self) -> &[NodeVisit] {
        &self.visits
    }

    /// One `node: status` line per visit, with the reason for a stop.
    #[must_use]
    pub fn summary(&self) -> String {
        self.visits
            .iter()
            .map(|visit| match &visit.reason {
                Some(reason) => format!("{}: {} ({reason})", visit.node, visit.status),
                None => format!("{}: {}", visit.node, visit.status),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(log: &SagaAuditLog) -> Vec<NodeStatus> {
        log.visits().iter().map(|visit| visit.status).collect()
    }

    #[test]
    fn visit_is_open_until_settled() {
        let mut log = SagaAuditLog::new();
        log.visit("node0".to_string());

        assert_eq!(statuses(&log), vec![NodeStatus::Visiting]);
        assert!(log.visits()[0].elapsed().is_none());

        log.processed();

        assert_eq!(statuses(&log), vec![NodeStatus::Processed]);
        assert!(log.visits()[0].elapsed().is_some());
    }

    #[test]
    fn hand_over_leaves_stopping_node_alone() {
        let mut log = SagaAuditLog::new();
        log.visit("node0".to_string());
        log.processed();
        log.visit("node1".to_string());
        log.stopped("status 500".to_string());

        log.hand_over(NodeStatus::Compensating);

        assert_eq!(
            statuses(&log),
            vec![NodeStatus::Compensating, NodeStatus::Stopped]
        );
    }

    #[test]
    fn summary_lists_nodes_in_visiting_order() {
        let mut log = SagaAuditLog::new();
        log.visit("node0".to_string());
        log.processed();
        log.visit("node1".to_string());
        log.stopped("status 503".to_string());
        log.hand_over(NodeStatus::Stranded);

        assert_eq!(
            log.summary(),
            "node0: stranded\nnode1: stopped (status 503)"
        );
    }
}
