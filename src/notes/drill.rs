use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use crate::util::stable_pair;

use super::graph::{LoadReport, NoteEdge, NoteGraph, NoteKind, NoteNode};

/// A drill-down result: child nodes plus the edges wiring them in.
#[derive(Debug, Default)]
pub struct GraphDelta {
    pub nodes: Vec<NoteNode>,
    pub edges: Vec<NoteEdge>,
}

impl GraphDelta {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The external content-generation collaborator, seen from this crate as a
/// blocking call that produces finer-grained children for one node.
pub trait NoteExpander: Send + Sync {
    fn expand(&self, node: &NoteNode) -> anyhow::Result<GraphDelta>;
}

/// Tag carried by every drill-down request so a reply that arrives after the
/// model has moved on can be recognized and discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrillDownRequest {
    pub node_id: String,
    pub generation: u64,
}

pub struct DrillDownReply {
    pub request: DrillDownRequest,
    pub result: Result<GraphDelta, String>,
}

/// Runs the expander on a background thread; the UI thread polls the
/// receiver each frame and stays responsive.
pub fn spawn_drill_down(
    expander: Arc<dyn NoteExpander>,
    node: NoteNode,
    generation: u64,
) -> Receiver<DrillDownReply> {
    let (tx, rx) = mpsc::channel();
    let request = DrillDownRequest {
        node_id: node.id.clone(),
        generation,
    };

    thread::spawn(move || {
        let result = expander.expand(&node).map_err(|error| error.to_string());
        let _ = tx.send(DrillDownReply { request, result });
    });

    rx
}

#[derive(Debug, PartialEq, Eq)]
pub enum DrillDownOutcome {
    Applied(LoadReport),
    /// Zero children is a normal outcome, not an error; the model is left
    /// untouched and the node simply stays as-is.
    Empty,
    /// The model changed (or the node vanished) while the request was in
    /// flight; the reply is dropped without side effects.
    Stale,
    Failed(String),
}

/// Single place where a drill-down reply meets the model. Only the UI thread
/// calls this, preserving the single-writer rule.
pub fn apply_reply(graph: &mut NoteGraph, reply: DrillDownReply) -> DrillDownOutcome {
    let request = &reply.request;
    if graph.generation() != request.generation || !graph.contains(&request.node_id) {
        log::debug!(
            "discarding stale drill-down reply for {} (generation {})",
            request.node_id,
            request.generation
        );
        return DrillDownOutcome::Stale;
    }

    match reply.result {
        Ok(delta) if delta.is_empty() => DrillDownOutcome::Empty,
        Ok(delta) => {
            let report = graph.append_children(&request.node_id, delta.nodes, delta.edges);
            log::info!(
                "drill-down into {} added {} node(s)",
                request.node_id,
                report.nodes_loaded
            );
            DrillDownOutcome::Applied(report)
        }
        Err(error) => {
            log::warn!("drill-down into {} failed: {error}", request.node_id);
            DrillDownOutcome::Failed(error)
        }
    }
}

/// Deterministic stand-in for the language-model generator: produces a small
/// fanout of children one category finer than the parent.
pub struct SyntheticExpander;

impl NoteExpander for SyntheticExpander {
    fn expand(&self, node: &NoteNode) -> anyhow::Result<GraphDelta> {
        let child_kind = match node.kind {
            NoteKind::Topic => NoteKind::Subtopic,
            NoteKind::Subtopic => NoteKind::Detail,
            NoteKind::Detail | NoteKind::MicroDetail => NoteKind::MicroDetail,
        };

        let (jx, jy) = stable_pair(&node.id);
        let fanout = 2 + (((jx.abs() + jy.abs()) * 10.0) as usize % 3);

        let mut delta = GraphDelta::default();
        for index in 0..fanout {
            let id = format!("{}/gen-{index}", node.id);
            delta.edges.push(NoteEdge {
                id: format!("edge:{}->{id}", node.id),
                source_id: node.id.clone(),
                target_id: id.clone(),
            });
            delta.nodes.push(NoteNode {
                id,
                title: format!("{}: aspect {}", node.title, index + 1),
                content: Some(format!("Generated expansion of \"{}\".", node.title)),
                source: None,
                kind: child_kind,
                depth: node.depth + 1,
                parent_id: Some(node.id.clone()),
                connections: vec![node.id.clone()],
            });
        }
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::load::demo_graph;

    fn loaded_graph() -> NoteGraph {
        let file = demo_graph();
        let mut graph = NoteGraph::default();
        graph.load(file.nodes, file.edges);
        graph
    }

    #[test]
    fn synthetic_expander_is_deterministic() {
        let graph = loaded_graph();
        let node = graph.node("visualization").unwrap();

        let first = SyntheticExpander.expand(node).unwrap();
        let second = SyntheticExpander.expand(node).unwrap();
        let ids = |delta: &GraphDelta| {
            delta
                .nodes
                .iter()
                .map(|node| node.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
        assert!(!first.is_empty());
        assert!(first.nodes.iter().all(|child| {
            child.parent_id.as_deref() == Some("visualization") && child.depth == 1
        }));
    }

    #[test]
    fn stale_reply_is_discarded_without_mutation() {
        let mut graph = loaded_graph();
        let node = graph.node("visualization").unwrap().clone();
        let delta = SyntheticExpander.expand(&node).unwrap();
        let reply = DrillDownReply {
            request: DrillDownRequest {
                node_id: node.id.clone(),
                generation: graph.generation(),
            },
            result: Ok(delta),
        };

        // The whole model is replaced before the reply lands.
        let replacement = demo_graph();
        graph.load(replacement.nodes, replacement.edges);
        let ids_before = graph.ids().map(str::to_owned).collect::<Vec<_>>();

        assert_eq!(apply_reply(&mut graph, reply), DrillDownOutcome::Stale);
        let ids_after = graph.ids().map(str::to_owned).collect::<Vec<_>>();
        assert_eq!(ids_before, ids_after);
    }

    #[test]
    fn empty_reply_leaves_model_unchanged() {
        let mut graph = loaded_graph();
        let generation = graph.generation();
        let reply = DrillDownReply {
            request: DrillDownRequest {
                node_id: "visualization".to_owned(),
                generation,
            },
            result: Ok(GraphDelta::default()),
        };

        assert_eq!(apply_reply(&mut graph, reply), DrillDownOutcome::Empty);
        assert_eq!(graph.generation(), generation);
    }

    #[test]
    fn failed_reply_reports_without_mutation() {
        let mut graph = loaded_graph();
        let count_before = graph.node_count();
        let reply = DrillDownReply {
            request: DrillDownRequest {
                node_id: "visualization".to_owned(),
                generation: graph.generation(),
            },
            result: Err("generator unreachable".to_owned()),
        };

        match apply_reply(&mut graph, reply) {
            DrillDownOutcome::Failed(message) => assert_eq!(message, "generator unreachable"),
            other => panic!("expected failure outcome, got {other:?}"),
        }
        assert_eq!(graph.node_count(), count_before);
    }

    #[test]
    fn second_drill_down_replaces_first() {
        let mut graph = loaded_graph();
        let node = graph.node("visualization").unwrap().clone();

        let mut first = SyntheticExpander.expand(&node).unwrap();
        for (index, child) in first.nodes.iter_mut().enumerate() {
            child.id = format!("first-{index}");
        }
        first.edges.clear();
        let reply = DrillDownReply {
            request: DrillDownRequest {
                node_id: node.id.clone(),
                generation: graph.generation(),
            },
            result: Ok(first),
        };
        assert!(matches!(
            apply_reply(&mut graph, reply),
            DrillDownOutcome::Applied(_)
        ));

        let second = SyntheticExpander.expand(&node).unwrap();
        let expected = second
            .nodes
            .iter()
            .map(|child| child.id.clone())
            .collect::<std::collections::HashSet<_>>();
        let reply = DrillDownReply {
            request: DrillDownRequest {
                node_id: node.id.clone(),
                generation: graph.generation(),
            },
            result: Ok(second),
        };
        assert!(matches!(
            apply_reply(&mut graph, reply),
            DrillDownOutcome::Applied(_)
        ));

        let children = graph
            .children_of(&node.id)
            .map(|child| child.id.clone())
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(children, expected);
    }
}
