use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use super::graph::{NoteEdge, NoteKind, NoteNode};

/// On-disk notes graph. Produced by the upstream notes explorer; this crate
/// only reads it.
#[derive(Debug, Deserialize)]
pub struct NotesFile {
    pub nodes: Vec<NoteNode>,
    #[serde(default)]
    pub edges: Vec<NoteEdge>,
}

pub fn load_notes_file(path: &Path) -> anyhow::Result<NotesFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read notes file {}", path.display()))?;
    let file: NotesFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse notes file {}", path.display()))?;

    log::info!(
        "loaded {} node(s) and {} edge(s) from {}",
        file.nodes.len(),
        file.edges.len(),
        path.display()
    );
    Ok(file)
}

/// Built-in sample graph used when no notes file is given on the CLI.
pub fn demo_graph() -> NotesFile {
    const TOPICS: [(&str, &[&str]); 3] = [
        ("distributed-systems", &["consensus", "replication", "partitioning"]),
        ("information-retrieval", &["indexing", "ranking", "embeddings"]),
        ("visualization", &["layouts", "perception", "interaction"]),
    ];

    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for (topic, subtopics) in TOPICS {
        nodes.push(NoteNode {
            id: topic.to_owned(),
            title: titleize(topic),
            content: Some(format!("Working notes on {}.", titleize(topic).to_lowercase())),
            source: None,
            kind: NoteKind::Topic,
            depth: 0,
            parent_id: None,
            connections: Vec::new(),
        });

        for subtopic in subtopics {
            let id = format!("{topic}/{subtopic}");
            nodes.push(NoteNode {
                id: id.clone(),
                title: titleize(subtopic),
                content: None,
                source: None,
                kind: NoteKind::Subtopic,
                depth: 1,
                parent_id: Some(topic.to_owned()),
                connections: vec![topic.to_owned()],
            });
            edges.push(NoteEdge {
                id: format!("edge:{topic}->{id}"),
                source_id: topic.to_owned(),
                target_id: id,
            });
        }
    }

    edges.push(NoteEdge {
        id: "edge:cross-1".to_owned(),
        source_id: "information-retrieval/embeddings".to_owned(),
        target_id: "visualization/layouts".to_owned(),
    });

    NotesFile { nodes, edges }
}

fn titleize(slug: &str) -> String {
    slug.split(['-', '/'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::NoteGraph;

    #[test]
    fn demo_graph_loads_cleanly() {
        let file = demo_graph();
        let mut graph = NoteGraph::default();
        let report = graph.load(file.nodes, file.edges);

        assert_eq!(report.nodes_rejected, 0);
        assert_eq!(report.edges_dropped, 0);
        assert!(graph.node_count() > 0);
    }

    #[test]
    fn notes_file_parses_optional_fields() {
        let canonical = r#"{
            "nodes": [
                {"id": "a", "title": "Alpha"},
                {"id": "b", "title": "Beta", "kind": "micro-detail", "depth": 3, "connections": ["a"]}
            ],
            "edges": [{"id": "e", "source_id": "a", "target_id": "b"}]
        }"#;
        let file: NotesFile = serde_json::from_str(canonical).unwrap();
        assert_eq!(file.nodes.len(), 2);
        assert_eq!(file.edges.len(), 1);
        assert_eq!(file.nodes[1].kind, NoteKind::MicroDetail);
    }
}
