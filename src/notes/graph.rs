use std::collections::{HashMap, HashSet};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::Deserialize;

/// Primary visual category of a note node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteKind {
    #[default]
    Topic,
    Subtopic,
    Detail,
    MicroDetail,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NoteNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub kind: NoteKind,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub connections: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NoteEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
}

/// Outcome of a model-ingestion call. Rejected nodes and dropped edges are
/// reported here instead of failing the whole operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub nodes_loaded: usize,
    pub nodes_rejected: usize,
    pub edges_loaded: usize,
    pub edges_dropped: usize,
}

/// The engine-owned node/edge store. Validation happens here at ingestion;
/// nothing downstream (simulation, renderer) ever re-checks per-node data.
#[derive(Default)]
pub struct NoteGraph {
    nodes: HashMap<String, NoteNode>,
    order: Vec<String>,
    edges: Vec<NoteEdge>,
    generation: u64,
}

impl NoteGraph {
    /// Replaces the whole model. Nodes with an empty id are rejected,
    /// duplicate ids keep the first occurrence, and edges whose endpoints do
    /// not both resolve are dropped silently.
    pub fn load(&mut self, nodes: Vec<NoteNode>, edges: Vec<NoteEdge>) -> LoadReport {
        self.nodes.clear();
        self.order.clear();
        self.edges.clear();
        self.generation = self.generation.wrapping_add(1);

        let mut report = LoadReport::default();
        self.ingest(nodes, edges, &mut report);

        if report.nodes_rejected > 0 || report.edges_dropped > 0 {
            log::warn!(
                "graph load: rejected {} node(s), dropped {} edge(s)",
                report.nodes_rejected,
                report.edges_dropped
            );
        }
        report
    }

    /// Merges a drill-down result under `parent_id`. Any children previously
    /// produced for that parent (identified via their `parent_id`
    /// back-reference) are removed first so repeated drill-downs never
    /// accumulate duplicate subtrees.
    pub fn append_children(
        &mut self,
        parent_id: &str,
        nodes: Vec<NoteNode>,
        edges: Vec<NoteEdge>,
    ) -> LoadReport {
        self.generation = self.generation.wrapping_add(1);

        let stale = self
            .order
            .iter()
            .filter(|id| {
                self.nodes
                    .get(id.as_str())
                    .is_some_and(|node| node.parent_id.as_deref() == Some(parent_id))
            })
            .cloned()
            .collect::<HashSet<_>>();

        if !stale.is_empty() {
            self.order.retain(|id| !stale.contains(id));
            for id in &stale {
                self.nodes.remove(id);
            }
            self.edges
                .retain(|edge| !stale.contains(&edge.source_id) && !stale.contains(&edge.target_id));
        }

        let mut report = LoadReport::default();
        self.ingest(nodes, edges, &mut report);
        report
    }

    fn ingest(&mut self, nodes: Vec<NoteNode>, edges: Vec<NoteEdge>, report: &mut LoadReport) {
        for node in nodes {
            if node.id.trim().is_empty() {
                report.nodes_rejected += 1;
                continue;
            }
            if self.nodes.contains_key(&node.id) {
                report.nodes_rejected += 1;
                continue;
            }
            self.order.push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
            report.nodes_loaded += 1;
        }

        for edge in edges {
            if self.nodes.contains_key(&edge.source_id)
                && self.nodes.contains_key(&edge.target_id)
                && edge.source_id != edge.target_id
            {
                self.edges.push(edge);
                report.edges_loaded += 1;
            } else {
                report.edges_dropped += 1;
            }
        }
    }

    /// Bumped on every mutating operation; drill-down replies are tagged with
    /// the generation they targeted and discarded on mismatch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn node(&self, id: &str) -> Option<&NoteNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn children_of<'a>(&'a self, parent_id: &'a str) -> impl Iterator<Item = &'a NoteNode> {
        self.order.iter().filter_map(move |id| {
            self.nodes
                .get(id)
                .filter(|node| node.parent_id.as_deref() == Some(parent_id))
        })
    }

    fn edges_iter(&self) -> impl Iterator<Item = &NoteEdge> {
        self.edges.iter()
    }
}

/// Filter applied upstream of the renderer; "visible" is defined here and
/// nowhere else.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterSpec {
    pub search: String,
    pub max_depth: Option<u32>,
    pub node_cap: Option<usize>,
}

/// Post-filter snapshot consumed by the layout engine and renderer. Links
/// are index pairs over `ids`, deduped, with both endpoints guaranteed to
/// resolve inside this same snapshot.
#[derive(Debug, Default)]
pub struct VisibleGraph {
    pub ids: Vec<String>,
    pub index_of: HashMap<String, usize>,
    pub links: Vec<(usize, usize)>,
}

impl VisibleGraph {
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }
}

/// Pure function of (graph, filter, selection): applying it twice to an
/// unchanged model yields an identical visible set.
pub fn filter_visible(
    graph: &NoteGraph,
    filter: &FilterSpec,
    selection: &SelectionSet,
) -> VisibleGraph {
    let query = filter.search.trim();
    let matcher = (!query.is_empty()).then(SkimMatcherV2::default);

    let mut ids = graph
        .ids()
        .filter(|id| {
            let Some(node) = graph.node(id) else {
                return false;
            };
            if filter.max_depth.is_some_and(|max| node.depth > max) {
                return false;
            }
            match &matcher {
                Some(matcher) => matcher
                    .fuzzy_match(&node.title, query)
                    .or_else(|| {
                        matcher.fuzzy_match(&node.title.to_ascii_lowercase(), &query.to_ascii_lowercase())
                    })
                    .is_some(),
                None => true,
            }
        })
        .map(str::to_owned)
        .collect::<Vec<_>>();

    if let Some(cap) = filter.node_cap
        && ids.len() > cap
    {
        let degree = link_degree(graph, &ids);
        let mut ranked = ids
            .into_iter()
            .map(|id| {
                let mut score = degree.get(&id).copied().unwrap_or(0) as i64;
                if selection.contains(&id) {
                    score += SELECTED_IMPORTANCE_BONUS;
                }
                (score, id)
            })
            .collect::<Vec<_>>();
        // Tie-break on id so the cap is deterministic across frames.
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        ranked.truncate(cap);
        ids = ranked.into_iter().map(|(_, id)| id).collect();
    }

    let mut index_of = HashMap::with_capacity(ids.len());
    for (index, id) in ids.iter().enumerate() {
        index_of.insert(id.clone(), index);
    }

    let mut links = Vec::new();
    for edge in graph.edges_iter() {
        if let (Some(&a), Some(&b)) = (index_of.get(&edge.source_id), index_of.get(&edge.target_id))
        {
            links.push((a.min(b), a.max(b)));
        }
    }
    for (index, id) in ids.iter().enumerate() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        for neighbor in &node.connections {
            if let Some(&other) = index_of.get(neighbor)
                && other != index
            {
                links.push((index.min(other), index.max(other)));
            }
        }
    }
    links.sort_unstable();
    links.dedup();

    VisibleGraph {
        ids,
        index_of,
        links,
    }
}

const SELECTED_IMPORTANCE_BONUS: i64 = 1_000_000;

fn link_degree(graph: &NoteGraph, ids: &[String]) -> HashMap<String, usize> {
    let id_set = ids.iter().map(String::as_str).collect::<HashSet<_>>();
    let mut degree: HashMap<String, usize> = HashMap::with_capacity(ids.len());

    for edge in graph.edges_iter() {
        if id_set.contains(edge.source_id.as_str()) && id_set.contains(edge.target_id.as_str()) {
            *degree.entry(edge.source_id.clone()).or_default() += 1;
            *degree.entry(edge.target_id.clone()).or_default() += 1;
        }
    }
    for id in ids {
        let Some(node) = graph.node(id) else {
            continue;
        };
        for neighbor in &node.connections {
            if id_set.contains(neighbor.as_str()) && neighbor != id {
                *degree.entry(id.clone()).or_default() += 1;
                *degree.entry(neighbor.clone()).or_default() += 1;
            }
        }
    }
    degree
}

/// The externally-owned selection set. The engine only reads it for styling
/// and the importance cap; toggling happens through interaction events.
#[derive(Default)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    /// Returns whether the id is selected after the toggle.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_owned());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, depth: u32) -> NoteNode {
        NoteNode {
            id: id.to_owned(),
            title: id.to_owned(),
            content: None,
            source: None,
            kind: NoteKind::Detail,
            depth,
            parent_id: None,
            connections: Vec::new(),
        }
    }

    fn child(id: &str, parent: &str) -> NoteNode {
        NoteNode {
            parent_id: Some(parent.to_owned()),
            ..node(id, 1)
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> NoteEdge {
        NoteEdge {
            id: id.to_owned(),
            source_id: source.to_owned(),
            target_id: target.to_owned(),
        }
    }

    #[test]
    fn load_rejects_blank_ids_and_drops_dangling_edges() {
        let mut graph = NoteGraph::default();
        let report = graph.load(
            vec![node("a", 0), node("", 0), node("b", 1)],
            vec![edge("e1", "a", "b"), edge("e2", "a", "missing")],
        );

        assert_eq!(report.nodes_loaded, 2);
        assert_eq!(report.nodes_rejected, 1);
        assert_eq!(report.edges_loaded, 1);
        assert_eq!(report.edges_dropped, 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn load_keeps_first_of_duplicate_ids() {
        let mut graph = NoteGraph::default();
        let first = NoteNode {
            title: "first".to_owned(),
            ..node("dup", 0)
        };
        let second = NoteNode {
            title: "second".to_owned(),
            ..node("dup", 0)
        };
        graph.load(vec![first, second], Vec::new());

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node("dup").unwrap().title, "first");
    }

    #[test]
    fn append_children_replaces_prior_children() {
        let mut graph = NoteGraph::default();
        graph.load(vec![node("p", 0)], Vec::new());

        graph.append_children(
            "p",
            vec![child("c1", "p"), child("c2", "p")],
            vec![edge("e1", "p", "c1"), edge("e2", "p", "c2")],
        );
        graph.append_children(
            "p",
            vec![child("c3", "p"), child("c4", "p")],
            vec![edge("e3", "p", "c3"), edge("e4", "p", "c4")],
        );

        let children = graph
            .children_of("p")
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        assert_eq!(children, HashSet::from(["c3", "c4"]));
        assert!(!graph.contains("c1"));
        assert!(!graph.contains("c2"));
        // Edges incident to the replaced children went with them.
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn filter_is_idempotent() {
        let mut graph = NoteGraph::default();
        graph.load(
            vec![node("alpha", 0), node("beta", 1), node("gamma", 2)],
            vec![edge("e1", "alpha", "beta")],
        );
        let filter = FilterSpec {
            search: String::new(),
            max_depth: Some(1),
            node_cap: None,
        };
        let selection = SelectionSet::default();

        let first = filter_visible(&graph, &filter, &selection);
        let second = filter_visible(&graph, &filter, &selection);
        assert_eq!(first.ids, second.ids);
        assert_eq!(first.links, second.links);
    }

    #[test]
    fn visible_links_only_connect_visible_nodes() {
        let mut graph = NoteGraph::default();
        let mut deep = node("deep", 5);
        deep.connections.push("alpha".to_owned());
        graph.load(
            vec![node("alpha", 0), node("beta", 1), deep],
            vec![edge("e1", "alpha", "deep"), edge("e2", "alpha", "beta")],
        );

        let filter = FilterSpec {
            max_depth: Some(1),
            ..FilterSpec::default()
        };
        let visible = filter_visible(&graph, &filter, &SelectionSet::default());

        assert_eq!(visible.node_count(), 2);
        for &(a, b) in &visible.links {
            assert!(a < visible.node_count());
            assert!(b < visible.node_count());
        }
        assert_eq!(visible.links.len(), 1);
    }

    #[test]
    fn node_cap_keeps_highest_degree_and_selected_nodes() {
        let mut graph = NoteGraph::default();
        let mut hub = node("hub", 0);
        hub.connections = vec!["s1".to_owned(), "s2".to_owned(), "s3".to_owned()];
        graph.load(
            vec![hub, node("s1", 1), node("s2", 1), node("s3", 1), node("lone", 1)],
            Vec::new(),
        );

        let mut selection = SelectionSet::default();
        selection.toggle("lone");
        let filter = FilterSpec {
            node_cap: Some(2),
            ..FilterSpec::default()
        };
        let visible = filter_visible(&graph, &filter, &selection);

        assert_eq!(visible.node_count(), 2);
        assert!(visible.index_of.contains_key("hub"));
        assert!(visible.index_of.contains_key("lone"));
    }

    #[test]
    fn connections_may_be_asymmetric() {
        let mut graph = NoteGraph::default();
        let mut b = node("b", 1);
        b.connections.push("a".to_owned());
        graph.load(vec![node("a", 0), b], Vec::new());

        let visible = filter_visible(&graph, &FilterSpec::default(), &SelectionSet::default());
        assert_eq!(visible.links, vec![(0, 1)]);
    }
}
