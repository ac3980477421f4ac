use std::collections::HashMap;

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Stroke};

use crate::app::style::{EDGE_COLOR, LABEL_COLOR, OUTLINE_COLOR, PIN_RING_COLOR};

use super::SceneFrame;

/// One persistent visual element per node, updated in place across frames.
struct NodeElement {
    id: String,
    pos: Pos2,
    radius: f32,
    fill: Color32,
    stroke_width: f32,
    label: String,
    font_size: f32,
    pinned: bool,
    stamp: u64,
}

/// One persistent element per edge, keyed by its endpoint ids so it survives
/// index shuffles in the upstream snapshot.
struct EdgeElement {
    key: (String, String),
    stroke: f32,
    stamp: u64,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
}

/// Retained-mode scene: diffs the current frame's id sets against the
/// previous frame's, adding/removing elements and updating survivors'
/// position/style attributes only.
#[derive(Default)]
pub struct RetainedScene {
    nodes: Vec<NodeElement>,
    slot_of: HashMap<String, usize>,
    edges: Vec<EdgeElement>,
    edge_slot_of: HashMap<(String, String), usize>,
    stamp: u64,
}

impl RetainedScene {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.slot_of.clear();
        self.edges.clear();
        self.edge_slot_of.clear();
    }

    pub fn sync(&mut self, frame: &SceneFrame<'_>) -> SyncStats {
        self.stamp = self.stamp.wrapping_add(1);
        let mut stats = SyncStats::default();

        for scene_node in &frame.nodes {
            match self.slot_of.get(scene_node.id) {
                Some(&slot) => {
                    let element = &mut self.nodes[slot];
                    element.pos = scene_node.pos;
                    element.radius = scene_node.radius;
                    element.fill = scene_node.fill;
                    element.stroke_width = scene_node.stroke_width;
                    if element.label != scene_node.label {
                        element.label.clear();
                        element.label.push_str(&scene_node.label);
                    }
                    element.font_size = scene_node.font_size;
                    element.pinned = scene_node.pinned;
                    element.stamp = self.stamp;
                    stats.updated += 1;
                }
                None => {
                    self.slot_of
                        .insert(scene_node.id.to_owned(), self.nodes.len());
                    self.nodes.push(NodeElement {
                        id: scene_node.id.to_owned(),
                        pos: scene_node.pos,
                        radius: scene_node.radius,
                        fill: scene_node.fill,
                        stroke_width: scene_node.stroke_width,
                        label: scene_node.label.clone(),
                        font_size: scene_node.font_size,
                        pinned: scene_node.pinned,
                        stamp: self.stamp,
                    });
                    stats.added += 1;
                }
            }
        }

        for &(a, b) in &frame.edges {
            let (Some(node_a), Some(node_b)) = (frame.nodes.get(a), frame.nodes.get(b)) else {
                continue;
            };
            let key = (node_a.id.to_owned(), node_b.id.to_owned());
            match self.edge_slot_of.get(&key) {
                Some(&slot) => {
                    self.edges[slot].stroke = frame.edge_stroke;
                    self.edges[slot].stamp = self.stamp;
                }
                None => {
                    self.edge_slot_of.insert(key.clone(), self.edges.len());
                    self.edges.push(EdgeElement {
                        key,
                        stroke: frame.edge_stroke,
                        stamp: self.stamp,
                    });
                }
            }
        }

        let stamp = self.stamp;
        let nodes_before = self.nodes.len();
        self.nodes.retain(|element| element.stamp == stamp);
        stats.removed = nodes_before - self.nodes.len();
        if stats.removed > 0 || stats.added > 0 {
            self.slot_of.clear();
            for (slot, element) in self.nodes.iter().enumerate() {
                self.slot_of.insert(element.id.clone(), slot);
            }
        }

        let edges_before = self.edges.len();
        self.edges.retain(|element| element.stamp == stamp);
        if self.edges.len() != edges_before || stats.added > 0 {
            self.edge_slot_of.clear();
            for (slot, element) in self.edges.iter().enumerate() {
                self.edge_slot_of.insert(element.key.clone(), slot);
            }
        }

        stats
    }

    pub fn paint(&self, painter: &Painter) {
        for edge in &self.edges {
            let (Some(&a), Some(&b)) = (self.slot_of.get(&edge.key.0), self.slot_of.get(&edge.key.1))
            else {
                continue;
            };
            painter.line_segment(
                [self.nodes[a].pos, self.nodes[b].pos],
                Stroke::new(edge.stroke, EDGE_COLOR),
            );
        }

        for element in &self.nodes {
            painter.circle_filled(element.pos, element.radius, element.fill);
            painter.circle_stroke(
                element.pos,
                element.radius,
                Stroke::new(element.stroke_width, OUTLINE_COLOR),
            );
            if element.pinned {
                painter.circle_stroke(
                    element.pos,
                    element.radius + 3.5,
                    Stroke::new(1.6, PIN_RING_COLOR),
                );
            }
            if !element.label.is_empty() {
                painter.text(
                    element.pos + eframe::egui::vec2(element.radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    &element.label,
                    FontId::proportional(element.font_size),
                    LABEL_COLOR,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::render::SceneNode;
    use eframe::egui::pos2;

    fn frame_with<'a>(ids: &[&'a str], edges: Vec<(usize, usize)>) -> SceneFrame<'a> {
        SceneFrame {
            nodes: ids
                .iter()
                .enumerate()
                .map(|(index, id)| SceneNode {
                    id,
                    pos: pos2(index as f32 * 10.0, 0.0),
                    radius: 8.0,
                    fill: Color32::WHITE,
                    stroke_width: 1.0,
                    label: id.to_string(),
                    font_size: 12.0,
                    pinned: false,
                })
                .collect(),
            edges,
            edge_stroke: 1.0,
        }
    }

    #[test]
    fn first_sync_adds_every_element() {
        let mut scene = RetainedScene::default();
        let stats = scene.sync(&frame_with(&["a", "b", "c"], vec![(0, 1), (1, 2)]));

        assert_eq!(stats.added, 3);
        assert_eq!(stats.removed, 0);
        assert_eq!(scene.node_count(), 3);
        assert_eq!(scene.edge_count(), 2);
    }

    #[test]
    fn unchanged_id_set_only_updates_in_place() {
        let mut scene = RetainedScene::default();
        scene.sync(&frame_with(&["a", "b"], vec![(0, 1)]));
        let stats = scene.sync(&frame_with(&["a", "b"], vec![(0, 1)]));

        assert_eq!(
            stats,
            SyncStats {
                added: 0,
                removed: 0,
                updated: 2
            }
        );
        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.edge_count(), 1);
    }

    #[test]
    fn removed_ids_drop_their_elements_and_edges() {
        let mut scene = RetainedScene::default();
        scene.sync(&frame_with(&["a", "b", "c"], vec![(0, 1), (1, 2)]));
        let stats = scene.sync(&frame_with(&["a", "c"], vec![(0, 1)]));

        assert_eq!(stats.added, 0);
        assert_eq!(stats.removed, 1);
        assert_eq!(scene.node_count(), 2);
        // (a, c) is a new edge key; (a, b) and (b, c) are gone.
        assert_eq!(scene.edge_count(), 1);
    }

    #[test]
    fn clear_tears_everything_down() {
        let mut scene = RetainedScene::default();
        scene.sync(&frame_with(&["a", "b"], vec![(0, 1)]));
        scene.clear();
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.edge_count(), 0);
    }
}
