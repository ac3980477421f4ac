mod immediate;
mod retained;

use eframe::egui::{Color32, Painter, Pos2, Rect};

use crate::notes::{NoteGraph, SelectionSet};

use super::engine::LayoutState;
use super::style::{self, PaletteScheme};
use super::viewport::Viewport;

pub use retained::RetainedScene;

pub const DEFAULT_RENDER_THRESHOLD: usize = 1000;

/// The two draw strategies. Retained keeps one persistent element per
/// node/edge and diffs between frames; immediate redraws everything from the
/// model each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Retained,
    Immediate,
}

/// Pure strategy function of the visible node count plus the explicit
/// performance-mode override.
pub fn select_render_mode(
    visible_nodes: usize,
    threshold: usize,
    force_performance: bool,
) -> RenderMode {
    if force_performance || visible_nodes >= threshold {
        RenderMode::Immediate
    } else {
        RenderMode::Retained
    }
}

/// Screen-space inputs shared by both strategies, computed once per frame
/// from model + viewport + styling policy.
pub struct SceneFrame<'a> {
    pub nodes: Vec<SceneNode<'a>>,
    pub edges: Vec<(usize, usize)>,
    pub edge_stroke: f32,
}

pub struct SceneNode<'a> {
    pub id: &'a str,
    pub pos: Pos2,
    pub radius: f32,
    pub fill: Color32,
    pub stroke_width: f32,
    pub label: String,
    pub font_size: f32,
    pub pinned: bool,
}

pub fn build_scene_frame<'a>(
    layout: &'a LayoutState,
    graph: &NoteGraph,
    viewport: &Viewport,
    rect: Rect,
    scheme: PaletteScheme,
    selection: &SelectionSet,
    hovered: Option<usize>,
) -> SceneFrame<'a> {
    let stroke_scale = viewport.stroke_scale();
    let mut nodes = Vec::with_capacity(layout.len());

    for index in 0..layout.len() {
        let id = layout.id(index);
        let pos = viewport.world_to_screen(rect, layout.position(index));
        let radius = viewport.screen_radius(layout.radius(index));
        let selected = selection.contains(id);
        let pinned = layout.is_pinned(index);
        let is_hovered = hovered == Some(index);

        let depth = layout.depth(index);
        let (kind, title) = graph
            .node(id)
            .map(|node| (node.kind, node.title.as_str()))
            .unwrap_or((crate::notes::NoteKind::Detail, id));

        let base_fill = style::node_fill(kind, depth, selected, scheme);
        let fill = if is_hovered {
            style::blend_color(base_fill, style::HOVER_COLOR, 0.65)
        } else {
            base_fill
        };

        nodes.push(SceneNode {
            id,
            pos,
            radius,
            fill,
            stroke_width: (style::stroke_width(selected, pinned) * stroke_scale).clamp(0.5, 4.0),
            label: style::truncate_label(title, style::label_limit(radius)),
            font_size: (style::font_size(kind) * stroke_scale).clamp(8.0, 22.0),
            pinned,
        });
    }

    SceneFrame {
        nodes,
        edges: layout.links().to_vec(),
        edge_stroke: (1.2 * stroke_scale).clamp(0.5, 3.5),
    }
}

/// Owns the per-frame strategy switch. Changing strategy tears the retained
/// scene down before the other takes over.
pub struct AdaptiveRenderer {
    mode: RenderMode,
    retained: RetainedScene,
}

impl Default for AdaptiveRenderer {
    fn default() -> Self {
        Self {
            mode: RenderMode::Retained,
            retained: RetainedScene::default(),
        }
    }
}

impl AdaptiveRenderer {
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn render(
        &mut self,
        painter: &Painter,
        rect: Rect,
        frame: &SceneFrame<'_>,
        threshold: usize,
        force_performance: bool,
    ) {
        // A zero-sized surface is a skipped frame, not an error.
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }

        let mode = select_render_mode(frame.nodes.len(), threshold, force_performance);
        if mode != self.mode {
            self.retained.clear();
            self.mode = mode;
        }

        match mode {
            RenderMode::Retained => {
                let stats = self.retained.sync(frame);
                if stats.added > 0 || stats.removed > 0 {
                    log::trace!(
                        "retained scene diff: +{} -{} ~{}",
                        stats.added,
                        stats.removed,
                        stats.updated
                    );
                }
                self.retained.paint(painter);
            }
            RenderMode::Immediate => immediate::paint(painter, frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_follows_the_node_count_threshold() {
        let cases = [
            (10, RenderMode::Retained),
            (999, RenderMode::Retained),
            (1000, RenderMode::Immediate),
            (5000, RenderMode::Immediate),
        ];
        for (count, expected) in cases {
            assert_eq!(
                select_render_mode(count, DEFAULT_RENDER_THRESHOLD, false),
                expected,
                "count {count}"
            );
        }
    }

    #[test]
    fn performance_override_forces_immediate() {
        assert_eq!(
            select_render_mode(10, DEFAULT_RENDER_THRESHOLD, true),
            RenderMode::Immediate
        );
    }
}
