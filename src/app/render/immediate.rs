use eframe::egui::{Align2, FontId, Painter, Stroke, vec2};

use crate::app::style::{EDGE_COLOR, LABEL_COLOR, OUTLINE_COLOR, PIN_RING_COLOR};

use super::SceneFrame;

/// Immediate-mode rasterizer: every visible edge, then every visible node,
/// redrawn from the current frame. No state survives between frames, which
/// is the whole point at large node counts.
pub(super) fn paint(painter: &Painter, frame: &SceneFrame<'_>) {
    for &(a, b) in &frame.edges {
        let (Some(node_a), Some(node_b)) = (frame.nodes.get(a), frame.nodes.get(b)) else {
            continue;
        };
        painter.line_segment(
            [node_a.pos, node_b.pos],
            Stroke::new(frame.edge_stroke, EDGE_COLOR),
        );
    }

    for node in &frame.nodes {
        painter.circle_filled(node.pos, node.radius, node.fill);
        painter.circle_stroke(
            node.pos,
            node.radius,
            Stroke::new(node.stroke_width, OUTLINE_COLOR),
        );
        if node.pinned {
            painter.circle_stroke(node.pos, node.radius + 3.5, Stroke::new(1.6, PIN_RING_COLOR));
        }
        if !node.label.is_empty() {
            painter.text(
                node.pos + vec2(node.radius + 5.0, 0.0),
                Align2::LEFT_CENTER,
                &node.label,
                FontId::proportional(node.font_size),
                LABEL_COLOR,
            );
        }
    }
}
