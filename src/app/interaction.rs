use eframe::egui::{PointerButton, Pos2, Rect, Response, Ui};

use super::events::EngineEvent;
use super::{DragState, ViewModel};

/// Pointer pick slack in screen pixels, on top of the node's drawn radius.
const PICK_SLACK: f32 = 4.0;

impl ViewModel {
    /// Scroll-wheel zoom anchored at the pointer, so the world point under
    /// the cursor stays put.
    pub(in crate::app) fn handle_zoom(&mut self, ui: &Ui, rect: Rect) {
        let (scroll, pointer) = ui.input(|input| {
            (
                input.raw_scroll_delta.y,
                input.pointer.hover_pos(),
            )
        });
        if scroll == 0.0 {
            return;
        }
        let Some(pointer) = pointer else {
            return;
        };
        if !rect.contains(pointer) {
            return;
        }

        let factor = (1.0 + scroll * 0.0018).clamp(0.85, 1.15);
        self.viewport.zoom_about(rect, pointer, factor);
    }

    /// Finds the topmost node under a screen position. A coarse world-space
    /// radius query prunes candidates; the final test is against each node's
    /// drawn screen radius.
    pub(in crate::app) fn hit_test(&self, rect: Rect, screen: Pos2) -> Option<usize> {
        let world = self.viewport.screen_to_world(rect, screen);
        let pick_radius = 60.0 / self.viewport.zoom;

        let mut best: Option<(usize, f32)> = None;
        for index in self.layout.collect_within(world, pick_radius) {
            let node_screen = self
                .viewport
                .world_to_screen(rect, self.layout.position(index));
            let drawn = self.viewport.screen_radius(self.layout.radius(index));
            let distance = node_screen.distance(screen);
            if distance <= drawn + PICK_SLACK
                && best.is_none_or(|(_, best_distance)| distance < best_distance)
            {
                best = Some((index, distance));
            }
        }

        best.map(|(index, _)| index)
    }

    /// Drag, click, and drill-down gestures on the canvas response. Hover is
    /// resolved first so every gesture below sees the same target.
    pub(in crate::app) fn handle_pointer(&mut self, ui: &Ui, response: &Response, rect: Rect) {
        self.hovered = response
            .hover_pos()
            .filter(|_| self.drag.is_none())
            .and_then(|pos| self.hit_test(rect, pos));

        let modifiers = ui.input(|input| input.modifiers);

        if response.drag_started_by(PointerButton::Primary)
            && let Some(index) = self.hovered
        {
            self.layout.pin(index, self.layout.position(index));
            self.drag = Some(DragState {
                id: self.layout.id(index).to_owned(),
            });
            self.simulation.reheat();
        }

        if response.dragged() {
            match &self.drag {
                Some(drag) => {
                    if let Some(pointer) = response.interact_pointer_pos()
                        && let Some(index) = self.layout.index_of(&drag.id)
                    {
                        let world = self.viewport.screen_to_world(rect, pointer);
                        self.layout.pin(index, world);
                        self.simulation.reheat();
                        self.events.push(EngineEvent::DragMoved {
                            id: drag.id.clone(),
                            x: world.x,
                            y: world.y,
                        });
                    }
                }
                // No node under the press: any button pans.
                None => self.viewport.pan_by(response.drag_delta()),
            }
        }

        if response.drag_stopped()
            && let Some(drag) = self.drag.take()
        {
            // Command-release leaves the node pinned where it was dropped.
            if !modifiers.command
                && let Some(index) = self.layout.index_of(&drag.id)
            {
                self.layout.unpin(index);
                self.simulation.reheat();
            }
        }

        if response.clicked()
            && let Some(index) = self.hovered
        {
            let id = self.layout.id(index).to_owned();
            if modifiers.shift {
                self.events.push(EngineEvent::DrillDownRequested {
                    id,
                    generation: self.graph.generation(),
                });
            } else {
                let selected = self.selection.toggle(&id);
                self.events.push(EngineEvent::NodeClicked { id: id.clone() });
                self.events
                    .push(EngineEvent::SelectionChanged { id, selected });
            }
        }

        if response.secondary_clicked()
            && let Some(index) = self.hovered
        {
            self.events.push(EngineEvent::DrillDownRequested {
                id: self.layout.id(index).to_owned(),
                generation: self.graph.generation(),
            });
        }

        if response.double_clicked()
            && let Some(index) = self.hovered
        {
            self.events.push(EngineEvent::NodeDoubleClicked {
                id: self.layout.id(index).to_owned(),
            });
        }
    }
}
