use eframe::egui::{self, RichText, Ui};

use super::super::ViewModel;
use super::super::events::EngineEvent;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Note Details");
        ui.separator();
        ui.add_space(4.0);

        let detail_id = self
            .details
            .clone()
            .or_else(|| self.selection.iter().next().map(str::to_owned));

        match detail_id {
            Some(id) => self.draw_note_card(ui, &id),
            None => {
                ui.label("Click a note to select it; double-click to inspect it here.");
            }
        }

        if !self.selection.is_empty() {
            ui.add_space(8.0);
            egui::CollapsingHeader::new(format!("Selection ({})", self.selection.len()))
                .default_open(true)
                .show(ui, |ui| {
                    let mut inspect = None;
                    for id in self.selection.iter() {
                        let title = self
                            .graph
                            .node(id)
                            .map(|node| node.title.as_str())
                            .unwrap_or(id);
                        if ui.selectable_label(self.details.as_deref() == Some(id), title).clicked()
                        {
                            inspect = Some(id.to_owned());
                        }
                    }
                    if inspect.is_some() {
                        self.details = inspect;
                    }
                });
        }
    }

    fn draw_note_card(&mut self, ui: &mut Ui, id: &str) {
        let Some(node) = self.graph.node(id).cloned() else {
            ui.label("This note is no longer in the graph.");
            return;
        };

        ui.label(RichText::new(&node.title).strong());
        ui.label(format!("{:?}, depth {}", node.kind, node.depth));
        if let Some(parent_id) = &node.parent_id {
            let parent_title = self
                .graph
                .node(parent_id)
                .map(|parent| parent.title.as_str())
                .unwrap_or(parent_id.as_str());
            ui.label(format!("Part of: {parent_title}"));
        }
        if let Some(source) = &node.source {
            ui.label(format!("Source: {source}"));
        }

        ui.add_space(6.0);
        if let Some(content) = &node.content {
            ui.label(content.as_str());
        } else {
            ui.label(RichText::new("No note body.").weak());
        }

        ui.add_space(6.0);
        let child_count = self.graph.children_of(id).count();
        ui.label(format!(
            "{} linked note(s), {} child note(s)",
            node.connections.len(),
            child_count
        ));

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let expanding = self.pending_drill.is_some();
            if ui
                .add_enabled(!expanding, egui::Button::new("Expand"))
                .on_hover_text("Fetch finer-grained notes beneath this one.")
                .clicked()
            {
                self.events.push(EngineEvent::DrillDownRequested {
                    id: id.to_owned(),
                    generation: self.graph.generation(),
                });
            }

            if let Some(index) = self.layout.index_of(id) {
                if self.layout.is_pinned(index) {
                    if ui.button("Unpin").clicked() {
                        self.layout.unpin(index);
                        self.simulation.reheat();
                    }
                } else if ui.button("Pin").clicked() {
                    self.layout.pin(index, self.layout.position(index));
                }
            }

            let selected = self.selection.contains(id);
            let select_label = if selected { "Deselect" } else { "Select" };
            if ui.button(select_label).clicked() {
                let now_selected = self.selection.toggle(id);
                self.events.push(EngineEvent::SelectionChanged {
                    id: id.to_owned(),
                    selected: now_selected,
                });
            }
        });
    }
}
