use eframe::egui::{self, Ui};

use super::super::ViewModel;
use super::super::style::PaletteScheme;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Explorer Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search notes")
            .on_hover_text("Fuzzy-match against note titles; non-matching notes are hidden.");
        ui.text_edit_singleline(&mut self.filter.search);

        ui.separator();

        ui.checkbox(&mut self.lens_enabled, "Depth lens")
            .on_hover_text("Hide notes deeper in the hierarchy than the chosen level.");
        ui.add_enabled_ui(self.lens_enabled, |ui| {
            ui.add(
                egui::Slider::new(&mut self.lens_depth, 0..=8)
                    .text("Max depth")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Notes at this depth and above stay visible.");
        });

        ui.checkbox(&mut self.cap_enabled, "Cap visible notes")
            .on_hover_text("Keep only the most connected notes when the graph grows large.");
        ui.add_enabled_ui(self.cap_enabled, |ui| {
            ui.add(
                egui::Slider::new(&mut self.cap_nodes, 10..=5000)
                    .text("Node cap")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Selected notes always survive the cap.");
        });

        ui.separator();

        ui.label("Palette");
        ui.horizontal_wrapped(|ui| {
            for scheme in PaletteScheme::ALL {
                ui.selectable_value(&mut self.scheme, scheme, scheme.label());
            }
        });

        ui.separator();

        ui.checkbox(&mut self.force_performance, "Performance mode")
            .on_hover_text("Force the immediate draw strategy regardless of node count.");
        ui.add(
            egui::Slider::new(&mut self.render_threshold, 100..=10_000)
                .text("Strategy threshold")
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text("Visible node count at which drawing switches to immediate mode.");

        ui.collapsing("Physics tuning", |ui| {
            ui.add(
                egui::Slider::new(&mut self.sim_config.repulsion_strength, 200.0..=3000.0)
                    .text("Repulsion")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly notes push away from each other.");
            ui.add(
                egui::Slider::new(&mut self.sim_config.link_strength, 0.01..=0.3)
                    .text("Link spring")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly linked notes pull toward their preferred distance.");
            ui.add(
                egui::Slider::new(&mut self.sim_config.collision_strength, 0.1..=1.0)
                    .text("Collision")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Overlap correction between nearby notes.");
            ui.add(
                egui::Slider::new(&mut self.sim_config.center_strength, 0.0..=0.1)
                    .text("Centering")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Gentle pull of the whole layout toward the origin.");
            ui.add(
                egui::Slider::new(&mut self.sim_config.alpha_decay, 0.005..=0.1)
                    .text("Cooling rate")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("Faster cooling settles sooner but may leave a rougher layout.");
        });

        ui.separator();

        ui.horizontal(|ui| {
            if ui
                .button("Reheat")
                .on_hover_text("Restart the layout simulation at full energy.")
                .clicked()
            {
                self.simulation.reheat();
            }
            if ui
                .button(format!("Clear pins ({})", self.layout.pinned_count()))
                .clicked()
            {
                self.layout.clear_pins();
                self.simulation.reheat();
            }
        });

        if ui
            .button(format!("Clear selection ({})", self.selection.len()))
            .clicked()
            && !self.selection.is_empty()
        {
            self.selection.clear();
            if self.cap_enabled {
                self.visible_dirty = true;
            }
        }

        ui.separator();
        ui.label("Drag to move a note; hold Cmd/Ctrl on release to keep it pinned.");
        ui.label("Shift-click or right-click a note to expand it.");
    }
}
