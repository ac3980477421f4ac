use eframe::egui::{
    self, Align2, Color32, Context, FontId, Painter, Pos2, Rect, Sense, Stroke, Ui, vec2,
};

use super::ViewModel;
use super::events::EngineEvent;
use super::render::{self, RenderMode};

fn draw_background(painter: &Painter, rect: Rect, pan: eframe::egui::Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

impl ViewModel {
    pub(super) fn show(&mut self, ctx: &Context, reload_requested: &mut bool, is_reloading: bool) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("notemap");
                ui.separator();
                ui.label(format!(
                    "{} notes, {} edges",
                    self.graph.node_count(),
                    self.graph.edge_count()
                ));
                ui.separator();
                ui.label(format!("{} visible", self.visible.node_count()));
                ui.separator();
                ui.label(format!("energy {:.3}", self.simulation.alpha()))
                    .on_hover_text("Layout settles as this decays toward zero");
                ui.separator();
                let mode = match self.renderer.mode() {
                    RenderMode::Retained => "retained",
                    RenderMode::Immediate => "immediate",
                };
                ui.label(format!("draw: {mode}"))
                    .on_hover_text("Rendering strategy, switched on visible node count");

                if self.pending_drill.is_some() {
                    ui.separator();
                    ui.spinner();
                    ui.label("expanding...");
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if is_reloading {
                        ui.spinner();
                    } else if ui
                        .button("Reload")
                        .on_hover_text("Reload the notes file from disk")
                        .clicked()
                    {
                        *reload_requested = true;
                    }
                    if let Some(status) = &self.status {
                        ui.label(status.as_str());
                    }
                });
            });
        });

        egui::SidePanel::left("controls_panel")
            .default_width(250.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_controls(ui);
                });
            });

        egui::SidePanel::right("details_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_details(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_graph(ui);
        });
    }

    fn draw_graph(&mut self, ui: &mut Ui) {
        self.poll_drill_down();
        self.sync_model();

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.viewport.pan, self.viewport.zoom);

        self.handle_zoom(ui, rect);

        let was_converged = self.simulation.converged(&self.sim_config);
        let outcome = self.simulation.step(&mut self.layout, &self.sim_config);
        if !was_converged && self.simulation.converged(&self.sim_config) {
            self.events.push(EngineEvent::SimulationConverged);
        }

        self.handle_pointer(ui, &response, rect);

        if self.hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let frame = render::build_scene_frame(
            &self.layout,
            &self.graph,
            &self.viewport,
            rect,
            self.scheme,
            &self.selection,
            self.hovered,
        );
        self.renderer.render(
            &painter,
            rect,
            &frame,
            self.render_threshold,
            self.force_performance,
        );

        if let Some(index) = self.hovered
            && let Some(node) = self.graph.node(self.layout.id(index))
        {
            let info = format!(
                "{}  |  {:?}  |  depth {}  |  {} link(s)",
                node.title,
                node.kind,
                node.depth,
                node.connections.len()
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                info,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        self.process_events();

        if outcome.any_motion || response.dragged() || self.pending_drill.is_some() {
            ui.ctx().request_repaint();
        }
    }
}
