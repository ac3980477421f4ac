use eframe::egui::{Pos2, Rect, Vec2};

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 6.0;

/// Pan/zoom mapping from world to screen coordinates. Owned by the view,
/// mutated only by the zoom/pan handlers, read by renderer and hit-testing;
/// fully independent of the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + world * self.zoom
    }

    pub fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    /// Zooms by `factor`, keeping the world point under `anchor` fixed on
    /// screen.
    pub fn zoom_about(&mut self, rect: Rect, anchor: Pos2, factor: f32) {
        let world_before = self.screen_to_world(rect, anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor - rect.center() - (world_before * self.zoom);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Sublinear screen radius so nodes stay legible across the zoom range.
    pub fn screen_radius(&self, world_radius: f32) -> f32 {
        (world_radius * self.zoom.powf(0.40)).clamp(2.5, 46.0)
    }

    /// Stroke and font scaling; square root keeps lines from turning into
    /// slabs when zoomed in or hairlines when zoomed out.
    pub fn stroke_scale(&self) -> f32 {
        self.zoom.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    fn rect() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))
    }

    #[test]
    fn world_screen_round_trip() {
        let mut viewport = Viewport::default();
        viewport.pan = vec2(13.0, -7.0);
        viewport.zoom = 1.7;

        let world = vec2(120.0, -44.0);
        let screen = viewport.world_to_screen(rect(), world);
        let back = viewport.screen_to_world(rect(), screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn zoom_about_keeps_anchor_fixed() {
        let mut viewport = Viewport::default();
        let anchor = pos2(200.0, 150.0);
        let world_before = viewport.screen_to_world(rect(), anchor);

        viewport.zoom_about(rect(), anchor, 1.5);
        let world_after = viewport.screen_to_world(rect(), anchor);
        assert!((world_after - world_before).length() < 1e-3);
        assert!((viewport.zoom - 1.5).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.zoom_about(rect(), pos2(0.0, 0.0), 1000.0);
        assert_eq!(viewport.zoom, MAX_ZOOM);
        viewport.zoom_about(rect(), pos2(0.0, 0.0), 1e-6);
        assert_eq!(viewport.zoom, MIN_ZOOM);
    }
}
