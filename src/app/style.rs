use eframe::egui::Color32;

use crate::notes::NoteKind;

/// Selectable color scheme for node fills.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaletteScheme {
    #[default]
    Spectrum,
    Warm,
    Mono,
}

impl PaletteScheme {
    pub const ALL: [PaletteScheme; 3] = [Self::Spectrum, Self::Warm, Self::Mono];

    pub fn label(self) -> &'static str {
        match self {
            Self::Spectrum => "Spectrum",
            Self::Warm => "Warm",
            Self::Mono => "Mono",
        }
    }
}

pub const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub const PIN_RING_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
pub const HOVER_COLOR: Color32 = Color32::from_rgb(255, 164, 101);
pub const LABEL_COLOR: Color32 = Color32::from_gray(238);
pub const EDGE_COLOR: Color32 = Color32::from_rgba_premultiplied(72, 72, 72, 200);
pub const OUTLINE_COLOR: Color32 = Color32::from_rgba_premultiplied(15, 15, 15, 190);

/// World-space radius: category sets the base size, depth shrinks it so
/// drill-down generations read as progressively finer grain.
pub fn node_radius(kind: NoteKind, depth: u32) -> f32 {
    let base = match kind {
        NoteKind::Topic => 26.0,
        NoteKind::Subtopic => 16.0,
        NoteKind::Detail => 10.0,
        NoteKind::MicroDetail => 6.0,
    };
    (base / (1.0 + depth as f32 * 0.1)).max(3.5)
}

pub fn node_fill(kind: NoteKind, depth: u32, selected: bool, scheme: PaletteScheme) -> Color32 {
    if selected {
        return SELECTED_COLOR;
    }

    let base = match (scheme, kind) {
        (PaletteScheme::Spectrum, NoteKind::Topic) => Color32::from_rgb(86, 156, 214),
        (PaletteScheme::Spectrum, NoteKind::Subtopic) => Color32::from_rgb(78, 201, 176),
        (PaletteScheme::Spectrum, NoteKind::Detail) => Color32::from_rgb(197, 134, 192),
        (PaletteScheme::Spectrum, NoteKind::MicroDetail) => Color32::from_rgb(220, 205, 125),
        (PaletteScheme::Warm, NoteKind::Topic) => Color32::from_rgb(224, 108, 77),
        (PaletteScheme::Warm, NoteKind::Subtopic) => Color32::from_rgb(233, 152, 90),
        (PaletteScheme::Warm, NoteKind::Detail) => Color32::from_rgb(240, 192, 112),
        (PaletteScheme::Warm, NoteKind::MicroDetail) => Color32::from_rgb(244, 222, 160),
        (PaletteScheme::Mono, NoteKind::Topic) => Color32::from_gray(210),
        (PaletteScheme::Mono, NoteKind::Subtopic) => Color32::from_gray(170),
        (PaletteScheme::Mono, NoteKind::Detail) => Color32::from_gray(135),
        (PaletteScheme::Mono, NoteKind::MicroDetail) => Color32::from_gray(105),
    };

    // Deeper nodes fade toward the background.
    dim_color(base, (1.0 - depth as f32 * 0.07).max(0.55))
}

pub fn stroke_width(selected: bool, pinned: bool) -> f32 {
    match (selected, pinned) {
        (true, _) => 2.2,
        (false, true) => 1.8,
        (false, false) => 1.0,
    }
}

pub fn font_size(kind: NoteKind) -> f32 {
    match kind {
        NoteKind::Topic => 13.0,
        NoteKind::Subtopic => 12.0,
        NoteKind::Detail | NoteKind::MicroDetail => 11.0,
    }
}

/// Label length limit in characters from the node's *screen* radius; a node that
/// is small on screen gets a short label no matter how large it is in world
/// space.
pub fn label_limit(screen_radius: f32) -> usize {
    if screen_radius < 5.0 {
        0
    } else if screen_radius < 10.0 {
        10
    } else if screen_radius < 20.0 {
        18
    } else {
        30
    }
}

pub fn truncate_label(title: &str, limit: usize) -> String {
    if limit == 0 {
        return String::new();
    }
    let count = title.chars().count();
    if count <= limit {
        return title.to_owned();
    }
    let mut text = title.chars().take(limit.saturating_sub(1)).collect::<String>();
    text.push('…');
    text
}

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        color.a(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_shrinks_with_depth_and_kind() {
        assert!(node_radius(NoteKind::Topic, 0) > node_radius(NoteKind::Subtopic, 0));
        assert!(node_radius(NoteKind::Detail, 0) > node_radius(NoteKind::Detail, 4));
        assert!(node_radius(NoteKind::MicroDetail, 30) >= 3.5);
    }

    #[test]
    fn selection_wins_over_scheme() {
        for scheme in PaletteScheme::ALL {
            assert_eq!(node_fill(NoteKind::Topic, 0, true, scheme), SELECTED_COLOR);
        }
    }

    #[test]
    fn label_truncation_follows_screen_radius() {
        assert_eq!(truncate_label("short", label_limit(25.0)), "short");
        assert_eq!(truncate_label("anything", label_limit(3.0)), "");

        let long = "a very long research note title";
        let truncated = truncate_label(long, label_limit(12.0));
        assert_eq!(truncated.chars().count(), 18);
        assert!(truncated.ends_with('…'));
    }
}
