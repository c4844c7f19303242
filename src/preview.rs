use egui::{Pos2, Rect, Vec2, vec2};

use crate::config::PanelStyle;
use crate::geometry::{MovableBounds, PanelFrame, aspect_fit, center_offset};
use crate::load::ImageStore;

/// Resolved on-screen geometry of one preview image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewImage {
    pub size: Vec2,
    /// Offset of the image inside the panel, measured from the content-box
    /// origin (the panel border is already accounted for).
    pub offset: Vec2,
    /// Widget-local rectangle the mask may occupy for this image.
    pub bounds: MovableBounds,
}

/// The thumbnail panel. Owns per-image geometry, resolved lazily as natural
/// sizes arrive and cached for the lifetime of the image set.
pub struct PreviewPanel {
    style: PanelStyle,
    images: Vec<Option<PreviewImage>>,
}

impl PreviewPanel {
    pub fn new(style: PanelStyle, image_count: usize) -> Self {
        Self {
            style,
            images: vec![None; image_count],
        }
    }

    /// Declared content box the images are fitted into.
    pub fn content(&self) -> Vec2 {
        self.style.size()
    }

    pub fn border(&self) -> f32 {
        self.style.border
    }

    /// Outer frame: position plus border/padding-inclusive size.
    pub fn frame(&self) -> PanelFrame {
        let trim = (self.style.border + self.style.padding) * 2.0;
        PanelFrame {
            offset: self.style.position(),
            outer: self.style.size() + vec2(trim, trim),
        }
    }

    /// Geometry for `index`, computing and caching it when the image's
    /// natural size has become available. Returns None while unresolved.
    pub fn ensure_image(&mut self, index: usize, natural: Option<Vec2>) -> Option<PreviewImage> {
        if let Some(Some(img)) = self.images.get(index) {
            return Some(*img);
        }
        let natural = natural?;
        let frame = self.frame();
        let border = self.style.border;

        let size = aspect_fit(natural, self.content());
        let offset = center_offset(frame.outer, size) - vec2(border, border);
        let min = (frame.offset + vec2(border, border) + offset).to_pos2();
        let img = PreviewImage {
            size,
            offset,
            bounds: MovableBounds {
                min,
                max: min + size,
            },
        };
        if let Some(slot) = self.images.get_mut(index) {
            *slot = Some(img);
        }
        Some(img)
    }

    /// Already-resolved geometry, if any. Callers that cannot make progress
    /// without it simply retry on a later frame.
    pub fn image(&self, index: usize) -> Option<PreviewImage> {
        self.images.get(index).copied().flatten()
    }

    /// Paint the panel frame and the checked image (or a loading placeholder).
    pub fn paint(&self, painter: &egui::Painter, origin: Pos2, checked: usize, store: &ImageStore) {
        let frame = self.frame();
        let outer = Rect::from_min_size(origin + frame.offset, frame.outer);
        if self.style.border > 0.0 {
            painter.rect_stroke(
                outer,
                0.0,
                egui::Stroke::new(self.style.border, self.style.stroke_color()),
                egui::StrokeKind::Inside,
            );
        }

        let border = vec2(self.style.border, self.style.border);
        match (self.image(checked), store.preview_image(checked)) {
            (Some(geom), Some(img)) => {
                let rect =
                    Rect::from_min_size(outer.min + border + geom.offset, geom.size);
                painter.image(
                    img.texture.id(),
                    rect,
                    Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            _ => {
                let inner = outer.shrink(self.style.border);
                painter.rect_filled(inner, 0.0, egui::Color32::from_gray(40));
                painter.text(
                    inner.center(),
                    egui::Align2::CENTER_CENTER,
                    "…",
                    egui::FontId::proportional(22.0),
                    egui::Color32::GRAY,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelStyle;
    use egui::pos2;

    fn panel() -> PreviewPanel {
        let style = PanelStyle {
            width: 300.0,
            height: 200.0,
            border: 1.0,
            ..PanelStyle::default()
        };
        PreviewPanel::new(style, 3)
    }

    #[test]
    fn frame_includes_border_and_padding_on_both_sides() {
        let mut style = PanelStyle {
            width: 300.0,
            height: 200.0,
            border: 2.0,
            padding: 3.0,
            ..PanelStyle::default()
        };
        style.top = 10.0;
        let frame = PreviewPanel::new(style, 1).frame();
        assert_eq!(frame.outer, vec2(310.0, 210.0));
        assert_eq!(frame.offset, vec2(0.0, 10.0));
    }

    #[test]
    fn image_geometry_pending_until_natural_size_known() {
        let mut panel = panel();
        assert!(panel.ensure_image(0, None).is_none());
        assert!(panel.image(0).is_none());
        assert!(panel.ensure_image(0, Some(vec2(600.0, 400.0))).is_some());
        assert!(panel.image(0).is_some());
    }

    #[test]
    fn exact_fit_image_fills_content_box() {
        let mut panel = panel();
        let img = panel.ensure_image(0, Some(vec2(600.0, 400.0))).unwrap();
        assert_eq!(img.size, vec2(300.0, 200.0));
        assert_eq!(img.offset, vec2(0.0, 0.0));
        assert_eq!(img.bounds.min, pos2(1.0, 1.0));
        assert_eq!(img.bounds.max, pos2(301.0, 201.0));
    }

    #[test]
    fn narrow_image_is_centered_horizontally() {
        let mut panel = panel();
        let img = panel.ensure_image(1, Some(vec2(400.0, 400.0))).unwrap();
        assert_eq!(img.size, vec2(200.0, 200.0));
        assert_eq!(img.offset, vec2(50.0, 0.0));
        assert_eq!(img.bounds.min, pos2(51.0, 1.0));
        assert_eq!(img.bounds.max, pos2(251.0, 201.0));
    }

    #[test]
    fn geometry_is_cached_after_first_resolution() {
        let mut panel = panel();
        let first = panel.ensure_image(0, Some(vec2(600.0, 400.0))).unwrap();
        // Later natural sizes are ignored once cached.
        let second = panel.ensure_image(0, Some(vec2(100.0, 100.0))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn bounds_are_offset_by_panel_position() {
        let style = PanelStyle {
            width: 300.0,
            height: 200.0,
            border: 1.0,
            left: 20.0,
            top: 30.0,
            ..PanelStyle::default()
        };
        let mut panel = PreviewPanel::new(style, 1);
        let img = panel.ensure_image(0, Some(vec2(600.0, 400.0))).unwrap();
        assert_eq!(img.bounds.min, pos2(21.0, 31.0));
    }
}
