use egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::config::{PanelStyle, Seat};
use crate::geometry::{MovableBounds, PanelFrame, seat_offset};
use crate::load::ImageStore;
use crate::preview::PreviewImage;

/// The large output panel. Its magnified image pans opposite the mask: the
/// mask's fractional position within the movable area maps, negated and
/// scaled, onto the magnified image's offset.
pub struct MagnifiedView {
    style: PanelStyle,
    box_size: Vec2,
    offset: Pos2,
    /// Per-image magnified size, cached once derived.
    images: Vec<Option<Vec2>>,
    /// Pan offset of the currently checked image, relative to the box origin.
    pan: Vec2,
    visible: bool,
}

impl MagnifiedView {
    pub fn new(style: PanelStyle, image_count: usize) -> Self {
        let box_size = style.size();
        Self {
            style,
            box_size,
            offset: pos2(0.0, 0.0),
            images: vec![None; image_count],
            pan: Vec2::ZERO,
            visible: false,
        }
    }

    pub fn box_size(&self) -> Vec2 {
        self.box_size
    }

    pub fn set_box_size(&mut self, size: Vec2) {
        self.box_size = size;
    }

    pub fn offset(&self) -> Pos2 {
        self.offset
    }

    pub fn rect(&self, origin: Pos2) -> Rect {
        Rect::from_min_size(origin + self.offset.to_vec2(), self.box_size)
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// `inside` mode anchoring: the box sits exactly over the checked
    /// preview image.
    pub fn place_over(&mut self, image: &PreviewImage) {
        self.offset = image.bounds.min;
    }

    /// External placement on the configured side of the preview panel.
    pub fn place_seated(&mut self, seat: Seat, anchor: &PanelFrame) {
        self.offset = seat_offset(seat, self.style.position(), self.box_size, anchor);
    }

    /// Magnified size for `index`, derived from the inverse mask-to-image
    /// ratio and cached. Recomputed after `invalidate` (image switch in
    /// `inside` mode, where the box itself changes).
    pub fn ensure_image_size(&mut self, index: usize, mask_size: Vec2, image_size: Vec2) -> Vec2 {
        if let Some(Some(size)) = self.images.get(index) {
            return *size;
        }
        let size = magnified_size(self.box_size, mask_size, image_size);
        if let Some(slot) = self.images.get_mut(index) {
            *slot = Some(size);
        }
        size
    }

    pub fn invalidate_image(&mut self, index: usize) {
        if let Some(slot) = self.images.get_mut(index) {
            *slot = None;
        }
    }

    /// Re-derive the pan offset from the mask position. Needs the checked
    /// image's movable bounds; callers skip when those are unresolved.
    pub fn update_pan(
        &mut self,
        index: usize,
        mask_offset: Pos2,
        mask_size: Vec2,
        image: &PreviewImage,
    ) {
        let magnified = self.ensure_image_size(index, mask_size, image.size);
        self.pan = pan_offset(mask_offset, &image.bounds, image.size, magnified);
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Paint the box border and the clipped magnified image.
    pub fn paint(&self, painter: &egui::Painter, origin: Pos2, checked: usize, store: &ImageStore) {
        if !self.visible {
            return;
        }
        let rect = self.rect(origin);
        if self.style.border > 0.0 {
            painter.rect_stroke(
                rect,
                0.0,
                egui::Stroke::new(self.style.border, self.style.stroke_color()),
                egui::StrokeKind::Outside,
            );
        }

        let Some(img) = store.full_image(checked) else {
            painter.rect_filled(rect, 0.0, egui::Color32::from_gray(40));
            return;
        };
        let Some(Some(size)) = self.images.get(checked) else {
            return;
        };
        let clipped = painter.with_clip_rect(rect);
        clipped.image(
            img.texture.id(),
            Rect::from_min_size(rect.min + self.pan, *size),
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }
}

/// `zoom_box / (mask / image)` per axis.
pub fn magnified_size(zoom_box: Vec2, mask: Vec2, image: Vec2) -> Vec2 {
    vec2(
        zoom_box.x / (mask.x / image.x),
        zoom_box.y / (mask.y / image.y),
    )
}

/// The lens transform: the mask's fractional travel across the image,
/// negated and scaled to the magnified size.
pub fn pan_offset(
    mask_offset: Pos2,
    bounds: &MovableBounds,
    image: Vec2,
    magnified: Vec2,
) -> Vec2 {
    let percent = (mask_offset - bounds.min) / image;
    -percent * magnified
}
