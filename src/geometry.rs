use egui::{Pos2, Vec2, pos2};

use crate::config::Seat;

/// Clamp a ratio-style setting to [0, 1]. NaN passes through untouched.
pub fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Scale `natural` to fit inside `bounds` without exceeding either axis,
/// preserving aspect ratio.
pub fn aspect_fit(natural: Vec2, bounds: Vec2) -> Vec2 {
    let scale = (bounds.x / natural.x).min(bounds.y / natural.y);
    natural * scale
}

/// Offset that centers an `inner` box inside an `outer` box.
pub fn center_offset(outer: Vec2, inner: Vec2) -> Vec2 {
    (outer - inner) * 0.5
}

/// The rectangle a mask may legally occupy for one image, in widget
/// coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovableBounds {
    pub min: Pos2,
    pub max: Pos2,
}

impl MovableBounds {
    pub fn contains(&self, p: Pos2) -> bool {
        p.x >= self.min.x && p.y >= self.min.y && p.x <= self.max.x && p.y <= self.max.y
    }

    /// Clamp a raw offset so a box of `size` stays inside the bounds.
    ///
    /// Every movement path goes through here. The lower edge is applied
    /// first, so when the box is larger than the bounds the upper edge wins.
    pub fn clamp_offset(&self, raw: Pos2, size: Vec2) -> Pos2 {
        let x = raw.x.max(self.min.x).min(self.max.x - size.x);
        let y = raw.y.max(self.min.y).min(self.max.y - size.y);
        pos2(x, y)
    }
}

/// Outer frame of an already-laid-out panel: widget-local origin plus the
/// border/padding-inclusive size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelFrame {
    pub offset: Vec2,
    pub outer: Vec2,
}

/// Position a panel of `size` on one side of `anchor`, keeping the style's
/// own top/left (`gap`) as spacing on the seat axis and as a plain offset on
/// the other.
pub fn seat_offset(seat: Seat, gap: Vec2, size: Vec2, anchor: &PanelFrame) -> Pos2 {
    let (mut x, mut y) = (gap.x, gap.y);
    match seat {
        Seat::Top => y = -gap.y - size.y,
        Seat::Left => x = -gap.x - size.x,
        Seat::Right => x += anchor.outer.x,
        Seat::Bottom => y += anchor.outer.y,
    }
    pos2(x + anchor.offset.x, y + anchor.offset.y)
}
