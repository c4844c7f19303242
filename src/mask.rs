use egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::config::{LensOptions, PanelStyle};
use crate::geometry::{MovableBounds, PanelFrame, center_offset};

/// Interaction phase of the mask.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaskPhase {
    Idle,
    Hovering,
    Dragging {
        /// Pointer position relative to the mask origin at press time.
        grab: Vec2,
    },
}

/// The selector overlay the user moves across the preview image. Every
/// movement path funnels through the current image's movable bounds.
pub struct MovableMask {
    size: Vec2,
    offset: Pos2,
    phase: MaskPhase,
    visible: bool,
}

impl MovableMask {
    pub fn new(style: &PanelStyle) -> Self {
        Self {
            size: style.size(),
            offset: pos2(0.0, 0.0),
            phase: MaskPhase::Idle,
            visible: false,
        }
    }

    /// Mask size derived from the on-screen image, used in `inside` mode.
    pub fn size_for_image(image: Vec2, zoom_scale: f32) -> Vec2 {
        image / (zoom_scale * 10.0)
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn offset(&self) -> Pos2 {
        self.offset
    }

    pub fn rect(&self, origin: Pos2) -> Rect {
        Rect::from_min_size(origin + self.offset.to_vec2(), self.size)
    }

    pub fn phase(&self) -> MaskPhase {
        self.phase
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Rest position: centered on the preview panel's outer box. Not
    /// clamped; the next movement is.
    pub fn center_in(&mut self, frame: &PanelFrame) {
        self.offset = (frame.offset + center_offset(frame.outer, self.size)).to_pos2();
    }

    /// Hover-tracking movement: the mask centers on the pointer.
    pub fn hover_to(&mut self, pointer: Pos2, bounds: &MovableBounds) {
        self.phase = MaskPhase::Hovering;
        self.offset = bounds.clamp_offset(pointer - self.size * 0.5, self.size);
    }

    pub fn begin_drag(&mut self, pointer: Pos2) {
        self.phase = MaskPhase::Dragging {
            grab: pointer - self.offset,
        };
    }

    /// Drag movement: the mask keeps its press-time offset under the pointer.
    pub fn drag_to(&mut self, pointer: Pos2, bounds: &MovableBounds) {
        if let MaskPhase::Dragging { grab } = self.phase {
            self.offset = bounds.clamp_offset(pointer - grab, self.size);
        }
    }

    pub fn end_interaction(&mut self) {
        self.phase = MaskPhase::Idle;
    }

    /// Paint the dot grid over the mask area.
    pub fn paint(&self, painter: &egui::Painter, origin: Pos2, opts: &LensOptions) {
        if !self.visible {
            return;
        }
        let rect = self.rect(origin);
        let grid = dot_grid(self.size, opts.dot_gap, opts.dot_size);
        let fill = opts.dot_fill();
        for i in 0..grid.loops[0] {
            for j in 0..grid.loops[1] {
                let min = rect.min + vec2(i as f32 * grid.step.x, j as f32 * grid.step.y);
                painter.rect_filled(Rect::from_min_size(min, grid.cell), 0.0, fill);
            }
        }
    }
}

/// Cell layout of the mask's dot pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DotGrid {
    pub loops: [usize; 2],
    pub cell: Vec2,
    pub step: Vec2,
}

/// Tile `cell`-sized dots across `extent` with roughly `gap` between them.
/// The step is stretched so the last cell lands flush on the far edge,
/// absorbing the rounding remainder.
pub fn dot_grid(extent: Vec2, gap: f32, cell: [f32; 2]) -> DotGrid {
    let cell = Vec2::from(cell);
    let count = |len: f32, cell: f32| ((len / (gap + cell)).round() as usize).max(1);
    let loops = [count(extent.x, cell.x), count(extent.y, cell.y)];
    let stretch = |len: f32, cell: f32, n: usize| {
        if n > 1 {
            cell + (len - n as f32 * cell) / (n as f32 - 1.0)
        } else {
            0.0
        }
    };
    DotGrid {
        loops,
        cell,
        step: vec2(
            stretch(extent.x, cell.x, loops[0]),
            stretch(extent.y, cell.y, loops[1]),
        ),
    }
}
