use std::time::{Duration, Instant};

use egui::{Pos2, Rect, Vec2, vec2};

use crate::config::{LensOptions, PanelStyle, Seat, StripTuning};
use crate::geometry::{PanelFrame, seat_offset};
use crate::load::ImageStore;

/// Attenuation applied to drag movement once the track is past either end.
const RUBBER_FACTOR: f32 = 0.1;

/// A switch of the checked image, reported exactly once per transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Switch {
    pub from: usize,
    pub to: usize,
}

#[derive(Clone, Copy)]
struct StripDrag {
    /// Pointer coordinate along the scroll axis at the previous move.
    last: f32,
    /// Trailing move delta, consumed by inertia on release.
    delta: f32,
}

enum StripAnim {
    Idle,
    Inertia { delta: f32, last_tick: Instant },
    Adsorb { correction: f32, last_tick: Instant },
}

/// The selectable thumbnail strip. Owns the checked index and the scroll
/// state; image switching is hover-driven and reported to the coordinator.
pub struct ThumbnailStrip {
    style: PanelStyle,
    seat: Seat,
    gap: f32,
    tuning: StripTuning,
    inertia_tick: Duration,
    adsorb_tick: Duration,
    count: usize,
    size: Vec2,
    offset: Pos2,
    checked: usize,
    scroll: f32,
    drag: Option<StripDrag>,
    anim: StripAnim,
}

impl ThumbnailStrip {
    pub fn new(opts: &LensOptions, count: usize) -> Self {
        Self {
            style: opts.pics.clone(),
            seat: opts.pics_seat,
            gap: opts.img_gap,
            tuning: opts.tuning,
            inertia_tick: Duration::from_millis((opts.pics_speed * 100.0) as u64),
            adsorb_tick: Duration::from_millis((opts.adsorb_speed * 100.0) as u64),
            count,
            size: Vec2::ZERO,
            offset: Pos2::ZERO,
            checked: 0,
            scroll: 0.0,
            drag: None,
            anim: StripAnim::Idle,
        }
    }

    /// Size pass, then position pass, against the preview panel's frame.
    pub fn layout(&mut self, anchor: &PanelFrame) {
        self.size = resolve_size(&self.style, self.seat, anchor.outer);
        self.offset = seat_offset(self.seat, self.style.position(), self.size, anchor);
    }

    pub fn rect(&self, origin: Pos2) -> Rect {
        Rect::from_min_size(origin + self.offset.to_vec2(), self.size)
    }

    pub fn checked(&self) -> usize {
        self.checked
    }

    pub fn item_size(&self) -> f32 {
        self.size.x.min(self.size.y)
    }

    fn main_len(&self) -> f32 {
        self.size.x.max(self.size.y)
    }

    fn track_len(&self) -> f32 {
        track_length(self.count, self.item_size(), self.gap)
    }

    fn min_edge(&self) -> f32 {
        min_edge(self.count, self.item_size(), self.gap, self.main_len())
    }

    /// Drag handlers are only worth installing when the track overflows the
    /// visible length.
    pub fn scrollable(&self) -> bool {
        self.track_len() > self.main_len()
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    fn axis(&self, p: Pos2) -> f32 {
        if self.seat.is_vertical() { p.y } else { p.x }
    }

    /// Hover-based selection. Returns the transition when the pointer lands
    /// on a different item; the gap between items never selects.
    pub fn hover(&mut self, pointer: Pos2) -> Option<Switch> {
        if self.drag.is_some() {
            return None;
        }
        let along = self.axis(pointer) - self.axis(self.offset) - self.scroll;
        let index = hover_index(along, self.item_size(), self.gap, self.count);
        if index < 0 || index as usize == self.checked {
            return None;
        }
        let switch = Switch {
            from: self.checked,
            to: index as usize,
        };
        self.checked = switch.to;
        Some(switch)
    }

    /// Press: remember the pointer and cancel any running animation so a new
    /// gesture never fights the previous one.
    pub fn begin_drag(&mut self, pointer: Pos2) {
        self.anim = StripAnim::Idle;
        self.drag = Some(StripDrag {
            last: self.axis(pointer),
            delta: 0.0,
        });
    }

    pub fn drag_move(&mut self, pointer: Pos2) {
        let along = self.axis(pointer);
        let min = self.min_edge();
        let scroll = self.scroll;
        let Some(drag) = &mut self.drag else { return };
        let delta = along - drag.last;
        drag.last = along;
        let (next, stored) = rubber_step(scroll, delta, min, RUBBER_FACTOR);
        drag.delta = stored;
        self.scroll = next;
    }

    /// Release: hand the trailing delta to the inertia animation.
    pub fn end_drag(&mut self, now: Instant) {
        if let Some(drag) = self.drag.take() {
            self.anim = StripAnim::Inertia {
                delta: drag.delta,
                last_tick: now,
            };
        }
    }

    pub fn dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Advance the inertia/adsorption animation. Returns the tick interval
    /// to schedule the next repaint for, or None when at rest.
    pub fn animate(&mut self, now: Instant) -> Option<Duration> {
        match std::mem::replace(&mut self.anim, StripAnim::Idle) {
            StripAnim::Idle => None,
            StripAnim::Inertia {
                mut delta,
                mut last_tick,
            } => {
                if !tick_due(&mut last_tick, self.inertia_tick, now) {
                    self.anim = StripAnim::Inertia { delta, last_tick };
                    return Some(self.inertia_tick);
                }
                delta *= self.tuning.inertia_decay;
                if delta.abs() < self.tuning.inertia_rest {
                    // Easing is over; check whether we stopped out of bounds.
                    match adsorb_correction(self.scroll, self.min_edge()) {
                        Some(correction) => {
                            self.anim = StripAnim::Adsorb {
                                correction,
                                last_tick,
                            };
                            Some(self.adsorb_tick)
                        }
                        None => None,
                    }
                } else {
                    let (scroll, stored) =
                        rubber_step(self.scroll, delta, self.min_edge(), RUBBER_FACTOR);
                    self.scroll = scroll;
                    self.anim = StripAnim::Inertia {
                        delta: stored,
                        last_tick,
                    };
                    Some(self.inertia_tick)
                }
            }
            StripAnim::Adsorb {
                mut correction,
                mut last_tick,
            } => {
                if !tick_due(&mut last_tick, self.adsorb_tick, now) {
                    self.anim = StripAnim::Adsorb {
                        correction,
                        last_tick,
                    };
                    return Some(self.adsorb_tick);
                }
                correction *= self.tuning.adsorb_decay;
                self.scroll -= correction.round();
                if correction.abs() < self.tuning.adsorb_rest {
                    None
                } else {
                    self.anim = StripAnim::Adsorb {
                        correction,
                        last_tick,
                    };
                    Some(self.adsorb_tick)
                }
            }
        }
    }

    /// Paint the items, clipped to the panel, with the checked item framed.
    pub fn paint(&self, painter: &egui::Painter, origin: Pos2, opts: &LensOptions, store: &ImageStore) {
        let rect = self.rect(origin);
        let clipped = painter.with_clip_rect(rect);
        let item = self.item_size();
        let border = opts.img_border.width;

        for index in 0..self.count {
            let along = self.scroll + index as f32 * (item + self.gap);
            if along + item < 0.0 || along > self.main_len() {
                continue;
            }
            let min = if self.seat.is_vertical() {
                rect.min + vec2(0.0, along)
            } else {
                rect.min + vec2(along, 0.0)
            };
            let cell = Rect::from_min_size(min, vec2(item, item));

            let img_rect = if index == self.checked {
                clipped.rect_stroke(
                    cell,
                    0.0,
                    egui::Stroke::new(border, opts.border_fill()),
                    egui::StrokeKind::Inside,
                );
                cell.shrink(border)
            } else {
                cell
            };

            match store.preview_image(index) {
                Some(img) => clipped.image(
                    img.texture.id(),
                    img_rect,
                    Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                ),
                None => clipped.rect_filled(img_rect, 0.0, egui::Color32::from_gray(40)),
            };
        }
    }
}

/// Strip panel size: a zero style dimension falls back to 80 on the cross
/// axis and the preview panel's extent on the main axis.
pub fn resolve_size(style: &PanelStyle, seat: Seat, anchor_outer: Vec2) -> Vec2 {
    let pick = |styled: f32, fallback: f32| if styled > 0.0 { styled } else { fallback };
    if seat.is_vertical() {
        vec2(pick(style.width, 80.0), pick(style.height, anchor_outer.y))
    } else {
        vec2(pick(style.width, anchor_outer.x), pick(style.height, 80.0))
    }
}

pub fn track_length(count: usize, item: f32, gap: f32) -> f32 {
    count as f32 * (item + gap) - gap
}

/// Lowest legal scroll offset (scroll is 0 at the start, negative further
/// along the track).
pub fn min_edge(count: usize, item: f32, gap: f32, visible: f32) -> f32 {
    -(track_length(count, item, gap) - visible)
}

/// Map a pointer coordinate within the track to an item index, or -1 when it
/// falls in the gap between items or outside the track.
pub fn hover_index(along: f32, item: f32, gap: f32, count: usize) -> i32 {
    if along < 0.0 {
        return -1;
    }
    let result = along / item / ((item + gap) / item);
    let index = result as i32;
    if result > item / (item + gap) + index as f32 || index as usize >= count {
        return -1;
    }
    index
}

/// One drag step: move the track by `delta`, attenuated once past either
/// end. Returns the new scroll and the delta to carry into inertia (reset to
/// zero while out of bounds).
pub fn rubber_step(scroll: f32, delta: f32, min: f32, factor: f32) -> (f32, f32) {
    if scroll > 0.0 || scroll < min {
        (scroll + delta * factor, 0.0)
    } else {
        (scroll + delta, delta)
    }
}

/// Correction needed to bring an out-of-bounds rest position back inside, or
/// None when the track is already legal.
pub fn adsorb_correction(scroll: f32, min: f32) -> Option<f32> {
    if scroll < min {
        Some(scroll - min)
    } else if scroll > 0.0 {
        Some(scroll)
    } else {
        None
    }
}

fn tick_due(last: &mut Instant, interval: Duration, now: Instant) -> bool {
    if now.duration_since(*last) >= interval {
        *last = now;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn strip(count: usize) -> ThumbnailStrip {
        let opts = LensOptions::default();
        let mut strip = ThumbnailStrip::new(&opts, count);
        strip.layout(&PanelFrame {
            offset: vec2(0.0, 0.0),
            outer: vec2(302.0, 202.0),
        });
        strip
    }

    #[test]
    fn resolve_size_falls_back_per_seat() {
        let unset = PanelStyle::default();
        assert_eq!(
            resolve_size(&unset, Seat::Bottom, vec2(302.0, 202.0)),
            vec2(302.0, 80.0)
        );
        assert_eq!(
            resolve_size(&unset, Seat::Left, vec2(302.0, 202.0)),
            vec2(80.0, 202.0)
        );
        let styled = PanelStyle {
            width: 400.0,
            height: 60.0,
            ..PanelStyle::default()
        };
        assert_eq!(
            resolve_size(&styled, Seat::Bottom, vec2(302.0, 202.0)),
            vec2(400.0, 60.0)
        );
    }

    #[test]
    fn track_and_min_edge_account_for_gaps() {
        // 5 items of 80 with 10 gaps: 5*90 - 10 = 440.
        assert_eq!(track_length(5, 80.0, 10.0), 440.0);
        assert_eq!(min_edge(5, 80.0, 10.0, 302.0), -138.0);
    }

    #[test]
    fn hover_index_finds_items_and_rejects_gaps() {
        // Items at [0,80], [90,170], [180,260], ...
        assert_eq!(hover_index(40.0, 80.0, 10.0, 5), 0);
        assert_eq!(hover_index(97.0, 80.0, 10.0, 5), 1);
        assert_eq!(hover_index(85.0, 80.0, 10.0, 5), -1);
        assert_eq!(hover_index(175.0, 80.0, 10.0, 5), -1);
        assert_eq!(hover_index(181.0, 80.0, 10.0, 5), 2);
    }

    #[test]
    fn hover_index_rejects_outside_the_track() {
        assert_eq!(hover_index(-5.0, 80.0, 10.0, 5), -1);
        // Beyond the last item.
        assert_eq!(hover_index(460.0, 80.0, 10.0, 5), -1);
    }

    #[test]
    fn hover_fires_once_per_transition() {
        let mut strip = strip(5);
        // Strip sits at y=202 (bottom seat), items along x.
        let over_item_1 = pos2(97.0, 242.0);
        assert_eq!(
            strip.hover(over_item_1),
            Some(Switch { from: 0, to: 1 })
        );
        // Same item again: no event.
        assert_eq!(strip.hover(over_item_1), None);
        // Gap: no event, selection unchanged.
        assert_eq!(strip.hover(pos2(85.0, 242.0)), None);
        assert_eq!(strip.checked(), 1);
    }

    #[test]
    fn hover_accounts_for_scroll_offset() {
        let mut strip = strip(8);
        strip.begin_drag(pos2(100.0, 242.0));
        strip.drag_move(pos2(10.0, 242.0));
        strip.end_drag(Instant::now());
        assert_eq!(strip.scroll(), -90.0);
        // Pointer at track start now lands on item 1.
        assert_eq!(
            strip.hover(pos2(40.0, 242.0)),
            Some(Switch { from: 0, to: 1 })
        );
    }

    #[test]
    fn rubber_step_attenuates_and_resets_delta_out_of_bounds() {
        assert_eq!(rubber_step(-20.0, -15.0, -138.0, 0.1), (-35.0, -15.0));
        // Past the start: movement damped, trailing delta zeroed.
        assert_eq!(rubber_step(5.0, 30.0, -138.0, 0.1), (8.0, 0.0));
        assert_eq!(rubber_step(-140.0, -10.0, -138.0, 0.1), (-141.0, 0.0));
    }

    #[test]
    fn adsorb_correction_detects_both_edges() {
        assert_eq!(adsorb_correction(-20.0, -138.0), None);
        assert_eq!(adsorb_correction(0.0, -138.0), None);
        assert_eq!(adsorb_correction(12.0, -138.0), Some(12.0));
        assert_eq!(adsorb_correction(-150.0, -138.0), Some(-12.0));
    }

    #[test]
    fn scrollable_only_when_track_overflows() {
        assert!(!strip(3).scrollable());
        assert!(strip(8).scrollable());
    }

    #[test]
    fn inertia_decays_then_adsorbs_back_into_bounds() {
        let mut strip = strip(8);
        // min_edge = -(8*90 - 10 - 302) = -408.
        let mut now = Instant::now();
        strip.begin_drag(pos2(300.0, 242.0));
        strip.drag_move(pos2(280.0, 242.0));
        strip.end_drag(now);

        let min = strip.min_edge();
        for _ in 0..200 {
            now += Duration::from_millis(25);
            if strip.animate(now).is_none() {
                break;
            }
        }
        assert!(matches!(strip.anim, StripAnim::Idle));
        assert!(
            strip.scroll() >= min - 1e-3 && strip.scroll() <= 1e-3,
            "rest offset {} outside [{min}, 0]",
            strip.scroll()
        );
    }

    #[test]
    fn adsorption_returns_overscrolled_track_to_edge() {
        let mut strip = strip(8);
        strip.scroll = 10.0;
        strip.anim = StripAnim::Adsorb {
            correction: 10.0,
            last_tick: Instant::now(),
        };
        let mut now = Instant::now();
        for _ in 0..100 {
            now += Duration::from_millis(25);
            if strip.animate(now).is_none() {
                break;
            }
        }
        assert!(
            strip.scroll().abs() <= 0.5,
            "residual overscroll {}",
            strip.scroll()
        );
    }

    #[test]
    fn new_press_cancels_running_animation() {
        let mut strip = strip(8);
        strip.anim = StripAnim::Inertia {
            delta: 40.0,
            last_tick: Instant::now(),
        };
        strip.begin_drag(pos2(100.0, 242.0));
        assert!(matches!(strip.anim, StripAnim::Idle));
        assert!(strip.dragging());
    }
}
