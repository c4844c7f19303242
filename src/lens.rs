use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use egui::{Pos2, Rect, Vec2};

use crate::config::{LensMode, LensOptions};
use crate::load::ImageStore;
use crate::mask::MovableMask;
use crate::preview::PreviewPanel;
use crate::strip::{Switch, ThumbnailStrip};
use crate::zoom::MagnifiedView;

/// The widget's image list. `full` holds the high-resolution variants shown
/// in the magnified view; when absent the preview images serve both roles.
pub struct ImagePaths {
    pub preview: Vec<PathBuf>,
    pub full: Option<Vec<PathBuf>>,
}

impl ImagePaths {
    pub fn single_set(paths: Vec<PathBuf>) -> Self {
        Self {
            preview: paths,
            full: None,
        }
    }
}

/// The magnifier widget: preview panel, movable mask, magnified view and
/// thumbnail strip, coordinated through one per-frame pass.
pub struct Lens {
    opts: LensOptions,
    store: ImageStore,
    preview: PreviewPanel,
    mask: MovableMask,
    zoom: MagnifiedView,
    strip: ThumbnailStrip,
    /// Which image the mask's `inside`-mode size was derived from.
    mask_sized_for: Option<usize>,
    /// Which image the current magnified pan offset belongs to.
    pan_image: Option<usize>,
    warned_no_room: bool,
}

impl Lens {
    /// Fails fast on a missing or inconsistent image list; everything else
    /// degrades at render time instead.
    pub fn new(opts: LensOptions, paths: ImagePaths) -> Result<Self> {
        if paths.preview.is_empty() {
            bail!("image path list is empty");
        }
        if let Some(full) = &paths.full {
            if full.len() != paths.preview.len() {
                bail!(
                    "preview and full image lists differ in length ({} vs {})",
                    paths.preview.len(),
                    full.len()
                );
            }
        }

        let mut opts = opts.normalized();
        resolve_correlated(&mut opts);

        let count = paths.preview.len();
        let store = ImageStore::new(paths.preview, paths.full);
        let preview = PreviewPanel::new(opts.mmoc.clone(), count);
        let mut mask = MovableMask::new(&opts.mask);
        mask.center_in(&preview.frame());
        let mut zoom = MagnifiedView::new(opts.zoom.clone(), count);
        let mut strip = ThumbnailStrip::new(&opts, count);
        strip.layout(&preview.frame());
        if opts.mode != LensMode::Inside {
            zoom.place_seated(opts.zoom_seat, &preview.frame());
        }
        if opts.mode == LensMode::Drag {
            mask.set_visible(true);
            zoom.set_visible(true);
        }

        Ok(Self {
            opts,
            store,
            preview,
            mask,
            zoom,
            strip,
            mask_sized_for: None,
            pan_image: None,
            warned_no_room: false,
        })
    }

    pub fn checked(&self) -> usize {
        self.strip.checked()
    }

    /// Overall footprint of the widget in its own coordinate space.
    pub fn desired_size(&self) -> Vec2 {
        self.bounding().size()
    }

    fn bounding(&self) -> Rect {
        let frame = self.preview.frame();
        let mut bounds = Rect::from_min_size(frame.offset.to_pos2(), frame.outer);
        if self.opts.mode != LensMode::Inside {
            bounds = bounds.union(self.zoom.rect(Pos2::ZERO));
        }
        bounds.union(self.strip.rect(Pos2::ZERO))
    }

    /// Run one frame: resolve pending work, lay out, react to input, paint.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        self.store.start(&ctx);
        self.store.poll(&ctx);

        let avail = ui.available_size();
        if !(avail.x > 0.0 && avail.y > 0.0) {
            if !self.warned_no_room {
                tracing::warn!("no room to render the magnifier, skipping");
                self.warned_no_room = true;
            }
            return;
        }

        self.relayout();
        let bounds = self.bounding();
        let (rect, _) = ui.allocate_exact_size(bounds.size(), egui::Sense::hover());
        // Panels with negative offsets (top/left seats) are shifted into the
        // allocated rect.
        let origin = rect.min - bounds.min.to_vec2();

        // Sizes before positions, mask before zoom: geometry for the checked
        // image must be current before hit-testing against it.
        self.sync_checked_geometry(self.store.natural_size(self.strip.checked()));

        match self.opts.mode {
            LensMode::Normal | LensMode::Inside => self.handle_hover(&ctx, origin),
            LensMode::Drag => self.handle_mask_drag(ui, origin),
        }
        self.handle_strip(ui, origin);

        // A switch may have invalidated derived geometry; settle it within
        // the same tick so everything paints consistently.
        self.sync_checked_geometry(self.store.natural_size(self.strip.checked()));

        if let Some(interval) = self.strip.animate(Instant::now()) {
            ctx.request_repaint_after(interval);
        }
        if self.store.any_pending() {
            ctx.request_repaint_after(Duration::from_millis(500));
        }

        let checked = self.strip.checked();
        let painter = ui.painter();
        self.preview.paint(painter, origin, checked, &self.store);
        self.mask.paint(painter, origin, &self.opts);
        self.zoom.paint(painter, origin, checked, &self.store);
        self.strip.paint(painter, origin, &self.opts, &self.store);
    }

    /// Style-derived layout; cheap enough to refresh every frame.
    fn relayout(&mut self) {
        let frame = self.preview.frame();
        self.strip.layout(&frame);
        if self.opts.mode != LensMode::Inside {
            self.zoom.place_seated(self.opts.zoom_seat, &frame);
        }
    }

    /// Settle everything derived from the checked image's geometry, once its
    /// natural size is available. Idempotent; unresolved images leave the
    /// dependent state untouched until a later frame.
    fn sync_checked_geometry(&mut self, natural: Option<Vec2>) {
        let checked = self.strip.checked();
        let Some(geom) = self.preview.ensure_image(checked, natural) else {
            return;
        };

        if self.opts.mode == LensMode::Inside && self.mask_sized_for != Some(checked) {
            self.zoom.set_box_size(geom.size);
            self.zoom.place_over(&geom);
            self.mask
                .set_size(MovableMask::size_for_image(geom.size, self.opts.zoom_scale));
            self.mask.center_in(&self.preview.frame());
            self.zoom.invalidate_image(checked);
            self.mask_sized_for = Some(checked);
            self.pan_image = None;
        }

        if self.pan_image != Some(checked) {
            self.zoom
                .update_pan(checked, self.mask.offset(), self.mask.size(), &geom);
            self.pan_image = Some(checked);
        }
    }

    /// `normal`/`inside` interaction: the mask follows the pointer while it
    /// stays inside the checked image's movable bounds.
    fn handle_hover(&mut self, ctx: &egui::Context, origin: Pos2) {
        let checked = self.strip.checked();
        let Some(geom) = self.preview.image(checked) else {
            return;
        };
        let pointer = ctx
            .pointer_latest_pos()
            .map(|p| p - origin.to_vec2())
            .filter(|p| geom.bounds.contains(*p));

        if let Some(p) = pointer {
            self.mask.hover_to(p, &geom.bounds);
            self.zoom
                .update_pan(checked, self.mask.offset(), self.mask.size(), &geom);
            self.pan_image = Some(checked);
            if self.opts.mode == LensMode::Normal {
                self.mask.set_visible(true);
            }
            // In inside mode the view stays visible once shown and merely
            // stops updating while the pointer is away.
            self.zoom.set_visible(true);
            ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
        } else {
            self.mask.end_interaction();
            if self.opts.mode == LensMode::Normal {
                self.mask.set_visible(false);
                self.zoom.set_visible(false);
            }
        }
    }

    /// `drag` interaction: the mask moves by the press-time grab offset.
    fn handle_mask_drag(&mut self, ui: &mut egui::Ui, origin: Pos2) {
        let checked = self.strip.checked();
        let Some(geom) = self.preview.image(checked) else {
            return;
        };
        let resp = ui.interact(
            self.mask.rect(origin),
            ui.id().with("mask_drag"),
            egui::Sense::drag(),
        );
        if resp.drag_started() {
            if let Some(p) = resp.interact_pointer_pos() {
                self.mask.begin_drag(p - origin.to_vec2());
            }
        }
        if resp.dragged() {
            if let Some(p) = resp.interact_pointer_pos() {
                self.mask.drag_to(p - origin.to_vec2(), &geom.bounds);
                self.zoom
                    .update_pan(checked, self.mask.offset(), self.mask.size(), &geom);
                self.pan_image = Some(checked);
            }
            ui.ctx().set_cursor_icon(egui::CursorIcon::Move);
        } else if resp.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
        if resp.drag_stopped() {
            self.mask.end_interaction();
        }
    }

    fn handle_strip(&mut self, ui: &mut egui::Ui, origin: Pos2) {
        let rect = self.strip.rect(origin);
        if self.strip.scrollable() {
            let resp = ui.interact(rect, ui.id().with("strip_drag"), egui::Sense::drag());
            if resp.drag_started() {
                if let Some(p) = resp.interact_pointer_pos() {
                    self.strip.begin_drag(p - origin.to_vec2());
                }
            }
            if resp.dragged() {
                if let Some(p) = resp.interact_pointer_pos() {
                    self.strip.drag_move(p - origin.to_vec2());
                }
                ui.ctx().set_cursor_icon(egui::CursorIcon::Move);
            } else if resp.hovered() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            }
            if resp.drag_stopped() {
                self.strip.end_drag(Instant::now());
            }
        }

        if !self.strip.dragging() {
            let hover = ui.ctx().input(|i| i.pointer.hover_pos());
            if let Some(p) = hover {
                if rect.contains(p) {
                    if let Some(switch) = self.strip.hover(p - origin.to_vec2()) {
                        self.apply_switch(switch);
                    }
                }
            }
        }
    }

    /// The image-switch cascade: recenter the mask and invalidate the pan;
    /// size-dependent `inside` geometry re-derives in the following sync.
    fn apply_switch(&mut self, switch: Switch) {
        tracing::debug!(from = switch.from, to = switch.to, "image switch");
        self.mask.center_in(&self.preview.frame());
        self.pan_image = None;
    }
}

/// Resolve the mask/zoom size linkage. With `zoom_resize` the zoom box is
/// authoritative and the mask follows; otherwise the zoom follows the mask.
fn resolve_correlated(opts: &mut LensOptions) {
    if !opts.correlate {
        return;
    }
    let factor = opts.zoom_scale * 10.0;
    if opts.zoom_resize {
        opts.mask.width = opts.zoom.width / factor;
        opts.mask.height = opts.zoom.height / factor;
    } else {
        opts.zoom.width = opts.mask.width * factor;
        opts.zoom.height = opts.mask.height * factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Seat;
    use egui::{pos2, vec2};

    fn paths(n: usize) -> ImagePaths {
        ImagePaths::single_set((0..n).map(|i| PathBuf::from(format!("{i}.png"))).collect())
    }

    #[test]
    fn construction_requires_image_paths() {
        let err = Lens::new(LensOptions::default(), paths(0));
        assert!(err.is_err());
    }

    #[test]
    fn construction_rejects_mismatched_variant_lists() {
        let lists = ImagePaths {
            preview: vec![PathBuf::from("a.png"), PathBuf::from("b.png")],
            full: Some(vec![PathBuf::from("a_big.png")]),
        };
        assert!(Lens::new(LensOptions::default(), lists).is_err());
    }

    #[test]
    fn correlate_sizes_zoom_from_mask() {
        let mut opts = LensOptions {
            zoom_scale: 0.5,
            ..LensOptions::default()
        };
        resolve_correlated(&mut opts);
        assert_eq!(opts.zoom.size(), vec2(400.0, 400.0));
        assert_eq!(opts.mask.size(), vec2(80.0, 80.0));
    }

    #[test]
    fn correlate_sizes_mask_from_zoom_when_resizable() {
        let mut opts = LensOptions {
            zoom_scale: 0.5,
            zoom_resize: true,
            ..LensOptions::default()
        };
        opts.zoom.width = 450.0;
        opts.zoom.height = 300.0;
        resolve_correlated(&mut opts);
        assert_eq!(opts.mask.size(), vec2(90.0, 60.0));
    }

    #[test]
    fn footprint_covers_preview_zoom_and_strip() {
        let lens = Lens::new(
            LensOptions {
                zoom_scale: 0.5,
                ..LensOptions::default()
            },
            paths(3),
        )
        .expect("lens should build");
        // Preview 302x202, zoom 400x400 seated right, strip 302x80 below.
        assert_eq!(lens.desired_size(), vec2(702.0, 400.0));
    }

    #[test]
    fn footprint_accounts_for_left_seated_zoom() {
        let lens = Lens::new(
            LensOptions {
                zoom_scale: 0.5,
                zoom_seat: Seat::Left,
                ..LensOptions::default()
            },
            paths(3),
        )
        .expect("lens should build");
        // Zoom extends 400 to the left of the preview's 302.
        assert_eq!(lens.desired_size(), vec2(702.0, 400.0));
    }

    #[test]
    fn centered_mask_yields_centered_magnified_image() {
        let mut lens = Lens::new(
            LensOptions {
                zoom_scale: 0.5,
                ..LensOptions::default()
            },
            paths(3),
        )
        .expect("lens should build");

        // Natural size resolves; the mask is still at its centered rest
        // position, so the magnified image must sit centered as well.
        lens.sync_checked_geometry(Some(vec2(600.0, 400.0)));
        let magnified = vec2(1500.0, 1000.0);
        let zoom_box = vec2(400.0, 400.0);
        let expect = -(magnified - zoom_box) * 0.5;
        assert_eq!(lens.zoom.pan(), expect);
    }

    #[test]
    fn inside_mode_overlays_zoom_on_checked_image() {
        let mut lens = Lens::new(
            LensOptions {
                zoom_scale: 0.5,
                mode: LensMode::Inside,
                ..LensOptions::default()
            },
            paths(2),
        )
        .expect("lens should build");

        lens.sync_checked_geometry(Some(vec2(600.0, 400.0)));
        let geom = lens.preview.image(0).expect("geometry resolved");
        assert_eq!(lens.zoom.box_size(), geom.size);
        assert_eq!(lens.zoom.offset(), geom.bounds.min);
        // Mask derives from the on-screen image, not the style box.
        assert_eq!(lens.mask.size(), geom.size / 5.0);
    }

    #[test]
    fn geometry_stays_pending_without_natural_size() {
        let mut lens = Lens::new(LensOptions::default(), paths(2)).expect("lens should build");
        lens.sync_checked_geometry(None);
        assert!(lens.preview.image(0).is_none());
        assert_eq!(lens.pan_image, None);
    }

    #[test]
    fn switch_recenters_mask_and_rederives_pan() {
        let mut lens = Lens::new(
            LensOptions {
                zoom_scale: 0.5,
                ..LensOptions::default()
            },
            paths(5),
        )
        .expect("lens should build");
        lens.sync_checked_geometry(Some(vec2(600.0, 400.0)));

        // Move the mask off-center, then switch via a strip hover over the
        // second item (strip sits below the preview).
        let geom = lens.preview.image(0).expect("geometry resolved");
        lens.mask.hover_to(pos2(50.0, 50.0), &geom.bounds);
        let switch = lens.strip.hover(pos2(97.0, 242.0)).expect("switch fires");
        assert_eq!(switch, Switch { from: 0, to: 1 });
        lens.apply_switch(switch);
        lens.sync_checked_geometry(Some(vec2(600.0, 400.0)));

        assert_eq!(lens.checked(), 1);
        // Recentered mask on the preview panel's outer box.
        assert_eq!(lens.mask.offset(), pos2(111.0, 61.0));
        assert_eq!(lens.pan_image, Some(1));
    }
}
