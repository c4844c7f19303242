use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use egui::TextureHandle;

/// Abandon an image that has not resolved within this window.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Downscale decoded pixels to this longest edge before uploading; geometry
/// always uses the image's original natural size.
const TEXTURE_MAX: u32 = 2048;

pub struct LoadedImage {
    pub texture: TextureHandle,
    /// Natural pixel size of the source file, before any downscale.
    pub natural: egui::Vec2,
}

pub enum SlotState {
    Pending { since: Instant },
    Ready(LoadedImage),
    Failed,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Variant {
    Preview,
    Full,
}

struct Decoded {
    variant: Variant,
    index: usize,
    /// `(rgba, tex_w, tex_h, natural_w, natural_h)`, or None on decode failure.
    pixels: Option<(Vec<u8>, usize, usize, u32, u32)>,
}

/// Holds every image of the widget across both path variants and resolves
/// them on background threads. Natural sizes become available to geometry
/// once the decode message is drained on the UI thread.
pub struct ImageStore {
    preview_paths: Vec<PathBuf>,
    full_paths: Option<Vec<PathBuf>>,
    preview: Vec<SlotState>,
    full: Vec<SlotState>,
    tx: mpsc::SyncSender<Decoded>,
    rx: mpsc::Receiver<Decoded>,
    started: bool,
}

impl ImageStore {
    pub fn new(preview_paths: Vec<PathBuf>, full_paths: Option<Vec<PathBuf>>) -> Self {
        let (tx, rx) = mpsc::sync_channel(64);
        Self {
            preview_paths,
            full_paths,
            preview: Vec::new(),
            full: Vec::new(),
            tx,
            rx,
            started: false,
        }
    }

    pub fn len(&self) -> usize {
        self.preview_paths.len()
    }

    /// Kick off one decode thread per image. Called on the first frame, when
    /// a repaint context is available.
    pub fn start(&mut self, ctx: &egui::Context) {
        if self.started {
            return;
        }
        self.started = true;

        let now = Instant::now();
        self.preview = spawn_variant(Variant::Preview, &self.preview_paths, &self.tx, ctx, now);
        if let Some(paths) = &self.full_paths {
            self.full = spawn_variant(Variant::Full, paths, &self.tx, ctx, now);
        }
    }

    /// Drain finished decodes and abandon overdue ones. Runs every frame
    /// before layout so dependent geometry sees fresh natural sizes.
    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.rx.try_recv() {
            let name = slot_name(msg.variant, msg.index);
            let state = match msg.pixels {
                Some((data, w, h, nw, nh)) => {
                    let img = egui::ColorImage::from_rgba_unmultiplied([w, h], &data);
                    let texture = ctx.load_texture(&name, img, egui::TextureOptions::LINEAR);
                    SlotState::Ready(LoadedImage {
                        texture,
                        natural: egui::vec2(nw as f32, nh as f32),
                    })
                }
                None => {
                    tracing::debug!(slot = %name, "image decode failed");
                    SlotState::Failed
                }
            };
            let slots = match msg.variant {
                Variant::Preview => &mut self.preview,
                Variant::Full => &mut self.full,
            };
            if let Some(slot) = slots.get_mut(msg.index) {
                *slot = state;
            }
        }

        let now = Instant::now();
        for (variant, slots) in [
            (Variant::Preview, &mut self.preview),
            (Variant::Full, &mut self.full),
        ] {
            for idx in sweep_overdue(slots, now, LOAD_TIMEOUT) {
                tracing::warn!(
                    slot = %slot_name(variant, idx),
                    "image did not resolve within {}s, giving up",
                    LOAD_TIMEOUT.as_secs()
                );
            }
        }
    }

    pub fn preview_image(&self, index: usize) -> Option<&LoadedImage> {
        ready(&self.preview, index)
    }

    /// The magnified-view texture: the `max` variant when configured,
    /// otherwise the preview image itself.
    pub fn full_image(&self, index: usize) -> Option<&LoadedImage> {
        if self.full_paths.is_some() {
            ready(&self.full, index)
        } else {
            ready(&self.preview, index)
        }
    }

    /// Natural size of the preview variant, once resolved. All preview-panel
    /// geometry keys off this.
    pub fn natural_size(&self, index: usize) -> Option<egui::Vec2> {
        self.preview_image(index).map(|img| img.natural)
    }

    /// True while any slot is still waiting on its decode.
    pub fn any_pending(&self) -> bool {
        self.preview
            .iter()
            .chain(self.full.iter())
            .any(|slot| matches!(slot, SlotState::Pending { .. }))
    }
}

fn ready(slots: &[SlotState], index: usize) -> Option<&LoadedImage> {
    match slots.get(index) {
        Some(SlotState::Ready(img)) => Some(img),
        _ => None,
    }
}

fn slot_name(variant: Variant, index: usize) -> String {
    match variant {
        Variant::Preview => format!("loupe_preview_{index}"),
        Variant::Full => format!("loupe_full_{index}"),
    }
}

fn spawn_variant(
    variant: Variant,
    paths: &[PathBuf],
    tx: &mpsc::SyncSender<Decoded>,
    ctx: &egui::Context,
    now: Instant,
) -> Vec<SlotState> {
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let path = path.clone();
            let tx = tx.clone();
            let ctx2 = ctx.clone();
            std::thread::spawn(move || {
                let pixels = decode(&path);
                let _ = tx.send(Decoded {
                    variant,
                    index,
                    pixels,
                });
                ctx2.request_repaint();
            });
            SlotState::Pending { since: now }
        })
        .collect()
}

fn decode(path: &PathBuf) -> Option<(Vec<u8>, usize, usize, u32, u32)> {
    let img = image::open(path).ok()?;
    let (nw, nh) = (img.width(), img.height());
    let img = if nw > TEXTURE_MAX || nh > TEXTURE_MAX {
        img.thumbnail(TEXTURE_MAX, TEXTURE_MAX)
    } else {
        img
    };
    let rgba = img.to_rgba8();
    let w = rgba.width() as usize;
    let h = rgba.height() as usize;
    Some((rgba.into_raw(), w, h, nw, nh))
}

/// Mark pending slots older than `timeout` as failed; returns their indices.
fn sweep_overdue(slots: &mut [SlotState], now: Instant, timeout: Duration) -> Vec<usize> {
    let mut overdue = Vec::new();
    for (idx, slot) in slots.iter_mut().enumerate() {
        if let SlotState::Pending { since } = slot {
            if now.duration_since(*since) > timeout {
                *slot = SlotState::Failed;
                overdue.push(idx);
            }
        }
    }
    overdue
}
