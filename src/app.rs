use crate::config::AppConfig;
use crate::lens::Lens;

/// eframe host: a single magnifier widget in the central panel.
pub struct LoupeApp {
    lens: Lens,
    config: AppConfig,
}

impl LoupeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig, lens: Lens) -> Self {
        Self { lens, config }
    }
}

impl eframe::App for LoupeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window size for saving on exit
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.add_space(16.0);
                    ui.horizontal(|ui| {
                        ui.add_space(16.0);
                        self.lens.show(ui);
                    });
                });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.save();
    }
}
