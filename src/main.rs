mod app;
mod config;
mod geometry;
mod lens;
mod load;
mod mask;
mod preview;
mod strip;
mod zoom;

use std::path::{Path, PathBuf};

use app::LoupeApp;
use config::AppConfig;
use lens::{ImagePaths, Lens};

static IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"];

fn is_image(path: &Path) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
        return false;
    };
    IMAGE_EXTS.iter().any(|known| ext.eq_ignore_ascii_case(known))
}

fn scan_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(rd) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = rd
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    paths.sort();
    paths
}

/// Image files from the command line: explicit files, a directory to scan,
/// or the current directory when nothing is given.
fn collect_paths(args: &[String]) -> Vec<PathBuf> {
    match args {
        [] => scan_dir(Path::new(".")),
        [single] if Path::new(single).is_dir() => scan_dir(Path::new(single)),
        files => files
            .iter()
            .map(PathBuf::from)
            .filter(|p| is_image(p))
            .collect(),
    }
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let paths = collect_paths(&args);
    if paths.is_empty() {
        eprintln!("loupe: no images found; pass image files or a directory");
        std::process::exit(2);
    }

    let opts = config.lens.clone().unwrap_or_default();
    let lens = match Lens::new(opts, ImagePaths::single_set(paths)) {
        Ok(lens) => lens,
        Err(err) => {
            eprintln!("loupe: {err}");
            std::process::exit(2);
        }
    };

    let width = config.window_width.unwrap_or(1000.0);
    let height = config.window_height.unwrap_or(700.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Loupe")
            .with_app_id("loupe")
            .with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "loupe",
        native_options,
        Box::new(|cc| Ok(Box::new(LoupeApp::new(cc, config, lens)))),
    )
}
