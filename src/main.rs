mod app;
mod config;
mod drag;
mod error;
mod geometry;
mod notice;
mod scheduler;
mod session;
mod targets;

#[cfg(test)]
mod tests;

use clap::Parser;
use config::{Args, Settings};
use display_info::DisplayInfo;
use eframe::egui;
use tracing_subscriber::EnvFilter;

const FALLBACK_WINDOW: [f32; 2] = [960.0, 720.0];

/// Two thirds of the primary display, or a fixed size if it can't be queried.
fn initial_window_size() -> [f32; 2] {
    let primary = DisplayInfo::all()
        .ok()
        .and_then(|displays| displays.into_iter().find(|d| d.is_primary));
    match primary {
        Some(d) if d.width > 0 && d.height > 0 => {
            let scale = if d.scale_factor > 0.0 { d.scale_factor } else { 1.0 };
            [d.width as f32 / scale * 2.0 / 3.0, d.height as f32 / scale * 2.0 / 3.0]
        }
        _ => FALLBACK_WINDOW,
    }
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from(&args);
    tracing::info!(?settings, "starting tap dispatcher");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(initial_window_size())
            .with_min_inner_size([480.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Tap Dispatcher",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(app::TapApp::new(cc, settings))
        }),
    )
}
