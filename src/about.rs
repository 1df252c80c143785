use anyhow::anyhow;
use eframe::egui::{self, ViewportBuilder};

/// The `/c` configure surface: a static about box with a single OK button.
/// There is nothing to configure from here; settings live in `config.toml`.
pub fn run_dialog() -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([360.0, 240.0])
            .with_resizable(false)
            .with_maximize_button(false)
            .with_minimize_button(false),
        ..Default::default()
    };

    eframe::run_native(
        "Album Art Screensaver",
        options,
        Box::new(|_cc| Ok(Box::new(AboutDialog))),
    )
    .map_err(|e| anyhow!("failed to open the configure dialog: {e}"))
}

struct AboutDialog;

impl eframe::App for AboutDialog {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(32.0);
                ui.heading("Album Art Screensaver");
                ui.add_space(12.0);
                ui.label(format!("v{}", env!("CARGO_PKG_VERSION")));
                ui.label("Bounces the playing track's cover around the screen.");
                ui.add_space(8.0);
                ui.label("Edit config.toml next to the executable to tune it.");
                ui.add_space(24.0);
                if ui.button("  OK  ").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }
}
