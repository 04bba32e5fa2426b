use std::path::Path;

use eframe::egui;

use crate::config::DashboardConfig;
use crate::data::loader::{FileFormat, load_file};
use crate::state::{Action, AppState};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyDashApp {
    pub state: AppState,
}

impl RustyDashApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// Start with a file already loaded (path given on the command line).
    pub fn with_file(config: DashboardConfig, path: &Path) -> Self {
        let mut app = Self::new(config);
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if let Some(format) = FileFormat::from_extension(ext) {
            app.state.dispatch(Action::SelectFormat(format));
        }
        match load_file(path) {
            Ok(table) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                log::info!("Loaded {} rows from {}", table.len(), path.display());
                app.state.set_table(name, table);
            }
            Err(e) => {
                app.state
                    .dispatch(Action::ReportError(format!("{}: {e:#}", path.display())));
            }
        }
        app
    }
}

impl eframe::App for RustyDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions: Vec<Action> = Vec::new();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state, &mut actions);
        });

        // ---- Left side panel: controls ----
        egui::SidePanel::left("control_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state, &mut actions);
            });

        // ---- Central panel: tables and chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::central_panel(ui, &self.state);
        });

        // Apply after layout so this frame rendered one consistent state.
        if !actions.is_empty() {
            for action in actions {
                self.state.dispatch(action);
            }
            ctx.request_repaint();
        }
    }
}
