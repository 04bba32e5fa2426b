use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::chart::{ChartKind, axis_options};
use crate::data::export::ExportFormat;
use crate::data::filter::Predicate;
use crate::data::loader::FileFormat;
use crate::state::{Action, AppState, FilterControl};
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Left side panel – controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &AppState, actions: &mut Vec<Action>) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Select Analysis Type");
            for format in FileFormat::ALL {
                if ui.radio(state.format == format, format.to_string()).clicked() {
                    actions.push(Action::SelectFormat(format));
                }
            }
            if ui.button(format!("Upload your {}…", state.format)).clicked() {
                actions.extend(open_file_dialog(state.format));
            }
            ui.separator();

            let Some(data) = &state.table else {
                ui.label("No dataset loaded.");
                return;
            };

            let mut show = state.show_summary;
            if ui.checkbox(&mut show, "Show Statistics summary").changed() {
                actions.push(Action::ShowSummary(show));
            }
            ui.separator();

            filter_controls(ui, state, &data.column_names(), actions);
            ui.separator();

            chart_controls(ui, state, actions);
            ui.separator();

            download_controls(ui, state, actions);
        });
}

fn combo(
    ui: &mut Ui,
    id: &str,
    label: &str,
    current: Option<&str>,
    options: &[String],
) -> Option<String> {
    let mut picked = None;
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.unwrap_or("—"))
        .show_ui(ui, |ui: &mut Ui| {
            for opt in options {
                if ui.selectable_label(current == Some(opt.as_str()), opt).clicked() {
                    picked = Some(opt.clone());
                }
            }
        });
    picked.filter(|p| current != Some(p.as_str()))
}

fn filter_controls(ui: &mut Ui, state: &AppState, columns: &[String], actions: &mut Vec<Action>) {
    ui.heading("Filter Options");
    if let Some(col) = combo(
        ui,
        "filter_column",
        "Select column(s) to filter",
        state.filter_column.as_deref(),
        columns,
    ) {
        actions.push(Action::SelectFilterColumn(col));
    }

    match &state.filter_control {
        FilterControl::Unavailable => {
            ui.label(RichText::new("Column has no values to filter on.").italics());
        }
        FilterControl::Category { options } => {
            let current = match state.filter.as_ref().map(|f| &f.predicate) {
                Some(Predicate::Equals(v)) => Some(v),
                _ => None,
            };
            ui.label("Select value to filter");
            egui::ComboBox::from_id_salt("filter_value")
                .selected_text(current.map(|v| v.to_string()).unwrap_or_default())
                .show_ui(ui, |ui: &mut Ui| {
                    for opt in options {
                        if ui
                            .selectable_label(current == Some(opt), opt.to_string())
                            .clicked()
                            && current != Some(opt)
                        {
                            actions.push(Action::SelectFilterValue(opt.clone()));
                        }
                    }
                });
        }
        FilterControl::Range { lo, hi } => {
            let (mut min, mut max) = match state.filter.as_ref().map(|f| &f.predicate) {
                Some(Predicate::Range { min, max }) => (*min, *max),
                _ => (*lo, *hi),
            };
            ui.label("Select range");
            let changed_min = ui
                .add(egui::Slider::new(&mut min, *lo..=*hi).text("min"))
                .changed();
            let changed_max = ui
                .add(egui::Slider::new(&mut max, *lo..=*hi).text("max"))
                .changed();
            if changed_min || changed_max {
                actions.push(Action::SetFilterRange { min, max });
            }
        }
    }
}

fn chart_controls(ui: &mut Ui, state: &AppState, actions: &mut Vec<Action>) {
    ui.heading("Plot Columns");
    let spec = &state.chart_spec;

    ui.label("Select chart type");
    egui::ComboBox::from_id_salt("chart_kind")
        .selected_text(spec.kind.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ChartKind::ALL {
                if ui.selectable_label(spec.kind == kind, kind.to_string()).clicked()
                    && spec.kind != kind
                {
                    actions.push(Action::SelectChartKind(kind));
                }
            }
        });

    let Some(filtered) = &state.filtered else {
        return;
    };
    let options = axis_options(filtered, spec.kind, spec.x.as_deref());
    let (x_label, y_label) = spec.kind.axis_labels();
    if spec.kind.x_requirement().is_some() {
        if let Some(x) = combo(ui, "chart_x", x_label, spec.x.as_deref(), &options.x) {
            actions.push(Action::SelectChartX(x));
        }
    }
    if spec.kind.y_requirement().is_some() {
        if let Some(y) = combo(ui, "chart_y", y_label, spec.y.as_deref(), &options.y) {
            actions.push(Action::SelectChartY(y));
        }
    }
}

fn download_controls(ui: &mut Ui, state: &AppState, actions: &mut Vec<Action>) {
    ui.heading("Download Filtered Data");
    ui.label("Select download format");
    for format in [ExportFormat::Csv, ExportFormat::Excel] {
        if ui.radio(state.export_format == format, format.to_string()).clicked() {
            actions.push(Action::SelectExportFormat(format));
        }
    }
    if ui
        .button(format!("Download Filtered Data into {}", state.export_format))
        .clicked()
    {
        let format = state.export_format;
        match state.export() {
            Ok(export) => {
                let target = rfd::FileDialog::new()
                    .set_title("Save filtered data")
                    .set_file_name(export.file_name)
                    .add_filter(format.to_string(), &[format.extension()])
                    .save_file();
                if let Some(path) = target {
                    actions.push(Action::Download(path));
                }
            }
            Err(e) => actions.push(Action::ReportError(format!("{e:#}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Central panel – preview, summary, filtered rows, chart
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &AppState) {
    let Some(data) = &state.table else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Please upload a file to begin.");
        });
        return;
    };
    let row_height = state.config.preview_row_height;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Data Preview");
            table::data_table(ui, "preview", data, row_height);

            if let Some(summary) = &state.summary {
                ui.add_space(8.0);
                ui.strong("Summary");
                table::summary_table(ui, summary, row_height);
            }

            if let Some(filtered) = &state.filtered {
                ui.add_space(8.0);
                ui.heading("Filtered Data");
                ui.label(format!("Filtered rows: {}", filtered.len()));
                if filtered.is_empty() {
                    ui.label(RichText::new("No rows match the filter.").italics());
                } else {
                    table::data_table(ui, "filtered", filtered, row_height);
                }
            }

            ui.add_space(8.0);
            ui.heading(state.chart_spec.kind.to_string());
            plot::chart_plot(ui, state);
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &AppState, actions: &mut Vec<Action>) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Upload…").clicked() {
                actions.extend(open_file_dialog(state.format));
                ui.close_menu();
            }
        });

        ui.separator();
        ui.strong("Data Analysis Dashboard");
        ui.separator();

        if let (Some(name), Some(data)) = (&state.file_name, &state.table) {
            ui.label(format!(
                "{name}: {} rows × {} columns, {} after filter",
                data.len(),
                data.width(),
                state.filtered.as_ref().map_or(0, |t| t.len())
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::LIGHT_GREEN
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Ask for a file of the declared format and read it.
pub fn open_file_dialog(format: FileFormat) -> Option<Action> {
    let path = rfd::FileDialog::new()
        .set_title(format!("Upload your {format}"))
        .add_filter(format.to_string(), format.extensions())
        .pick_file()?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Some(match std::fs::read(&path) {
        Ok(bytes) => Action::Upload { name, bytes },
        Err(e) => Action::ReportError(format!("reading {}: {e}", path.display())),
    })
}
