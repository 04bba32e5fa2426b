use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::chart::{self, Chart, ChartKind, ChartSpec, ChartWarning};
use crate::config::DashboardConfig;
use crate::data::export::{self, Export, ExportFormat};
use crate::data::filter::{FilterSpec, Predicate, apply_filter, distinct_values, numeric_bounds};
use crate::data::loader::{FileFormat, load_bytes};
use crate::data::model::{CellValue, Table};
use crate::data::stats::{Summary, describe};

// ---------------------------------------------------------------------------
// User actions
// ---------------------------------------------------------------------------

/// One user interaction.  The UI only ever produces these; all state
/// changes go through [`AppState::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectFormat(FileFormat),
    Upload { name: String, bytes: Vec<u8> },
    ShowSummary(bool),
    SelectFilterColumn(String),
    SelectFilterValue(CellValue),
    SetFilterRange { min: f64, max: f64 },
    SelectChartKind(ChartKind),
    SelectChartX(String),
    SelectChartY(String),
    SelectExportFormat(ExportFormat),
    /// Save the filtered rows to the chosen path.
    Download(PathBuf),
    /// A failure that happened outside the state (e.g. reading the upload).
    ReportError(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Widget contents for the current filter column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterControl {
    /// Column empty or all missing: nothing to choose from.
    Unavailable,
    Category { options: Vec<CellValue> },
    Range { lo: f64, hi: f64 },
}

/// The full session state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Declared upload format; selects the parser.
    pub format: FileFormat,

    /// Name of the uploaded file (None until the user uploads one).
    pub file_name: Option<String>,

    /// Parsed upload, kept for the whole session.
    pub table: Option<Table>,

    pub show_summary: bool,
    pub summary: Option<Summary>,

    pub filter_column: Option<String>,
    pub filter_control: FilterControl,
    pub filter: Option<FilterSpec>,

    /// Rows passing the current filter (cached).
    pub filtered: Option<Table>,

    pub chart_spec: ChartSpec,
    /// Last chart computed from `filtered`.
    pub chart: Option<Result<Chart, ChartWarning>>,

    pub export_format: ExportFormat,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            format: config.default_format,
            chart_spec: ChartSpec {
                kind: config.default_chart,
                ..ChartSpec::default()
            },
            config,
            file_name: None,
            table: None,
            show_summary: false,
            summary: None,
            filter_column: None,
            filter_control: FilterControl::Unavailable,
            filter: None,
            filtered: None,
            chart: None,
            export_format: ExportFormat::default(),
            status_message: None,
        }
    }

    /// Apply one user action and recompute whatever depends on it.
    pub fn dispatch(&mut self, action: Action) {
        log::debug!("dispatch {:?}", ActionName(&action));
        match action {
            Action::SelectFormat(format) => {
                if format != self.format {
                    self.format = format;
                    self.clear();
                }
            }
            Action::Upload { name, bytes } => self.upload(name, &bytes),
            Action::ShowSummary(show) => {
                self.show_summary = show;
                self.refresh_summary();
            }
            Action::SelectFilterColumn(column) => self.select_filter_column(column),
            Action::SelectFilterValue(value) => {
                if let Some(column) = self.filter_column.clone() {
                    self.filter = Some(FilterSpec {
                        column,
                        predicate: Predicate::Equals(value),
                    });
                    self.refilter();
                }
            }
            Action::SetFilterRange { min, max } => {
                if let (Some(table), Some(column)) = (&self.table, &self.filter_column) {
                    self.filter = FilterSpec::narrowed(table, column, min, max);
                    self.refilter();
                }
            }
            Action::SelectChartKind(kind) => {
                self.chart_spec.kind = kind;
                self.reselect_chart();
            }
            Action::SelectChartX(x) => {
                self.chart_spec.x = Some(x);
                self.reselect_chart();
            }
            Action::SelectChartY(y) => {
                self.chart_spec.y = Some(y);
                self.rechart();
            }
            Action::SelectExportFormat(format) => self.export_format = format,
            Action::Download(path) => match self.save_export(&path) {
                Ok(()) => {
                    self.status_message = Some(format!("Saved {}", path.display()));
                }
                Err(e) => {
                    log::error!("Failed to save download: {e:#}");
                    self.status_message = Some(format!("Error: {e:#}"));
                }
            },
            Action::ReportError(message) => {
                log::error!("{message}");
                self.status_message = Some(format!("Error: {message}"));
            }
        }
    }

    /// Drop the current upload and everything derived from it.
    fn clear(&mut self) {
        self.file_name = None;
        self.table = None;
        self.summary = None;
        self.filter_column = None;
        self.filter_control = FilterControl::Unavailable;
        self.filter = None;
        self.filtered = None;
        self.chart = None;
        self.status_message = None;
    }

    fn upload(&mut self, name: String, bytes: &[u8]) {
        self.clear();
        match load_bytes(bytes, self.format) {
            Ok(table) => {
                log::info!(
                    "Loaded '{name}' as {}: {} rows, columns {:?}",
                    self.format,
                    table.len(),
                    table.column_names()
                );
                self.set_table(name, table);
            }
            Err(e) => {
                log::error!("Failed to load '{name}': {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded table and initialise filter and chart.
    pub fn set_table(&mut self, name: String, table: Table) {
        let first = table.column_names().into_iter().next();
        self.file_name = Some(name);
        self.table = Some(table);
        self.status_message = None;
        self.refresh_summary();
        match first {
            Some(column) => self.select_filter_column(column),
            None => self.refilter(),
        }
        self.reselect_chart();
    }

    fn refresh_summary(&mut self) {
        self.summary = match (&self.table, self.show_summary) {
            (Some(table), true) => Some(describe(table)),
            _ => None,
        };
    }

    fn select_filter_column(&mut self, column: String) {
        let Some(table) = &self.table else {
            return;
        };
        let Some(col) = table.column(&column) else {
            return;
        };
        self.filter_control = if col.is_numeric() {
            match numeric_bounds(col) {
                Some((lo, hi)) => FilterControl::Range { lo, hi },
                None => FilterControl::Unavailable,
            }
        } else {
            let options = distinct_values(col);
            if options.is_empty() {
                FilterControl::Unavailable
            } else {
                FilterControl::Category { options }
            }
        };
        self.filter = FilterSpec::default_for(table, &column);
        self.filter_column = Some(column);
        self.refilter();
    }

    /// Recompute the filtered table, then the chart.
    fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let filtered = match &self.filter {
            Some(spec) => apply_filter(table, spec),
            None => table.empty_like(),
        };
        log::debug!("filter {:?}: {} of {} rows", self.filter, filtered.len(), table.len());
        self.filtered = Some(filtered);
        self.rechart();
    }

    fn reselect_chart(&mut self) {
        let Some(filtered) = &self.filtered else {
            return;
        };
        self.chart_spec = ChartSpec::reselect(
            filtered,
            self.chart_spec.kind,
            self.chart_spec.x.take(),
            self.chart_spec.y.take(),
        );
        self.rechart();
    }

    fn rechart(&mut self) {
        let Some(filtered) = &self.filtered else {
            self.chart = None;
            return;
        };
        let result = chart::build_chart(filtered, &self.chart_spec, self.config.histogram_bins);
        if let Err(warning) = &result {
            log::warn!("{warning}");
        }
        self.chart = Some(result);
    }

    /// Serialize the filtered rows in the chosen download format.
    pub fn export(&self) -> Result<Export> {
        let filtered = self
            .filtered
            .as_ref()
            .context("Please upload a file to begin.")?;
        export::export(filtered, self.export_format)
    }

    pub fn save_export(&self, path: &Path) -> Result<()> {
        let export = self.export()?;
        export.save(path)?;
        log::info!(
            "Saved {} rows as {} ({}) to {}",
            self.filtered.as_ref().map_or(0, Table::len),
            export.file_name,
            export.mime,
            path.display()
        );
        Ok(())
    }
}

/// Debug view of an action that leaves out upload payloads.
struct ActionName<'a>(&'a Action);

impl std::fmt::Debug for ActionName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Action::Upload { name, bytes } => write!(f, "Upload({name}, {} bytes)", bytes.len()),
            other => write!(f, "{other:?}"),
        }
    }
}
