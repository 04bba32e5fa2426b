use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::ChartKind;
use crate::data::loader::FileFormat;

/// Config file picked up from the working directory.
pub const CONFIG_FILE: &str = "rusty-dash.json";

/// User-tunable settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Number of histogram bins.
    pub histogram_bins: usize,
    /// Initial window size in points.
    pub window_size: [f32; 2],
    /// Format preselected in the upload selector.
    pub default_format: FileFormat,
    /// Chart type preselected after a file is loaded.
    pub default_chart: ChartKind,
    /// Row height of the data tables.
    pub preview_row_height: f32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 30,
            window_size: [1200.0, 800.0],
            default_format: FileFormat::Csv,
            default_chart: ChartKind::Line,
            preview_row_height: 18.0,
        }
    }
}

impl DashboardConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// The explicit path (`--config` or `$RUSTY_DASH_CONFIG`), then
    /// `./rusty-dash.json`, then defaults.  A broken file is logged and ignored.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| Some(PathBuf::from(CONFIG_FILE)).filter(|p| p.exists()));
        let Some(path) = path else {
            return Self::default();
        };
        match Self::from_path(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "histogram_bins": 12, "default_format": "excel" }}"#).unwrap();
        let config = DashboardConfig::from_path(file.path()).unwrap();
        assert_eq!(config.histogram_bins, 12);
        assert_eq!(config.default_format, FileFormat::Excel);
        assert_eq!(config.window_size, [1200.0, 800.0]);
        assert_eq!(config.default_chart, ChartKind::Line);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "bins": 12 }}"#).unwrap();
        assert!(DashboardConfig::from_path(file.path()).is_err());
    }

    #[test]
    fn explicit_path_wins_and_broken_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "histogram_bins": 7 }}"#).unwrap();
        assert_eq!(DashboardConfig::load(Some(file.path())).histogram_bins, 7);

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        write!(broken, "not json").unwrap();
        assert_eq!(DashboardConfig::load(Some(broken.path())), DashboardConfig::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DashboardConfig::from_path(&dir.path().join("absent.json")).unwrap_err();
        assert!(format!("{err:#}").contains("reading config"));
    }
}
