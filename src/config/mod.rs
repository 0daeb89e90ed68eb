pub mod cli;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::{DashboardError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_directory, validate_file_stem, validate_path, validate_positive_number, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATA_DIR: &str = "data/output";
pub const DEFAULT_DATASET_PREFIX: &str = "snip_2025Q4";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "snip-dashboard")]
#[command(about = "Audit dashboard for SNIP/SEGEPLAN infrastructure projects")]
pub struct CliConfig {
    /// Directory holding the CSV extracts
    #[arg(long, env = "SNIP_OUT_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// File-name prefix shared by the extracts
    #[arg(long, default_value = DEFAULT_DATASET_PREFIX)]
    pub prefix: String,

    /// Action to apply before rendering (repeatable), e.g. `select:codede:0`
    #[arg(short, long = "action")]
    pub actions: Vec<String>,

    /// Read actions from stdin, one per line, redrawing after each change
    #[arg(short, long)]
    pub interactive: bool,

    /// Write the rendered map layer as GeoJSON to this path
    #[arg(long)]
    pub export: Option<String>,

    /// Print the dashboard as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Rows printed per table in text output
    #[arg(long, default_value = "10")]
    pub rows: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log process memory and CPU per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_directory("data_dir", &self.data_dir)?;
        validate_file_stem("prefix", &self.prefix)?;
        validate_positive_number("rows", self.rows, 1)?;
        if let Some(export) = &self.export {
            validate_path("export", export)?;
        }
        if self.json && self.interactive {
            return Err(DashboardError::ConfigError {
                message: "--json cannot be combined with --interactive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn dataset_prefix(&self) -> &str {
        &self.prefix
    }

    fn table_rows(&self) -> usize {
        self.rows
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> CliConfig {
        CliConfig::parse_from([
            "snip-dashboard",
            "--data-dir",
            dir.path().to_str().unwrap(),
        ])
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);
        assert_eq!(config.prefix, DEFAULT_DATASET_PREFIX);
        assert_eq!(config.rows, 10);
        assert!(config.actions.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_repeated_actions_keep_order() {
        let config = CliConfig::parse_from([
            "snip-dashboard",
            "--action",
            "select:codede:0",
            "-a",
            "reset",
        ]);
        assert_eq!(config.actions, vec!["select:codede:0", "reset"]);
    }

    #[test]
    fn test_json_and_interactive_conflict() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir);
        config.json = true;
        config.interactive = true;
        assert!(matches!(
            config.validate(),
            Err(DashboardError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_missing_data_dir_fails_validation() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir);
        config.data_dir = dir.path().join("nope").to_str().unwrap().to_string();
        assert!(config.validate().is_err());
    }
}
