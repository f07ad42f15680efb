mod settings;

pub use settings::{Config, DisplaySettings, ExportSettings, SourceSettings};

use crate::error::{DashboardError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.invoice-dashboard/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "invoice-dashboard") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.invoice-dashboard/
    let home = dirs_home().ok_or_else(|| {
        DashboardError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".invoice-dashboard"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve a configured path; relative paths are taken from the config directory
pub fn resolve_path(path: &str, config_dir: &Path) -> PathBuf {
    let expanded = expand_path(path);
    if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(DashboardError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| DashboardError::ConfigParse { path, source: e })
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[source]
# Workbook (.xlsx, .xls, .ods) or .csv file with the invoice rows.
# Relative paths are resolved from this directory.
path = "Facturas generales.xlsx"
# sheet = "Facturas Generales"   # optional, defaults per layout
layout = "invoices"              # "invoices" or "combined"

[display]
currency_symbol = "$"
top_n = 10                       # rows shown in ranking tables

[export]
output_dir = "exports"

[columns]
# Extra header aliases mapped onto canonical columns, e.g.:
# "Cliente Final" = "CLIENTE"
"#;
