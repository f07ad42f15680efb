use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::source::Layout;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub export: ExportSettings,
    /// Extra header aliases, source header -> canonical column
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct SourceSettings {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub layout: Layout,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplaySettings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            top_n: default_top_n(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExportSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_output_dir() -> String {
    "exports".to_string()
}
