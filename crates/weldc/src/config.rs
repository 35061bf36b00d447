use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use weld_expr::model::ImportTable;

/// Represents a parsed weld.toml configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Project-wide import aliases, e.g. `View = "android.view.View"`.
    #[serde(default)]
    pub imports: BTreeMap<String, String>,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub types: TypesConfig,
}

/// The [diagnostics] section of weld.toml.
#[derive(Debug, Default, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub color: Option<bool>,
}

/// The [types] section of weld.toml.
#[derive(Debug, Default, Deserialize)]
pub struct TypesConfig {
    /// Package searched for simple type names the catalog does not qualify.
    #[serde(default)]
    pub default_package: Option<String>,
}

impl Config {
    /// Read and parse a weld.toml file from a path.
    pub fn from_file(path: &Path) -> Result<Config, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_str(&content)
    }

    /// Parse a weld.toml file from a string.
    pub fn from_str(content: &str) -> Result<Config, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Load `weld.toml` from `dir` if one exists.
    pub fn discover(dir: &Path) -> Result<Config, String> {
        let path = dir.join("weld.toml");
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn import_table(&self) -> ImportTable {
        let mut table = ImportTable::new();
        for (alias, qualified) in &self.imports {
            table.insert(alias.as_str(), qualified.as_str());
        }
        table
    }
}
