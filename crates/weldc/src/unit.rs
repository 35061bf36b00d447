//! The unit file: one layout's binding expressions plus everything needed to
//! type them.
//!
//! ```json
//! {
//!   "filename": "main.xml",
//!   "source": "...",
//!   "imports": ["android.view.View", { "alias": "Person", "type": "com.example.User" }],
//!   "variables": [{ "name": "user", "type": "Person" }],
//!   "types": { "default_package": "java.lang", "classes": { ... } },
//!   "bindings": [{ "kind": "identifier", "name": "user", "span": [10, 14] }]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use weld_expr::model::{ImportTable, TypeCatalog};
use weld_expr::pool::ExprPool;
use weld_expr::syntax::{lower_root, SyntaxExpr};

use crate::config::Config;

/// An import: a fully-qualified name, or an explicit alias.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Import {
    Qualified(String),
    Alias {
        alias: String,
        #[serde(rename = "type")]
        qualified: String,
    },
}

/// A variable declared by the layout.
#[derive(Debug, Clone, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UnitFile {
    #[serde(default)]
    pub filename: Option<String>,
    /// Layout source the binding spans point into.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub types: TypeCatalog,
    #[serde(default)]
    pub bindings: Vec<SyntaxExpr>,
}

impl UnitFile {
    pub fn from_file(path: &Path) -> Result<UnitFile, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<UnitFile, String> {
        serde_json::from_str(content).map_err(|e| format!("Failed to parse unit: {}", e))
    }

    /// The unit's imports, with the project-wide ones filling in aliases the
    /// unit does not define itself.
    pub fn import_table(&self, config: &Config) -> ImportTable {
        let mut table = ImportTable::new();
        for import in &self.imports {
            match import {
                Import::Qualified(qualified) => table.import(qualified),
                Import::Alias { alias, qualified } => {
                    table.insert(alias.as_str(), qualified.as_str())
                }
            }
        }
        table.merge_missing(&config.import_table());
        table
    }

    /// The type catalog, falling back to the configured default package.
    pub fn catalog(&self, config: &Config) -> TypeCatalog {
        let mut catalog = self.types.clone();
        if catalog.default_package.is_none() {
            catalog.default_package = config.types.default_package.clone();
        }
        catalog
    }

    /// Declare the unit's variables and lower its bindings into a new pool.
    pub fn build_pool(&self, config: &Config) -> Result<ExprPool, String> {
        let mut pool = ExprPool::with_imports(self.import_table(config));
        for var in &self.variables {
            pool.declare(&var.name, &var.type_name)
                .map_err(|e| e.to_string())?;
        }
        for binding in &self.bindings {
            lower_root(&mut pool, binding);
        }
        Ok(pool)
    }
}
