//! Option declarations kept in a TOML file, so settings files can be
//! checked from the command line without the mod that owns them.
//!
//! ```toml
//! name = "ZMU"
//!
//! [options.IntTest]
//! type = "integer"
//! min = 0
//! max = 100
//! default = 50
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use modkit_config::{Configuration, OptionDecl};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaFile {
    /// Configuration name the schema belongs to
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub options: BTreeMap<String, OptionDecl>,
}

impl SchemaFile {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse schema")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid schema {}", path.display()))
    }

    /// Declare every option on `config`, returning how many were accepted
    pub fn declare_all(&self, config: &mut Configuration) -> usize {
        let mut accepted = 0;
        for (key, decl) in &self.options {
            if config.declare(key, decl) {
                accepted += 1;
            }
        }
        accepted
    }
}
