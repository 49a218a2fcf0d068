//! Input document for `solc --standard-json`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SolcError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Optimizer {
    pub enabled: bool,
    pub runs: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub optimizer: Optimizer,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub evm_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remappings: Vec<String>,
    /// file -> contract -> requested outputs, e.g. `{"*": {"*": ["abi"]}}`
    #[serde(default)]
    pub output_selection: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerJsonConfig {
    pub language: String,
    pub sources: BTreeMap<String, Source>,
    pub settings: Settings,
}

impl Default for CompilerJsonConfig {
    fn default() -> Self {
        Self {
            language: "Solidity".to_string(),
            sources: BTreeMap::new(),
            settings: Settings::default(),
        }
    }
}

impl CompilerJsonConfig {
    pub fn with_source(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.sources.insert(
            name.into(),
            Source {
                content: content.into(),
            },
        );
        self
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| SolcError::Decode {
            what: "standard-json compiler config".to_string(),
            source,
        })
    }
}
