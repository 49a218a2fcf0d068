//! Running a downloaded solc binary and decoding what it prints.
//!
//! Two modes are supported:
//!
//! - plain: source on stdin, `--combined-json` output parsed from stdout
//! - standard-json: a [`CompilerJsonConfig`] on stdin, the standard-json
//!   output document parsed from stdout
//!
//! The binary is resolved through [`Solc::get_binary`], so it must have been
//! synced first.

mod config;
mod json_config;

pub use config::{ALLOWED_ARGUMENTS, CompilerConfig, REQUIRED_ARGUMENTS};
pub use json_config::{CompilerJsonConfig, Optimizer, Settings, Source};

use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Result, SolcError};
use crate::runtime::Runtime;
use crate::solc::Solc;

/// One diagnostic reported by solc.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationError {
    #[serde(default)]
    pub component: String,
    #[serde(default, rename = "formattedMessage")]
    pub formatted_message: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl CompilationError {
    fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Output for a single contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerResult {
    pub is_entry_contract: bool,
    pub requested_version: String,
    pub compiler_version: String,
    pub contract_name: String,
    pub bytecode: String,
    pub deployed_bytecode: String,
    /// ABI as a JSON document
    pub abi: String,
    pub opcodes: String,
    pub metadata: String,
    pub errors: Vec<CompilationError>,
    pub warnings: Vec<CompilationError>,
}

impl CompilerResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerResults {
    pub results: Vec<CompilerResult>,
}

impl CompilerResults {
    pub fn entry_contract(&self) -> Option<&CompilerResult> {
        self.results.iter().find(|result| result.is_entry_contract)
    }
}

/// A compilation of one source with one solc version.
pub struct Compiler<'a, R: Runtime> {
    solc: &'a Solc<R>,
    config: CompilerConfig,
    source: String,
}

impl<'a, R: Runtime> Compiler<'a, R> {
    pub fn new(solc: &'a Solc<R>, config: CompilerConfig, source: impl Into<String>) -> Result<Self> {
        let source = source.into();

        if !config.is_standard_json() {
            if source.is_empty() {
                return Err(SolcError::Compiler(
                    "source code must be provided".to_string(),
                ));
            }
            config.validate()?;
        }

        Ok(Self {
            solc,
            config,
            source,
        })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    #[tracing::instrument(skip(self), fields(version = %self.config.compiler_version))]
    pub async fn compile(&self) -> Result<CompilerResults> {
        let version = self.config.compiler_version.as_str();
        if version.is_empty() {
            return Err(SolcError::Compiler(
                "no compiler version specified".to_string(),
            ));
        }

        let binary = self.solc.get_binary(version).await?;
        let arguments = self.config.sanitize_arguments()?;

        let stdin_payload = match &self.config.json_config {
            Some(json_config) => json_config.to_json()?,
            None => {
                self.config.validate()?;
                self.source.clone()
            }
        };

        debug!("Running {:?} {}", binary, arguments.join(" "));

        let mut child = Command::new(&binary)
            .args(&arguments)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SolcError::io(format!("Failed to start {:?}", binary), e.into()))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SolcError::Compiler("solc stdin is not available".to_string()))?;

        let feed = async move {
            stdin.write_all(stdin_payload.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output
            .map_err(|e| SolcError::io(format!("Failed to wait for {:?}", binary), e.into()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            error!("Failed to compile Solidity sources with solc {}: {}", version, stderr.trim());
            return Err(SolcError::CompilationFailed {
                version: version.to_string(),
                results: Box::new(failure_results(version, &stderr)),
                stderr,
            });
        }

        fed.map_err(|e| SolcError::io("Failed to write solc input", e.into()))?;

        if self.config.is_standard_json() {
            parse_standard_json_output(version, &self.config.entry_source_name, &output.stdout)
        } else {
            parse_plain_output(version, &self.config.entry_source_name, &output.stdout)
        }
    }
}

/// Single result carrying whatever stderr said.
fn failure_results(version: &str, stderr: &str) -> CompilerResults {
    let diagnostic = CompilationError::from_message(stderr);
    let mut result = CompilerResult {
        requested_version: version.to_string(),
        ..Default::default()
    };

    if stderr.trim_start().starts_with("Warning:") && !stderr.contains("Error:") {
        result.warnings.push(diagnostic);
    } else {
        result.errors.push(diagnostic);
    }

    CompilerResults {
        results: vec![result],
    }
}

/// solc prints the ABI as a string in older releases and as an array in
/// newer ones.
fn abi_to_string(abi: &serde_json::Value) -> String {
    match abi {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn decode_output<'de, T: Deserialize<'de>>(stdout: &'de [u8]) -> Result<T> {
    serde_json::from_slice(stdout).map_err(|source| SolcError::Decode {
        what: "solc output".to_string(),
        source,
    })
}

#[derive(Deserialize)]
struct PlainOutput {
    #[serde(default)]
    contracts: BTreeMap<String, PlainContract>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    version: String,
}

#[derive(Deserialize)]
struct PlainContract {
    #[serde(default)]
    bin: String,
    #[serde(default)]
    abi: serde_json::Value,
}

fn parse_plain_output(version: &str, entry: &str, stdout: &[u8]) -> Result<CompilerResults> {
    let output: PlainOutput = decode_output(stdout)?;

    let (warnings, errors): (Vec<_>, Vec<_>) = output
        .errors
        .into_iter()
        .map(CompilationError::from_message)
        .partition(|e| e.message.contains("Warning:"));

    let results = output
        .contracts
        .into_iter()
        .map(|(key, contract)| {
            let name = key.strip_prefix("<stdin>:").unwrap_or(key.as_str()).to_string();
            CompilerResult {
                is_entry_contract: !entry.is_empty() && name == entry,
                requested_version: version.to_string(),
                compiler_version: output.version.clone(),
                contract_name: name,
                bytecode: contract.bin,
                abi: abi_to_string(&contract.abi),
                errors: errors.clone(),
                warnings: warnings.clone(),
                ..Default::default()
            }
        })
        .collect();

    Ok(CompilerResults { results })
}

#[derive(Deserialize)]
struct StandardJsonOutput {
    #[serde(default)]
    contracts: BTreeMap<String, BTreeMap<String, StandardJsonContract>>,
    #[serde(default)]
    errors: Vec<CompilationError>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct StandardJsonContract {
    abi: serde_json::Value,
    evm: Evm,
    metadata: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Evm {
    bytecode: Bytecode,
    deployed_bytecode: Bytecode,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Bytecode {
    object: String,
    opcodes: String,
}

fn parse_standard_json_output(
    version: &str,
    entry: &str,
    stdout: &[u8],
) -> Result<CompilerResults> {
    let output: StandardJsonOutput = decode_output(stdout)?;

    let (warnings, errors): (Vec<_>, Vec<_>) = output
        .errors
        .into_iter()
        .partition(|e| e.severity.eq_ignore_ascii_case("warning"));

    let mut results: Vec<CompilerResult> = output
        .contracts
        .into_values()
        .flatten()
        .map(|(name, contract)| CompilerResult {
            is_entry_contract: !entry.is_empty() && name == entry,
            requested_version: version.to_string(),
            abi: abi_to_string(&contract.abi),
            bytecode: contract.evm.bytecode.object,
            opcodes: contract.evm.bytecode.opcodes,
            deployed_bytecode: contract.evm.deployed_bytecode.object,
            metadata: contract.metadata,
            contract_name: name,
            errors: errors.clone(),
            warnings: warnings.clone(),
            ..Default::default()
        })
        .collect();

    // solc exits 0 on source errors in this mode; keep them visible even
    // when no contract was produced.
    if !errors.is_empty() {
        results.push(CompilerResult {
            requested_version: version.to_string(),
            errors,
            warnings,
            ..Default::default()
        });
    }

    Ok(CompilerResults { results })
}
