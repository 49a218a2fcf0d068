//! solc invocation settings and argument allow-listing.

use crate::error::{Result, SolcError};

use super::json_config::CompilerJsonConfig;

/// Flags solc may be started with. Anything else that looks like a flag is
/// rejected before a process is spawned.
pub const ALLOWED_ARGUMENTS: &[&str] = &[
    "--combined-json",
    "-",
    "--optimize",
    "--optimize-runs",
    "--evm-version",
    "--overwrite",
    "--libraries",
    "--standard-json",
    "--allow-paths",
    "--base-path",
    "--ignore-missing",
    "--ast",
    "--ast-json",
    "--include-path",
    "--output-dir",
    "--asm",
    "--bin",
    "--abi",
    "--asm-json",
    "--bin-runtime",
    "--ir",
    "--opcodes",
    "--ir-optimized",
    "--ewasm",
    "--ewasm-ir",
    "--no-optimize-yul",
    "--yul-optimizations",
    "--yul",
    "--assemble",
    "--lsp",
    "--hashes",
    "--userdoc",
    "--devdoc",
    "--metadata",
    "--storage-layout",
    "--gas",
    "--metadata-hash",
    "--metadata-literal",
    "--error-recovery",
];

/// Flags plain (combined-json over stdin) compilation cannot do without.
pub const REQUIRED_ARGUMENTS: &[&str] = &["--overwrite", "--combined-json", "-"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerConfig {
    /// Version of the binary to run (e.g. "0.8.20")
    pub compiler_version: String,
    /// Contract name flagged as the entry in the results
    pub entry_source_name: String,
    pub arguments: Vec<String>,
    /// Set for `--standard-json` compilation; the serialized config is fed
    /// to solc on stdin.
    pub json_config: Option<CompilerJsonConfig>,
}

impl CompilerConfig {
    /// Plain mode: `--overwrite --combined-json bin,abi -`, output to stdout.
    pub fn new_default(compiler_version: impl Into<String>) -> Result<Self> {
        let config = Self {
            compiler_version: compiler_version.into(),
            arguments: ["--overwrite", "--combined-json", "bin,abi", "-"]
                .into_iter()
                .map(String::from)
                .collect(),
            ..Default::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Standard-json mode. The json config itself is not validated here.
    pub fn from_json(
        compiler_version: impl Into<String>,
        entry_source_name: impl Into<String>,
        json_config: CompilerJsonConfig,
    ) -> Result<Self> {
        let config = Self {
            compiler_version: compiler_version.into(),
            entry_source_name: entry_source_name.into(),
            arguments: vec!["--standard-json".to_string()],
            json_config: Some(json_config),
        };

        config.sanitize_arguments()?;
        Ok(config)
    }

    pub fn with_entry_source_name(mut self, name: impl Into<String>) -> Self {
        self.entry_source_name = name.into();
        self
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn append_arguments<I, S>(&mut self, arguments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(arguments.into_iter().map(Into::into));
    }

    pub fn set_compiler_version(&mut self, version: impl Into<String>) {
        self.compiler_version = version.into();
    }

    pub fn is_standard_json(&self) -> bool {
        self.json_config.is_some()
    }

    /// Check every flag-looking argument against [`ALLOWED_ARGUMENTS`].
    ///
    /// `--flag=value` is checked by its flag part, so `--optimize-runs=200`
    /// is accepted where a whole-argument match would reject it. Values such
    /// as `bin,abi` or `200` do not start with `-` and pass through untouched.
    pub fn sanitize_arguments(&self) -> Result<Vec<String>> {
        for argument in &self.arguments {
            if !argument.starts_with('-') {
                continue;
            }
            let flag = argument.split_once('=').map_or(argument.as_str(), |(f, _)| f);
            if !ALLOWED_ARGUMENTS.contains(&flag) {
                return Err(SolcError::InvalidArgument(argument.clone()));
            }
        }
        Ok(self.arguments.clone())
    }

    /// Plain-mode validation: allow-listed arguments, every required flag
    /// present and an `X.Y.Z` version.
    pub fn validate(&self) -> Result<()> {
        let sanitized = self.sanitize_arguments()?;

        if let Some(missing) = REQUIRED_ARGUMENTS
            .iter()
            .find(|required| !sanitized.iter().any(|arg| arg == *required))
        {
            return Err(SolcError::MissingArgument(missing.to_string()));
        }

        if !is_release_version(&self.compiler_version) {
            return Err(SolcError::InvalidVersion(self.compiler_version.clone()));
        }

        Ok(())
    }
}

/// `0.8.20` yes; `v0.8.20`, `0.8` and `0.8.20-nightly` no.
fn is_release_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
