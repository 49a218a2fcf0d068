use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use solc_switch::compiler::CompilerConfig;
use solc_switch::config::{Config, DEFAULT_RELEASES_URL, default_releases_dir};
use solc_switch::release::normalize_tag;
use solc_switch::runtime::{RealRuntime, Runtime};
use solc_switch::solc::Solc;
use std::path::PathBuf;
use std::time::Duration;

/// solc-switch - Solidity compiler version manager
///
/// Keeps a local mirror of the solc releases published on GitHub, downloads
/// the binaries for this platform and compiles sources with any of them.
///
/// If SOLC_SWITCH_GITHUB_TOKEN is set, it is sent with every GitHub request.
/// This avoids the low rate limit of anonymous API access.
///
/// Examples:
///   solc-switch sync                  # Download every missing solc binary
///   solc-switch sync --version 0.8.20 # Download one version
///   solc-switch compile 0.8.20 A.sol  # Compile A.sol with solc 0.8.20
#[derive(Parser, Debug)]
#[command(author, version = env!("SOLC_SWITCH_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding releases.json and the solc binaries
    /// (defaults to ~/.solc-switch/releases)
    #[arg(
        long = "releases-dir",
        short = 'd',
        env = "SOLC_SWITCH_RELEASES_DIR",
        value_name = "PATH",
        global = true
    )]
    releases_dir: Option<PathBuf>,

    /// GitHub releases API URL
    #[arg(
        long = "releases-url",
        env = "SOLC_SWITCH_RELEASES_URL",
        value_name = "URL",
        default_value = DEFAULT_RELEASES_URL,
        global = true
    )]
    releases_url: String,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 10, global = true)]
    timeout: u64,

    /// GitHub access token
    #[arg(
        long = "github-token",
        env = "SOLC_SWITCH_GITHUB_TOKEN",
        hide_env_values = true,
        global = true
    )]
    github_token: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Refresh release metadata and download missing binaries
    Sync(SyncArgs),

    /// List known releases
    List,

    /// Print the latest release tag
    Latest,

    /// Print the local path of a downloaded binary
    Path(VersionArgs),

    /// Delete a downloaded binary
    Remove(VersionArgs),

    /// Compile a Solidity file and print the results as JSON
    Compile(CompileArgs),
}

#[derive(clap::Args, Debug)]
struct SyncArgs {
    /// Only download this version
    #[arg(long, value_name = "VERSION")]
    version: Option<String>,
}

#[derive(clap::Args, Debug)]
struct VersionArgs {
    /// Version tag, with or without the "v" prefix
    #[arg(value_name = "VERSION")]
    version: String,
}

#[derive(clap::Args, Debug)]
struct CompileArgs {
    /// Version tag, with or without the "v" prefix
    #[arg(value_name = "VERSION")]
    version: String,

    /// Solidity source file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Contract to flag as the entry contract
    #[arg(long, value_name = "NAME")]
    entry: Option<String>,
}

fn build_solc(cli: &Cli) -> Result<Solc<RealRuntime>> {
    let runtime = RealRuntime;

    let releases_dir = match &cli.releases_dir {
        Some(dir) => dir.clone(),
        None => {
            let dir = default_releases_dir(&runtime)?;
            if !runtime.exists(&dir) {
                debug!("Creating releases directory {:?}", dir);
                runtime
                    .create_dir_all(&dir)
                    .with_context(|| format!("Failed to create releases directory {:?}", dir))?;
            }
            dir
        }
    };

    let config = Config::new(releases_dir)
        .with_releases_url(cli.releases_url.clone())
        .with_http_timeout(Duration::from_secs(cli.timeout))
        .with_access_token(cli.github_token.clone());

    Ok(Solc::new(runtime, config)?)
}

async fn sync(solc: &Solc<RealRuntime>, args: SyncArgs) -> Result<()> {
    let token = solc.cancellation_token().clone();
    let ctrl_c_handler = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, skipping pending downloads...");
            token.cancel();
        }
    });

    let result = match &args.version {
        Some(version) => solc.sync_one(version).await,
        None => solc.sync().await,
    };

    ctrl_c_handler.abort();
    result?;

    match args.version {
        Some(version) => println!("solc {} is up to date", normalize_tag(&version)),
        None => println!("All solc releases are up to date"),
    }
    Ok(())
}

fn list(solc: &Solc<RealRuntime>) -> Result<()> {
    for info in solc.get_releases_simplified()? {
        let mut marks = Vec::new();
        if info.is_latest {
            marks.push("latest");
        }
        if info.is_prerelease {
            marks.push("prerelease");
        }
        if solc.runtime().exists(&solc.binary_path(&info.tag_name)) {
            marks.push("installed");
        }

        if marks.is_empty() {
            println!("{}", info.tag_name);
        } else {
            println!("{} ({})", info.tag_name, marks.join(", "));
        }
    }
    Ok(())
}

async fn compile(solc: &Solc<RealRuntime>, args: CompileArgs) -> Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {:?}", args.file))?;

    let config = CompilerConfig::new_default(normalize_tag(&args.version))?
        .with_entry_source_name(args.entry.unwrap_or_default());

    let results = solc.compile(&source, config).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let solc = build_solc(&cli)?;

    match cli.command {
        Commands::Sync(args) => sync(&solc, args).await?,
        Commands::List => list(&solc)?,
        Commands::Latest => println!("{}", solc.get_latest_release().await?.tag_name),
        Commands::Path(args) => println!("{}", solc.get_binary(&args.version).await?.display()),
        Commands::Remove(args) => {
            solc.remove_binary(&args.version).await?;
            println!("Removed solc {}", normalize_tag(&args.version));
        }
        Commands::Compile(args) => compile(&solc, args).await?,
    }
    Ok(())
}
