pub mod clock;
pub mod compiler;
pub mod config;
pub mod error;
pub mod http;
pub mod platform;
pub mod release;
pub mod runtime;
pub mod solc;

pub use compiler::{CompilerConfig, CompilerResults};
pub use config::Config;
pub use error::{Result, SolcError};
pub use release::{Release, VersionInfo};
pub use solc::Solc;
