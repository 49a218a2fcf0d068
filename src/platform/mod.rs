//! Platform detection and solc asset naming
//!
//! This module detects the current operating system, maps it to the name
//! token solc uses for its release assets, and derives the local
//! file name a downloaded binary is stored under.

mod detection;
mod distribution;

pub use detection::{DefaultPlatformDetector, Platform, PlatformDetector};
pub use distribution::Distribution;

#[cfg(test)]
pub use detection::MockPlatformDetector;
