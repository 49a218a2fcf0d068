use super::Distribution;

/// Operating system the binaries are fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub os: String,
}

impl Platform {
    /// The OS this build runs on ("linux", "macos", "windows", ...).
    pub fn detect() -> Self {
        Self::new(std::env::consts::OS)
    }

    pub fn new(os: impl Into<String>) -> Self {
        Self { os: os.into() }
    }

    pub fn distribution(&self) -> Distribution {
        Distribution::from_os(&self.os)
    }
}

/// Trait for platform detection (useful for testing)
#[cfg_attr(test, mockall::automock)]
pub trait PlatformDetector: Send + Sync {
    fn detect(&self) -> Platform;
}

pub struct DefaultPlatformDetector;

impl PlatformDetector for DefaultPlatformDetector {
    fn detect(&self) -> Platform {
        Platform::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detect() {
        let platform = Platform::detect();
        assert!(!platform.os.is_empty());

        #[cfg(target_os = "macos")]
        assert_eq!(platform.distribution(), Distribution::MacOS);

        #[cfg(target_os = "linux")]
        assert_eq!(platform.distribution(), Distribution::Linux);

        #[cfg(target_os = "windows")]
        assert_eq!(platform.distribution(), Distribution::Windows);
    }

    #[test]
    fn test_default_platform_detector() {
        assert_eq!(DefaultPlatformDetector.detect(), Platform::detect());
    }

    #[test]
    fn test_platform_distribution() {
        assert_eq!(Platform::new("linux").distribution(), Distribution::Linux);
        assert_eq!(Platform::new("freebsd").distribution(), Distribution::Unknown);
    }
}
