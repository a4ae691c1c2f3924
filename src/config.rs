use crate::error::{Error, Result};

/// Highest rank hipFFT plans support.
pub const MAX_SUPPORTED_RANK: usize = 3;

#[derive(Debug, Clone)]
pub struct Config {
    /// Leave vendor work-area auto-allocation on for new plans. When off,
    /// callers bind work areas themselves after configuration.
    pub auto_allocate_work_area: bool,

    /// Compare bound work areas against the size the plan reports.
    pub check_work_area_size: bool,

    pub max_rank: usize,

    #[cfg(feature = "telemetry")]
    pub enable_telemetry: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_allocate_work_area: false,
            check_work_area_size: true,
            max_rank: MAX_SUPPORTED_RANK,

            #[cfg(feature = "telemetry")]
            enable_telemetry: true,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rank == 0 {
            return Err(Error::config("max_rank must be > 0"));
        }
        if self.max_rank > MAX_SUPPORTED_RANK {
            return Err(Error::config(format!(
                "max_rank too large (max {MAX_SUPPORTED_RANK})"
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn auto_allocate_work_area(mut self, enable: bool) -> Self {
        self.config.auto_allocate_work_area = enable;
        self
    }

    pub fn check_work_area_size(mut self, enable: bool) -> Self {
        self.config.check_work_area_size = enable;
        self
    }

    pub fn max_rank(mut self, rank: usize) -> Self {
        self.config.max_rank = rank;
        self
    }

    #[cfg(feature = "telemetry")]
    pub fn enable_telemetry(mut self, enable: bool) -> Self {
        self.config.enable_telemetry = enable;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.auto_allocate_work_area);
        assert!(config.check_work_area_size);
        assert_eq!(config.max_rank, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_rejects_bad_rank() {
        assert!(Config::builder().max_rank(0).build().is_err());
        assert!(Config::builder().max_rank(4).build().is_err());
        let config = Config::builder().max_rank(2).build().unwrap();
        assert_eq!(config.max_rank, 2);
    }
}
