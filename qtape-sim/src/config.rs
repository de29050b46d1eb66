//! Device configuration

/// Configuration for the [`DefaultQubit`](crate::DefaultQubit) device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Number of measurement shots
    ///
    /// `None` returns exact expectation values, variances and probabilities.
    /// With `Some(n)`, Pauli-type expectations, variances and all
    /// probabilities are estimated from `n` samples; sample measurements
    /// always need a shot count.
    ///
    /// Default: None (analytic)
    pub shots: Option<usize>,

    /// Random number generator seed for reproducibility
    ///
    /// If None, uses a random seed. Set to Some(seed) for deterministic results.
    ///
    /// Default: None (random)
    pub seed: Option<u64>,
}

impl DeviceConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of measurement shots
    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = Some(shots);
        self
    }

    /// Set the random seed for deterministic execution
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.shots == Some(0) {
            return Err("shots must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeviceConfig::default();
        assert_eq!(config.shots, None);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DeviceConfig::new().with_shots(100).with_seed(7);
        assert_eq!(config.shots, Some(100));
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_validate() {
        let invalid = DeviceConfig {
            shots: Some(0),
            ..Default::default()
        };
        assert!(invalid.validate().is_err());
    }
}
