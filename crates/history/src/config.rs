use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::stack::DEFAULT_CAPACITY;

/// History configuration: how many steps each stack retains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum records per stack. Older records are evicted.
    pub capacity: usize,
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_one_hundred() {
        assert_eq!(HistoryConfig::default().capacity, 100);
        assert!(HistoryConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        let cfg = HistoryConfig { capacity: 0 };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroCapacity));
    }
}
