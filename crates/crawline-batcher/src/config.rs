//! Batcher stage configuration

/// Runtime configuration for the ingestion stage
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Batch dispatch target and hard ceiling
    pub batch_size: usize,
    /// Maximum index rows to traverse (for bounded runs)
    pub max_rows: Option<usize>,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_rows: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = BatcherConfig::default();
        assert_eq!(config.batch_size, 50);
        assert!(config.max_rows.is_none());
    }
}
