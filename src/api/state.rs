//! Application state for the reconciliation API.

use std::sync::Arc;

use crate::config::{ConfigLoader, ReconConfig};

/// Shared application state.
///
/// Holds the loaded configuration; handlers only ever read it.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ReconConfig>,
}

impl AppState {
    /// Creates the state from a validated configuration loader.
    pub fn new(loader: ConfigLoader) -> Self {
        Self {
            config: Arc::new(loader.into_config()),
        }
    }

    /// Returns the reconciliation configuration.
    pub fn config(&self) -> &ReconConfig {
        &self.config
    }

    /// Returns a shared handle to the configuration, for blocking workers.
    pub fn shared_config(&self) -> Arc<ReconConfig> {
        Arc::clone(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_state_exposes_config() {
        let loader = ConfigLoader::from_config(ReconConfig::default()).unwrap();
        let state = AppState::new(loader);
        assert_eq!(state.config().report.output_file_name, "resultado.xlsx");
        assert_eq!(*state.shared_config(), ReconConfig::default());
    }
}
