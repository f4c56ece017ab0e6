//! Engine configuration.

use xmpp_sm_core::DEFAULT_WINDOW_SIZE;

use crate::error::{EngineError, Result};

/// Configuration for Stream Management behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmConfig {
    /// Unacknowledged outbound stanzas that trigger an `<r/>`.
    pub window_size: usize,
    /// Whether `<enable/>` asks the server to allow resumption.
    pub allow_resume: bool,
}

impl Default for SmConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            allow_resume: true,
        }
    }
}

impl SmConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_allow_resume(mut self, allow_resume: bool) -> Self {
        self.allow_resume = allow_resume;
        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(EngineError::InvalidConfig(
                "window_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
