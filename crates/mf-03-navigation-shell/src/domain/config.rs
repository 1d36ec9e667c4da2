//! Shell configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the navigation shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Deadline for mounting a remote route (ms).
    pub load_timeout_ms: u64,

    /// Mirror commits into the browser history and delegate back/forward
    /// to it. When off the shell walks its own history list.
    pub browser_history: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 10_000,
            browser_history: true,
        }
    }
}

impl ShellConfig {
    /// Shell that keeps its own history only.
    #[must_use]
    pub fn standalone() -> Self {
        Self {
            browser_history: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}
