//! # Load State Machine
//!
//! ```text
//! [Pending] ──→ [FetchingScript] ──→ [LookingUpContainer] ──→ [InitializingContainer]
//!     │              (skipped when cached)                      (skipped when done)
//!     │                                                                │
//!     └── host-linked ──→ [ResolvingHostModule] ──┐                    ▼
//!                                                 │            [LookingUpFactory]
//!                                                 │                    │
//!                                                 └──────→ [Instantiating] ──→ [Resolved]
//!
//! Any step ──→ [Errored]        The deadline races every step ──→ [TimedOut]
//! ```

use std::fmt;

/// Step a load attempt is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadPhase {
    #[default]
    Pending,
    FetchingScript,
    LookingUpContainer,
    InitializingContainer,
    LookingUpFactory,
    ResolvingHostModule,
    Instantiating,
    Resolved,
    Errored,
    TimedOut,
}

impl LoadPhase {
    /// Terminal states end the attempt.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Errored | Self::TimedOut)
    }

    /// Label used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::FetchingScript => "fetching-script",
            Self::LookingUpContainer => "looking-up-container",
            Self::InitializingContainer => "initializing-container",
            Self::LookingUpFactory => "looking-up-factory",
            Self::ResolvingHostModule => "resolving-host-module",
            Self::Instantiating => "instantiating",
            Self::Resolved => "resolved",
            Self::Errored => "errored",
            Self::TimedOut => "timed-out",
        }
    }
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
