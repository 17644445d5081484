//! Process-wide "has setup run" flag.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

const UNCONFIGURED: u8 = 0;
const INITIALIZED: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStatus {
    Unconfigured,
    Initialized,
}

impl fmt::Display for BootstrapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapStatus::Unconfigured => f.write_str("unconfigured"),
            BootstrapStatus::Initialized => f.write_str("initialized"),
        }
    }
}

/// Bootstrap status shared by every request handler.
///
/// Starts `Unconfigured`; the only transition is to `Initialized`, and it
/// happens at most once.
#[derive(Debug, Default)]
pub struct BootstrapState {
    status: AtomicU8,
}

impl BootstrapState {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(UNCONFIGURED),
        }
    }

    pub fn status(&self) -> BootstrapStatus {
        match self.status.load(Ordering::Acquire) {
            INITIALIZED => BootstrapStatus::Initialized,
            _ => BootstrapStatus::Unconfigured,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.status() == BootstrapStatus::Initialized
    }

    /// Flip to `Initialized`. Returns false if another caller already did.
    pub fn mark_initialized(&self) -> bool {
        self.status
            .compare_exchange(UNCONFIGURED, INITIALIZED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_single_forward_transition() {
        let state = BootstrapState::new();
        assert_eq!(state.status(), BootstrapStatus::Unconfigured);

        assert!(state.mark_initialized());
        assert!(state.is_initialized());
        assert!(!state.mark_initialized());
        assert!(state.is_initialized());
    }

    #[test]
    fn test_concurrent_flip_has_one_winner() {
        let state = Arc::new(BootstrapState::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || state.mark_initialized())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
