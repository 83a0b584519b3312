// Events emitted by the engine as components load and fail
//
// The loader broadcasts these on a tokio channel; any interested party
// (the render command, tests, future panels) subscribes. This replaces
// the original's custom DOM events dispatched on the document.

use serde::{Deserialize, Serialize};

/// Application-level lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AppEvent {
    /// Initialization finished; carries the final membership lists
    ComponentsLoaded {
        loaded: Vec<String>,
        failed: Vec<String>,
    },

    /// A single component finished loading
    ComponentReady { name: String },

    /// A single component failed; the message is the routed error
    ComponentFailed { name: String, message: String },
}

/// Loading statistics derived from the loader's membership sets.
/// Pending is computed, never tracked, so the identity
/// `loaded + failed + pending == total` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingStats {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    pub pending: usize,
}

impl LoadingStats {
    pub fn derive(total: usize, loaded: usize, failed: usize) -> Self {
        Self {
            total,
            loaded,
            failed,
            pending: total.saturating_sub(loaded + failed),
        }
    }

    /// Percentage of declared components that loaded successfully
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.loaded as f64 / self.total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_identity_holds() {
        let stats = LoadingStats::derive(5, 3, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.loaded + stats.failed + stats.pending, stats.total);
    }

    #[test]
    fn test_pending_cannot_go_negative() {
        let stats = LoadingStats::derive(2, 2, 1);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(LoadingStats::derive(0, 0, 0).success_rate(), 0.0);
        assert_eq!(LoadingStats::derive(4, 3, 1).success_rate(), 75.0);
    }
}
