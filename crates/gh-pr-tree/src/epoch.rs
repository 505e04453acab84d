//! Root-set generations
//!
//! Every root rebuild bumps the shared epoch. Nodes remember the epoch they
//! were born in, and an async child fetch that completes after a newer
//! rebuild sees a mismatch and drops its result instead of installing it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared generation counter
#[derive(Debug, Clone, Default)]
pub struct TreeEpoch(Arc<AtomicU64>);

impl TreeEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return it
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Whether something born in `born` still belongs to the live generation
    pub fn is_current(&self, born: u64) -> bool {
        self.current() == born
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_invalidates_older_generations() {
        let epoch = TreeEpoch::new();
        let shared = epoch.clone();
        assert_eq!(epoch.current(), 0);

        let first = epoch.bump();
        assert!(shared.is_current(first));

        let second = shared.bump();
        assert_eq!(second, first + 1);
        assert!(!epoch.is_current(first));
        assert!(epoch.is_current(second));
    }
}
