//! Flush gating for the partial-commit write path.
//!
//! Folding the workspace into the Merkle tree rewrites every touched
//! directory, so it is amortized across many writes: each staged write asks
//! a [`FlushDecider`] whether to fold now. The production decider is a
//! uniform coin weighted by the repo's partial-commit ratio; deterministic
//! deciders ship for tests and embedders that manage folding themselves.

use rand::Rng;

/// Decides whether a single staged write should fold the workspace.
pub trait FlushDecider: Send + Sync {
    /// `ratio` is the repo's partial-commit ratio in [0, 1].
    fn should_flush(&self, ratio: f64) -> bool;
}

/// Flush with probability `ratio`: draw a uniform number in [0, 1) and
/// fold when it falls below the ratio.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomFlush;

impl FlushDecider for RandomFlush {
    fn should_flush(&self, ratio: f64) -> bool {
        rand::thread_rng().gen::<f64>() < ratio
    }
}

/// Never fold on write. Listings and commits still force folds.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverFlush;

impl FlushDecider for NeverFlush {
    fn should_flush(&self, _ratio: f64) -> bool {
        false
    }
}

/// Fold after every staged write.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysFlush;

impl FlushDecider for AlwaysFlush {
    fn should_flush(&self, _ratio: f64) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_flush_honors_ratio_bounds() {
        let decider = RandomFlush;
        for _ in 0..200 {
            assert!(!decider.should_flush(0.0));
            assert!(decider.should_flush(1.0));
        }
    }

    #[test]
    fn deterministic_deciders() {
        assert!(!NeverFlush.should_flush(1.0));
        assert!(AlwaysFlush.should_flush(0.0));
    }
}
