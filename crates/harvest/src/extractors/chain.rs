// ABOUTME: Generic ordered fallback chain over independent extraction strategies.
// ABOUTME: Strategies are tried in order and the first one that produces a value wins.

//! Ordered fallback chains.
//!
//! Every "try pattern A, else B, else C" cascade in the harvester is a
//! [`FallbackChain`] of [`Strategy`] trait objects. New strategies are appended
//! without touching existing ones, and each one can be tested on its own.

use std::fmt;

/// One independent way of extracting an `O` from an `I`.
pub trait Strategy<I: ?Sized, O>: Send + Sync {
    /// Short stable name used in logs.
    fn name(&self) -> &'static str;

    /// Returns `None` when this strategy found nothing usable.
    fn try_extract(&self, input: &I) -> Option<O>;
}

/// An ordered list of strategies. Only the first success is used.
pub struct FallbackChain<I: ?Sized, O> {
    label: &'static str,
    strategies: Vec<Box<dyn Strategy<I, O>>>,
}

impl<I: ?Sized, O> FallbackChain<I, O> {
    /// Create an empty chain. `label` identifies the chain in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy at the lowest priority.
    pub fn with(mut self, strategy: impl Strategy<I, O> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Append an already boxed strategy at the lowest priority.
    pub fn push(&mut self, strategy: Box<dyn Strategy<I, O>>) {
        self.strategies.push(strategy);
    }

    /// Names of the strategies in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies in order, stopping at the first that yields a value.
    pub fn run(&self, input: &I) -> Option<O> {
        self.run_named(input).map(|(_, out)| out)
    }

    /// Like [`run`](Self::run) but also reports which strategy won.
    pub fn run_named(&self, input: &I) -> Option<(&'static str, O)> {
        for strategy in &self.strategies {
            if let Some(out) = strategy.try_extract(input) {
                tracing::debug!(chain = self.label, strategy = strategy.name(), "strategy matched");
                return Some((strategy.name(), out));
            }
            tracing::trace!(chain = self.label, strategy = strategy.name(), "strategy yielded nothing");
        }
        tracing::debug!(chain = self.label, "all strategies exhausted");
        None
    }
}

impl<I: ?Sized, O> fmt::Debug for FallbackChain<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("label", &self.label)
            .field("strategies", &self.names())
            .finish()
    }
}
