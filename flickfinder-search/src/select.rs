//! Choosing one photo out of a page of results.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

/// Picks which of the matching photos to show.
pub trait IndexSelector: Debug + Send + Sync {
    /// Choose an index in `0..len`, uniformly. `len` is never zero.
    fn select(&self, len: usize) -> usize;
}

/// Draws from the thread-local generator on every call. Not suitable for
/// anything that needs to be unpredictable to an attacker.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngSelector;

impl IndexSelector for ThreadRngSelector {
    fn select(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// A reproducible selector, for tests and debugging.
#[derive(Debug)]
pub struct SeededSelector(Mutex<StdRng>);

impl SeededSelector {
    /// Make a selector whose choices are fully determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl IndexSelector for SeededSelector {
    fn select(&self, len: usize) -> usize {
        // The generator has no invariant a panic elsewhere could break.
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0..len)
    }
}
