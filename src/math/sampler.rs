//! Weighted random selection over integer weights
//!
//! Each draw takes a uniform value in `[0, total)` and returns the item whose
//! cumulative weight interval contains it. Draws are independent; the sampler
//! holds no state between calls.

use rand::Rng;
use std::fmt;

/// Reasons a weight set cannot be sampled from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerError {
    /// No items were supplied
    Empty,
    /// Every supplied weight is zero
    ZeroTotalWeight,
}

impl fmt::Display for SamplerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("weight set is empty"),
            Self::ZeroTotalWeight => f.write_str("every weight is zero"),
        }
    }
}

impl std::error::Error for SamplerError {}

/// Items paired with cumulative weight bounds
#[derive(Debug, Clone)]
pub struct WeightedSampler<T> {
    items: Vec<T>,
    /// Exclusive upper bound of each item's interval
    cumulative: Vec<u64>,
    total: u64,
}

impl<T> WeightedSampler<T> {
    /// Build a sampler from `(item, weight)` pairs
    ///
    /// Zero-weight items are kept but can never be drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if no pairs are given or all weights are zero
    pub fn new<I>(pairs: I) -> Result<Self, SamplerError>
    where
        I: IntoIterator<Item = (T, u32)>,
    {
        let mut items = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0u64;

        for (item, weight) in pairs {
            total += u64::from(weight);
            items.push(item);
            cumulative.push(total);
        }

        if items.is_empty() {
            return Err(SamplerError::Empty);
        }
        if total == 0 {
            return Err(SamplerError::ZeroTotalWeight);
        }

        Ok(Self {
            items,
            cumulative,
            total,
        })
    }

    /// Draw one item with probability proportional to its weight
    // partition_point over cumulative bounds is always below items.len()
    #[allow(clippy::indexing_slicing)]
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        &self.items[self.pick_index(rng)]
    }

    /// Draw the index of one item with probability proportional to its weight
    pub fn pick_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let draw = rng.random_range(0..self.total);
        self.cumulative.partition_point(|&bound| bound <= draw)
    }

    /// Sum of all weights
    pub const fn total_weight(&self) -> u64 {
        self.total
    }

    /// Number of items, including zero-weight ones
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; construction rejects empty sets
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in insertion order
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Weight of the item at `index`
    pub fn weight(&self, index: usize) -> u64 {
        let upper = self.cumulative.get(index).copied().unwrap_or(0);
        let lower = index
            .checked_sub(1)
            .and_then(|previous| self.cumulative.get(previous))
            .copied()
            .unwrap_or(0);
        upper.saturating_sub(lower)
    }

    /// Probability of drawing the item at `index`
    pub fn probability(&self, index: usize) -> f64 {
        self.weight(index) as f64 / self.total as f64
    }
}
