//! Utility functions for the gridrl crate

use rand::{Rng, distr::StandardUniform, prelude::IndexedRandom};

/// Performs weighted random sampling from a collection of items.
///
/// Generates a random threshold in `[0, total)` and walks the items,
/// subtracting weights until the threshold crosses zero.
///
/// # Behavior
///
/// - If the items slice is empty, returns `None`
/// - If all weights are zero or negative, falls back to uniform selection
/// - The last item is returned as a fallback if the threshold never crosses
///   zero (numerical stability)
pub fn weighted_sample<R, T>(rng: &mut R, items: &[(T, f64)]) -> Option<T>
where
    R: Rng,
    T: Clone,
{
    if items.is_empty() {
        return None;
    }

    let total: f64 = items.iter().map(|(_, w)| *w).sum();

    if !total.is_finite() || total <= 0.0 {
        return items.choose(rng).map(|(item, _)| item.clone());
    }

    let mut threshold = rng.sample::<f64, _>(StandardUniform) * total;

    for (item, weight) in items {
        if threshold < *weight {
            return Some(item.clone());
        }
        threshold -= *weight;
    }

    items.last().map(|(item, _)| item.clone())
}
