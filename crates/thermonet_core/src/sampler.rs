//! Inverse-CDF weighted sampling over index sets.
//!
//! Two flavours are used by edge construction:
//! - [`FenwickSampler`] keeps a binary indexed tree of weights so both a draw and a
//!   weight change cost O(log N). It backs the per-node quota draw, whose weights
//!   change after every accepted edge.
//! - [`prefix_sample`] builds a prefix-sum array over a one-off weight row and
//!   binary searches it, O(N) build and O(log N) search.

use rand::Rng;

/// Weighted sampling over `0..len` with O(log N) draws and updates.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use thermonet_core::sampler::FenwickSampler;
///
/// let mut sampler = FenwickSampler::from_weights(&[0.0, 2.0, 0.0]);
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// assert_eq!(sampler.sample(&mut rng), Some(1));
/// sampler.set(1, 0.0);
/// assert_eq!(sampler.sample(&mut rng), None);
/// ```
#[derive(Debug, Clone)]
pub struct FenwickSampler {
    tree: Vec<f64>,
    weights: Vec<f64>,
}

impl FenwickSampler {
    pub fn new(len: usize) -> Self {
        Self {
            tree: vec![0.0; len + 1],
            weights: vec![0.0; len],
        }
    }

    pub fn from_weights(weights: &[f64]) -> Self {
        let len = weights.len();
        let mut tree = vec![0.0; len + 1];
        for (i, &w) in weights.iter().enumerate() {
            tree[i + 1] += w;
            let parent = (i + 1) + lowbit(i + 1);
            if parent <= len {
                tree[parent] += tree[i + 1];
            }
        }
        Self {
            tree,
            weights: weights.to_vec(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[inline]
    pub fn weight(&self, index: usize) -> f64 {
        self.weights[index]
    }

    /// Replaces the weight of `index`.
    pub fn set(&mut self, index: usize, weight: f64) {
        let delta = weight - self.weights[index];
        self.weights[index] = weight;
        let mut i = index + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += lowbit(i);
        }
    }

    /// Sum of all weights, read from the tree in O(log N).
    pub fn total(&self) -> f64 {
        self.prefix(self.len())
    }

    /// Sum of the first `count` weights.
    pub fn prefix(&self, count: usize) -> f64 {
        let mut i = count.min(self.len());
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree[i];
            i -= lowbit(i);
        }
        sum
    }

    /// Draws an index with probability proportional to its weight.
    ///
    /// Returns `None` when every weight is zero. Zero-weight indices are never
    /// returned, even under floating point drift in the tree.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        let seed = rng.gen::<f64>() * total;
        let index = self.search(seed);
        if self.weights[index] > 0.0 {
            Some(index)
        } else {
            // Fall back to the nearest positive weight.
            (index..self.len())
                .chain((0..index).rev())
                .find(|&i| self.weights[i] > 0.0)
        }
    }

    /// Smallest index whose cumulative weight exceeds `seed`.
    fn search(&self, mut seed: f64) -> usize {
        let len = self.len();
        let mut pos = 0;
        let mut step = len.next_power_of_two();
        while step > 0 {
            let next = pos + step;
            if next <= len && self.tree[next] <= seed {
                pos = next;
                seed -= self.tree[next];
            }
            step >>= 1;
        }
        pos.min(len - 1)
    }
}

#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

/// Draws an index from a weight row by prefix sums and binary search.
///
/// `scratch` is reused between calls to avoid reallocating the prefix array.
/// Returns `None` when the row has no positive weight.
pub fn prefix_sample<R: Rng>(weights: &[f64], scratch: &mut Vec<f64>, rng: &mut R) -> Option<usize> {
    scratch.clear();
    let mut acc = 0.0;
    for &w in weights {
        acc += w.max(0.0);
        scratch.push(acc);
    }
    if acc <= 0.0 {
        return None;
    }
    let seed = rng.gen::<f64>() * acc;
    let index = scratch.partition_point(|&c| c <= seed).min(weights.len() - 1);
    if weights[index] > 0.0 {
        Some(index)
    } else {
        (0..index).rev().find(|&i| weights[i] > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_fenwick_never_draws_zero_weight() {
        let sampler = FenwickSampler::from_weights(&[0.0, 1.0, 0.0, 3.0, 0.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            let i = sampler.sample(&mut rng).unwrap();
            assert!(i == 1 || i == 3);
        }
    }

    #[test]
    fn test_fenwick_frequencies_follow_weights() {
        let sampler = FenwickSampler::from_weights(&[1.0, 3.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let hits = (0..20_000)
            .filter(|_| sampler.sample(&mut rng) == Some(1))
            .count();
        let ratio = hits as f64 / 20_000.0;
        assert!((ratio - 0.75).abs() < 0.02, "ratio {}", ratio);
    }

    #[test]
    fn test_fenwick_set_matches_rebuild() {
        let mut sampler = FenwickSampler::new(6);
        for (i, w) in [4.0, 0.0, 2.0, 1.0, 0.0, 5.0].iter().enumerate() {
            sampler.set(i, *w);
        }
        sampler.set(0, 0.0);
        let rebuilt = FenwickSampler::from_weights(&[0.0, 0.0, 2.0, 1.0, 0.0, 5.0]);
        assert!((sampler.total() - rebuilt.total()).abs() < 1e-12);
        for seed in [0.0, 1.5, 2.0, 2.5, 3.0, 7.9] {
            assert_eq!(sampler.search(seed), rebuilt.search(seed));
        }
    }

    #[test]
    fn test_fenwick_prefix_tracks_updates() {
        let mut sampler = FenwickSampler::from_weights(&[1.0, 2.0, 0.5, 4.0, 0.0, 3.0, 2.5]);
        sampler.set(3, 1.0);
        sampler.set(6, 0.0);
        sampler.set(4, 2.0);
        let weights = [1.0, 2.0, 0.5, 1.0, 2.0, 3.0, 0.0];
        let mut running = 0.0;
        for (count, w) in weights.iter().enumerate() {
            assert!((sampler.prefix(count) - running).abs() < 1e-12);
            running += w;
        }
        assert!((sampler.total() - 9.5).abs() < 1e-12);
        assert!((sampler.prefix(100) - 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_fenwick_cleared_weights_draw_nothing() {
        let mut sampler = FenwickSampler::from_weights(&[0.1, 0.2, 0.3]);
        for i in 0..3 {
            sampler.set(i, 0.0);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(sampler.sample(&mut rng), None);
    }

    #[test]
    fn test_fenwick_empty_weights() {
        let sampler = FenwickSampler::new(4);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(sampler.sample(&mut rng), None);
    }

    #[test]
    fn test_prefix_sample_skips_zero_weights() {
        let mut scratch = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let weights = [0.0, 0.0, 2.0, 0.0];
        for _ in 0..100 {
            assert_eq!(prefix_sample(&weights, &mut scratch, &mut rng), Some(2));
        }
        assert_eq!(prefix_sample(&[0.0, 0.0], &mut scratch, &mut rng), None);
    }
}
