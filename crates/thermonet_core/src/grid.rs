//! Periodic grid geometry.
//!
//! Node indices are expanded into base-`edge` digits (most significant axis first)
//! and distances wrap around every axis, so the grid is a D-torus without
//! boundary nodes.

use thermonet_data::{NodeId, Parity};

/// Coordinates and cached all-pairs periodic L1 distances of a D-torus.
///
/// # Performance Characteristics
/// - Construction: O(N^2 * D) for the metric, computed once
/// - Distance lookup: O(1)
/// - Memory: O(N^2) `u16` entries
///
/// # Examples
/// ```
/// use thermonet_core::grid::GridTopology;
///
/// let grid = GridTopology::new(4, 2);
/// assert_eq!(grid.coordinates(5), &[1, 1]);
/// assert_eq!(grid.distance(0, 3), 1); // wraps around the first axis
/// ```
#[derive(Debug, Clone)]
pub struct GridTopology {
    edge: usize,
    dimension: usize,
    positions: usize,
    coordinates: Vec<usize>,
    metric: Vec<u16>,
}

impl GridTopology {
    pub fn new(edge: usize, dimension: usize) -> Self {
        let positions = edge.pow(dimension as u32);
        let mut coordinates = vec![0; positions * dimension];
        for index in 0..positions {
            let coords = &mut coordinates[index * dimension..(index + 1) * dimension];
            Self::decompose(index, edge, coords);
        }

        let mut metric = vec![0u16; positions * positions];
        for i in 0..positions {
            let ci = &coordinates[i * dimension..(i + 1) * dimension];
            for j in (i + 1)..positions {
                let cj = &coordinates[j * dimension..(j + 1) * dimension];
                let d = Self::periodic_distance(ci, cj, edge) as u16;
                metric[i * positions + j] = d;
                metric[j * positions + i] = d;
            }
        }

        Self {
            edge,
            dimension,
            positions,
            coordinates,
            metric,
        }
    }

    /// Mixed-radix expansion of `index` into `out` (most significant axis first).
    pub fn decompose(index: usize, edge: usize, out: &mut [usize]) {
        let mut position = index;
        for slot in out.iter_mut().rev() {
            *slot = position % edge;
            position /= edge;
        }
    }

    /// Sum over axes of `min(|a - b|, edge - |a - b|)`.
    #[inline]
    pub fn periodic_distance(a: &[usize], b: &[usize], edge: usize) -> usize {
        a.iter()
            .zip(b)
            .map(|(&x, &y)| {
                let raw = x.abs_diff(y);
                raw.min(edge - raw)
            })
            .sum()
    }

    #[inline]
    pub fn edge(&self) -> usize {
        self.edge
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions == 0
    }

    #[inline]
    pub fn coordinates(&self, node: NodeId) -> &[usize] {
        &self.coordinates[node * self.dimension..(node + 1) * self.dimension]
    }

    #[inline]
    pub fn distance(&self, i: NodeId, j: NodeId) -> usize {
        usize::from(self.metric[i * self.positions + j])
    }

    /// Parity of the coordinate sum.
    #[inline]
    pub fn parity(&self, node: NodeId) -> Parity {
        if self.coordinates(node).iter().sum::<usize>() % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    /// All nodes whose distance from `node` is in `distances`, in index order.
    pub fn nodes_at(&self, node: NodeId, distances: &[usize]) -> Vec<NodeId> {
        (0..self.positions)
            .filter(|&j| distances.contains(&self.distance(node, j)))
            .collect()
    }
}
