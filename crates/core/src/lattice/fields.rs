//! Population storage
//!
//! Distribution functions live in one contiguous `Vec<f64>` holding nine
//! direction planes back to back. Inside a plane nodes are stored x-major:
//! node `(i, j)` sits at `i * ny + j` where `ny` is the padded node count
//! along y. Plane-major layout lets every stage hand whole planes to rayon.

use super::geometry::Q;
use rayon::prelude::*;

/// Nine direction planes of a D2Q9 population over the node grid
#[derive(Debug, Clone)]
pub struct PopulationField {
    /// Values in plane-major, then x-major order
    data: Vec<f64>,
    /// Node count along x (`nx + 1`)
    width: usize,
    /// Node count along y (`ny + 1`)
    height: usize,
}

impl PopulationField {
    /// Create a field with every population set to `value`
    ///
    /// # Arguments
    ///
    /// * `width` - Node count along x
    /// * `height` - Node count along y
    /// * `value` - Initial value of every population
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; Q * width * height],
            width,
            height,
        }
    }

    /// Create a zero-initialised field
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, 0.0)
    }

    /// Node count along x
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Node count along y
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of nodes in one direction plane
    #[inline]
    #[must_use]
    pub fn plane_len(&self) -> usize {
        self.width * self.height
    }

    /// Flat index of node `(i, j)` inside a plane
    #[inline(always)]
    #[must_use]
    pub fn node(&self, i: usize, j: usize) -> usize {
        i * self.height + j
    }

    /// Population `d` at node `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics if the direction or the node is out of bounds
    #[inline(always)]
    #[must_use]
    pub fn get(&self, d: usize, i: usize, j: usize) -> f64 {
        debug_assert!(d < Q && i < self.width && j < self.height);
        self.data[d * self.plane_len() + self.node(i, j)]
    }

    /// Set population `d` at node `(i, j)`
    #[inline(always)]
    pub fn set(&mut self, d: usize, i: usize, j: usize, value: f64) {
        debug_assert!(d < Q && i < self.width && j < self.height);
        let idx = d * self.plane_len() + self.node(i, j);
        self.data[idx] = value;
    }

    /// All nine populations at node `(i, j)`
    #[must_use]
    pub fn node_populations(&self, i: usize, j: usize) -> [f64; Q] {
        let mut out = [0.0; Q];
        for (d, value) in out.iter_mut().enumerate() {
            *value = self.get(d, i, j);
        }
        out
    }

    /// Overwrite all nine populations at node `(i, j)`
    pub fn set_node_populations(&mut self, i: usize, j: usize, values: &[f64; Q]) {
        for (d, &value) in values.iter().enumerate() {
            self.set(d, i, j, value);
        }
    }

    /// Read-only view of direction plane `d`
    #[must_use]
    pub fn plane(&self, d: usize) -> &[f64] {
        let len = self.plane_len();
        &self.data[d * len..(d + 1) * len]
    }

    /// Whole storage, plane-major
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable whole storage, plane-major
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Parallel iterator over `(direction, plane)` pairs
    pub fn par_planes_mut(&mut self) -> impl IndexedParallelIterator<Item = (usize, &mut [f64])> {
        let len = self.plane_len();
        self.data.par_chunks_mut(len).enumerate()
    }

    /// Copy every value from `other`, which must share the same dimensions
    pub fn copy_from(&mut self, other: &PopulationField) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        self.data.copy_from_slice(&other.data);
    }

    /// Fill every population with `value`
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }
}
