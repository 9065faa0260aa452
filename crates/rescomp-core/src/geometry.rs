//! Neuron placement and pool geometry
//!
//! Every reservoir neuron occupies one slot of a 3-D pool grid. The
//! placement record is immutable identity: it pins the neuron's pool,
//! its flat index within the pool, its global index within the
//! reservoir, and its grid coordinates. Synaptic transmission delays
//! are derived from Euclidean distances over these coordinates.

use rescomp_math::Float;

/// Immutable identity and 3-D position of one reservoir neuron
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeuronPlacement {
    /// Index of the owning pool within the reservoir
    pub pool_index: usize,
    /// Global index within the reservoir's neuron arena
    pub reservoir_index: usize,
    /// Flat index within the owning pool (raster order)
    pub pool_flat_index: usize,
    /// X coordinate within the pool grid
    pub x: usize,
    /// Y coordinate within the pool grid
    pub y: usize,
    /// Z coordinate within the pool grid
    pub z: usize,
}

impl NeuronPlacement {
    /// Grid coordinates as a floating-point triple
    pub fn coordinates(&self) -> [Float; 3] {
        [self.x as Float, self.y as Float, self.z as Float]
    }

    /// Euclidean distance to another placement
    pub fn distance_to(&self, other: &NeuronPlacement) -> Float {
        euclidean_distance(&self.coordinates(), &other.coordinates())
    }
}

/// Euclidean distance between two 3-D points
pub fn euclidean_distance(a: &[Float; 3], b: &[Float; 3]) -> Float {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Geometry of one pool's 3-D grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolGrid {
    /// Grid extent along X
    pub dim_x: usize,
    /// Grid extent along Y
    pub dim_y: usize,
    /// Grid extent along Z
    pub dim_z: usize,
}

impl PoolGrid {
    /// Number of neuron slots in the grid
    pub fn size(&self) -> usize {
        self.dim_x * self.dim_y * self.dim_z
    }

    /// Coordinates of a flat raster-order index (x fastest, then y, then z)
    pub fn coordinates_of(&self, flat_index: usize) -> (usize, usize, usize) {
        let x = flat_index % self.dim_x;
        let y = (flat_index / self.dim_x) % self.dim_y;
        let z = flat_index / (self.dim_x * self.dim_y);
        (x, y, z)
    }

    /// Geometric center of the grid; input fields are treated as
    /// located here for delay computation
    pub fn center(&self) -> [Float; 3] {
        [
            (self.dim_x.saturating_sub(1)) as Float / 2.0,
            (self.dim_y.saturating_sub(1)) as Float / 2.0,
            (self.dim_z.saturating_sub(1)) as Float / 2.0,
        ]
    }

    /// Largest possible distance between two slots (opposite corners).
    /// Zero for a single-slot grid.
    pub fn max_distance(&self) -> Float {
        let corner = [
            (self.dim_x.saturating_sub(1)) as Float,
            (self.dim_y.saturating_sub(1)) as Float,
            (self.dim_z.saturating_sub(1)) as Float,
        ];
        euclidean_distance(&[0.0, 0.0, 0.0], &corner)
    }
}

/// Derive an integer transmission delay from a distance.
///
/// Delay grows linearly with normalized distance up to `max_delay`.
/// A degenerate pool span (single slot) yields delay 0 rather than
/// dividing by zero.
pub fn delay_for_distance(distance: Float, max_pool_distance: Float, max_delay: usize) -> usize {
    if max_delay == 0 || max_pool_distance <= 0.0 {
        return 0;
    }
    let normalized = (distance / max_pool_distance).clamp(0.0, 1.0);
    (max_delay as Float * normalized).round() as usize
}
