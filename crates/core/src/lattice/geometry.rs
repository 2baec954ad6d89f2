//! D2Q9 lattice geometry
//!
//! Discrete velocity set, weights and derived constants shared by every stage
//! of the engine. Direction 0 is rest, 1-4 are the axis directions
//! (+x, -x, +y, -y) and 5-8 the diagonals, each paired with its opposite.

/// Number of discrete velocities
pub const Q: usize = 9;

/// Discrete velocities `(cx, cy)`
pub const VELOCITIES: [[i32; 2]; Q] = [
    [0, 0],
    [1, 0],
    [-1, 0],
    [0, 1],
    [0, -1],
    [1, 1],
    [-1, -1],
    [-1, 1],
    [1, -1],
];

/// Lattice weights, summing to 1
pub const WEIGHTS: [f64; Q] = [
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

/// Opposite direction of each velocity
pub const OPPOSITE: [usize; Q] = [0, 2, 1, 4, 3, 6, 5, 8, 7];

/// Lattice speed of sound squared
pub const CS2: f64 = 1.0 / 3.0;

/// TRT "magic" parameter Λ = (τ⁺ − ½)(τ⁻ − ½)
///
/// 1/4 cancels the third-order spatial error of the bounce-back family and
/// gives the best stability of the TRT scheme.
pub const MAGIC_LAMBDA: f64 = 0.25;

/// Reserved value marking a population that has not been written this step
pub const UNSET: f64 = -1.0;

/// Lattice speed of sound
#[inline]
pub fn sound_speed() -> f64 {
    CS2.sqrt()
}

/// Velocity of direction `d` as floats
#[inline(always)]
pub fn velocity(d: usize) -> (f64, f64) {
    let [cx, cy] = VELOCITIES[d];
    (f64::from(cx), f64::from(cy))
}
