//! Zou-He velocity boundary closure
//!
//! After streaming, every perimeter node misses the populations that would
//! have come from outside the grid. Each closure rebuilds them from the
//! prescribed wall velocity and the local mass/momentum balance
//! (non-equilibrium bounce-back plus a tangential momentum correction), and
//! writes the closed node's density and velocity back to the macroscopic
//! fields.
//!
//! Edges are closed on their interior nodes first; corners then extrapolate
//! velocity and density from the neighbouring node of the horizontal wall,
//! close the axis and outward diagonal unknowns by bounce-back and split the
//! remaining mass evenly between the two buried diagonals.
//!
//! Direction numbering (see [`super::geometry`]):
//! ```text
//!   7   3   5
//!     \ | /
//!   2 - 0 - 1
//!     / | \
//!   6   4   8
//! ```

use super::fields::PopulationField;
use super::geometry::{Q, UNSET};
use super::Vec2;
use crate::error::{BoundarySegment, LatticeError};

const TWO_THIRDS: f64 = 2.0 / 3.0;
const ONE_SIXTH: f64 = 1.0 / 6.0;

/// Prescribed velocity along each wall
///
/// `bottom` and `top` are indexed by `i`, `left` and `right` by `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct WallVelocities {
    /// Velocity along `j = 0`
    pub bottom: Vec<Vec2>,
    /// Velocity along `j = ly`
    pub top: Vec<Vec2>,
    /// Velocity along `i = 0`
    pub left: Vec<Vec2>,
    /// Velocity along `i = lx`
    pub right: Vec<Vec2>,
}

impl WallVelocities {
    /// Stationary walls everywhere
    ///
    /// # Arguments
    ///
    /// * `width` - Node count along x
    /// * `height` - Node count along y
    #[must_use]
    pub fn no_slip(width: usize, height: usize) -> Self {
        Self {
            bottom: vec![Vec2::zeros(); width],
            top: vec![Vec2::zeros(); width],
            left: vec![Vec2::zeros(); height],
            right: vec![Vec2::zeros(); height],
        }
    }

    /// Lid-driven cavity: tangential velocity on each wall, no penetration
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - Node counts
    /// * `top` - x-velocity of the lid
    /// * `bottom` - x-velocity of the bottom wall
    /// * `left` - y-velocity of the left wall
    /// * `right` - y-velocity of the right wall
    #[must_use]
    pub fn cavity(width: usize, height: usize, top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            bottom: vec![Vec2::new(bottom, 0.0); width],
            top: vec![Vec2::new(top, 0.0); width],
            left: vec![Vec2::new(0.0, left); height],
            right: vec![Vec2::new(0.0, right); height],
        }
    }
}

/// Macroscopic fields touched by the closures, x-major like the populations
pub(crate) struct NodeFields<'a> {
    pub rho: &'a mut [f64],
    pub u: &'a mut [Vec2],
    /// Node count along y, the stride of the x-major layout
    pub height: usize,
}

impl NodeFields<'_> {
    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        i * self.height + j
    }
}

/// Run the eight closures in their fixed order
pub(crate) fn apply_zou_he(g: &mut PopulationField, fields: &mut NodeFields<'_>, walls: &WallVelocities) {
    zou_he_bottom_wall(g, fields, walls);
    zou_he_left_wall(g, fields, walls);
    zou_he_right_wall(g, fields, walls);
    zou_he_top_wall(g, fields, walls);
    zou_he_bottom_left_corner(g, fields);
    zou_he_top_left_corner(g, fields);
    zou_he_top_right_corner(g, fields);
    zou_he_bottom_right_corner(g, fields);
}

pub(crate) fn zou_he_bottom_wall(g: &mut PopulationField, fields: &mut NodeFields<'_>, walls: &WallVelocities) {
    let lx = g.width() - 1;
    let j = 0;
    for i in 1..lx {
        let vel = walls.bottom[i];
        let f = g.node_populations(i, j);
        let rho = (f[0] + f[1] + f[2] + 2.0 * (f[4] + f[6] + f[8])) / (1.0 - vel.y);

        g.set(3, i, j, f[4] + TWO_THIRDS * rho * vel.y);
        g.set(
            5,
            i,
            j,
            f[6] - 0.5 * (f[1] - f[2]) + 0.5 * rho * vel.x + ONE_SIXTH * rho * vel.y,
        );
        g.set(
            7,
            i,
            j,
            f[8] + 0.5 * (f[1] - f[2]) - 0.5 * rho * vel.x + ONE_SIXTH * rho * vel.y,
        );

        let n = fields.idx(i, j);
        fields.rho[n] = rho;
        fields.u[n] = vel;
    }
}

pub(crate) fn zou_he_top_wall(g: &mut PopulationField, fields: &mut NodeFields<'_>, walls: &WallVelocities) {
    let lx = g.width() - 1;
    let j = g.height() - 1;
    for i in 1..lx {
        let vel = walls.top[i];
        let f = g.node_populations(i, j);
        let rho = (f[0] + f[1] + f[2] + 2.0 * (f[3] + f[5] + f[7])) / (1.0 + vel.y);

        g.set(4, i, j, f[3] - TWO_THIRDS * rho * vel.y);
        g.set(
            6,
            i,
            j,
            f[5] + 0.5 * (f[1] - f[2]) - 0.5 * rho * vel.x - ONE_SIXTH * rho * vel.y,
        );
        g.set(
            8,
            i,
            j,
            f[7] - 0.5 * (f[1] - f[2]) + 0.5 * rho * vel.x - ONE_SIXTH * rho * vel.y,
        );

        let n = fields.idx(i, j);
        fields.rho[n] = rho;
        fields.u[n] = vel;
    }
}

pub(crate) fn zou_he_left_wall(g: &mut PopulationField, fields: &mut NodeFields<'_>, walls: &WallVelocities) {
    let ly = g.height() - 1;
    let i = 0;
    for j in 1..ly {
        let vel = walls.left[j];
        let f = g.node_populations(i, j);
        let rho = (f[0] + f[3] + f[4] + 2.0 * (f[2] + f[6] + f[7])) / (1.0 - vel.x);

        g.set(1, i, j, f[2] + TWO_THIRDS * rho * vel.x);
        g.set(
            5,
            i,
            j,
            f[6] - 0.5 * (f[3] - f[4]) + ONE_SIXTH * rho * vel.x + 0.5 * rho * vel.y,
        );
        g.set(
            8,
            i,
            j,
            f[7] + 0.5 * (f[3] - f[4]) + ONE_SIXTH * rho * vel.x - 0.5 * rho * vel.y,
        );

        let n = fields.idx(i, j);
        fields.rho[n] = rho;
        fields.u[n] = vel;
    }
}

pub(crate) fn zou_he_right_wall(g: &mut PopulationField, fields: &mut NodeFields<'_>, walls: &WallVelocities) {
    let i = g.width() - 1;
    let ly = g.height() - 1;
    for j in 1..ly {
        let vel = walls.right[j];
        let f = g.node_populations(i, j);
        let rho = (f[0] + f[3] + f[4] + 2.0 * (f[1] + f[5] + f[8])) / (1.0 + vel.x);

        g.set(2, i, j, f[1] - TWO_THIRDS * rho * vel.x);
        g.set(
            6,
            i,
            j,
            f[5] + 0.5 * (f[3] - f[4]) - ONE_SIXTH * rho * vel.x - 0.5 * rho * vel.y,
        );
        g.set(
            7,
            i,
            j,
            f[8] - 0.5 * (f[3] - f[4]) - ONE_SIXTH * rho * vel.x + 0.5 * rho * vel.y,
        );

        let n = fields.idx(i, j);
        fields.rho[n] = rho;
        fields.u[n] = vel;
    }
}

/// Copy density and velocity from the edge neighbour `(ni, j)` onto the corner `(i, j)`
fn extrapolate_corner(fields: &mut NodeFields<'_>, i: usize, j: usize, ni: usize) -> (f64, Vec2) {
    let src = fields.idx(ni, j);
    let dst = fields.idx(i, j);
    let (rho, vel) = (fields.rho[src], fields.u[src]);
    fields.rho[dst] = rho;
    fields.u[dst] = vel;
    (rho, vel)
}

/// Close a corner node given its three bounce-back unknowns and two buried diagonals
fn close_corner(
    g: &mut PopulationField,
    i: usize,
    j: usize,
    rho: f64,
    closed: [(usize, f64); 3],
    buried: [usize; 2],
) {
    let mut f = g.node_populations(i, j);
    for (d, value) in closed {
        f[d] = value;
    }
    let known: f64 = (0..Q)
        .filter(|d| !buried.contains(d))
        .map(|d| f[d])
        .sum();
    let share = 0.5 * (rho - known);
    f[buried[0]] = share;
    f[buried[1]] = share;
    g.set_node_populations(i, j, &f);
}

pub(crate) fn zou_he_bottom_left_corner(g: &mut PopulationField, fields: &mut NodeFields<'_>) {
    let (i, j) = (0, 0);
    let (rho, vel) = extrapolate_corner(fields, i, j, 1);
    let f = g.node_populations(i, j);
    close_corner(
        g,
        i,
        j,
        rho,
        [
            (1, f[2] + TWO_THIRDS * rho * vel.x),
            (3, f[4] + TWO_THIRDS * rho * vel.y),
            (5, f[6] + ONE_SIXTH * rho * (vel.x + vel.y)),
        ],
        [7, 8],
    );
}

pub(crate) fn zou_he_top_left_corner(g: &mut PopulationField, fields: &mut NodeFields<'_>) {
    let (i, j) = (0, g.height() - 1);
    let (rho, vel) = extrapolate_corner(fields, i, j, 1);
    let f = g.node_populations(i, j);
    close_corner(
        g,
        i,
        j,
        rho,
        [
            (1, f[2] + TWO_THIRDS * rho * vel.x),
            (4, f[3] - TWO_THIRDS * rho * vel.y),
            (8, f[7] + ONE_SIXTH * rho * (vel.x - vel.y)),
        ],
        [5, 6],
    );
}

pub(crate) fn zou_he_top_right_corner(g: &mut PopulationField, fields: &mut NodeFields<'_>) {
    let (i, j) = (g.width() - 1, g.height() - 1);
    let (rho, vel) = extrapolate_corner(fields, i, j, i - 1);
    let f = g.node_populations(i, j);
    close_corner(
        g,
        i,
        j,
        rho,
        [
            (2, f[1] - TWO_THIRDS * rho * vel.x),
            (4, f[3] - TWO_THIRDS * rho * vel.y),
            (6, f[5] - ONE_SIXTH * rho * (vel.x + vel.y)),
        ],
        [7, 8],
    );
}

pub(crate) fn zou_he_bottom_right_corner(g: &mut PopulationField, fields: &mut NodeFields<'_>) {
    let (i, j) = (g.width() - 1, 0);
    let (rho, vel) = extrapolate_corner(fields, i, j, i - 1);
    let f = g.node_populations(i, j);
    close_corner(
        g,
        i,
        j,
        rho,
        [
            (2, f[1] - TWO_THIRDS * rho * vel.x),
            (3, f[4] + TWO_THIRDS * rho * vel.y),
            (7, f[8] + ONE_SIXTH * rho * (vel.y - vel.x)),
        ],
        [5, 6],
    );
}

/// Direction slots that streaming leaves unset, per segment
///
/// Edges list the three inward directions of the wall; corners the five
/// populations that come from outside the grid.
pub const INCOMING: [(BoundarySegment, &[usize]); 8] = [
    (BoundarySegment::Bottom, &[3, 5, 7]),
    (BoundarySegment::Top, &[4, 6, 8]),
    (BoundarySegment::Left, &[1, 5, 8]),
    (BoundarySegment::Right, &[2, 6, 7]),
    (BoundarySegment::BottomLeft, &[1, 3, 5, 7, 8]),
    (BoundarySegment::TopLeft, &[1, 4, 5, 6, 8]),
    (BoundarySegment::TopRight, &[2, 4, 6, 7, 8]),
    (BoundarySegment::BottomRight, &[2, 3, 5, 6, 7]),
];

/// Nodes of a segment, in scan order
pub fn segment_nodes(segment: BoundarySegment, width: usize, height: usize) -> Vec<(usize, usize)> {
    let (lx, ly) = (width - 1, height - 1);
    match segment {
        BoundarySegment::Bottom => (1..lx).map(|i| (i, 0)).collect(),
        BoundarySegment::Top => (1..lx).map(|i| (i, ly)).collect(),
        BoundarySegment::Left => (1..ly).map(|j| (0, j)).collect(),
        BoundarySegment::Right => (1..ly).map(|j| (lx, j)).collect(),
        BoundarySegment::BottomLeft => vec![(0, 0)],
        BoundarySegment::TopLeft => vec![(0, ly)],
        BoundarySegment::TopRight => vec![(lx, ly)],
        BoundarySegment::BottomRight => vec![(lx, 0)],
    }
}

/// Check that no incoming perimeter population still holds the sentinel
///
/// Scans every (direction, segment) pair of [`INCOMING`], which covers the
/// twelve (direction, wall) combinations of the cavity including the corner
/// nodes.
///
/// # Errors
///
/// Returns `UnclosedBoundary` for the first offending pair, with the range of
/// offending nodes along that segment.
pub fn verify_closure(g: &PopulationField, iteration: u64) -> Result<(), LatticeError> {
    for (segment, directions) in INCOMING {
        let nodes = segment_nodes(segment, g.width(), g.height());
        for &direction in directions {
            let mut unset = nodes
                .iter()
                .copied()
                .filter(|&(i, j)| g.get(direction, i, j) == UNSET);
            if let Some(first) = unset.next() {
                let last = unset.last().unwrap_or(first);
                return Err(LatticeError::UnclosedBoundary {
                    direction,
                    segment,
                    first,
                    last,
                    iteration,
                });
            }
        }
    }
    Ok(())
}
