//! Equilibrium distribution
//!
//! Second-order truncated Maxwell-Boltzmann expansion:
//! ```text
//! g_eq[d] = w_d ρ (1 + (c_d·u)/cs² + (c_d·u)²/(2cs⁴) − |u|²/(2cs²))
//! ```
//! With cs² = 1/3 the factors reduce to 3, 4.5 and 1.5.

use super::fields::PopulationField;
use super::geometry::{velocity, CS2, WEIGHTS};
use super::Vec2;
use rayon::prelude::*;

/// Equilibrium population of direction `d` for a single node
#[inline(always)]
pub fn equilibrium(d: usize, rho: f64, u: &Vec2) -> f64 {
    let (cx, cy) = velocity(d);
    let cu = cx * u.x + cy * u.y;
    let usq = u.norm_squared();
    WEIGHTS[d] * rho * (1.0 + cu / CS2 + cu * cu / (2.0 * CS2 * CS2) - usq / (2.0 * CS2))
}

/// Fill `g_eq` from the macroscopic fields at every node, boundary included
///
/// # Arguments
///
/// * `rho` - Density per node, x-major
/// * `u` - Velocity per node, x-major
/// * `g_eq` - Output equilibrium populations
pub fn compute_equilibrium(rho: &[f64], u: &[Vec2], g_eq: &mut PopulationField) {
    debug_assert_eq!(rho.len(), g_eq.plane_len());
    debug_assert_eq!(u.len(), g_eq.plane_len());

    g_eq.par_planes_mut().for_each(|(d, plane)| {
        for ((out, &r), vel) in plane.iter_mut().zip(rho).zip(u) {
            *out = equilibrium(d, r, vel);
        }
    });
}
