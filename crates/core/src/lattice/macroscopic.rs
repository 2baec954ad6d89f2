//! Macroscopic recovery
//!
//! Density and velocity are the zeroth and first moments of the population:
//! `ρ = Σ g[d]`, `ρu = Σ g[d] c_d`.

use super::fields::PopulationField;
use super::geometry::{velocity, Q};
use super::Vec2;
use crate::error::LatticeError;
use rayon::prelude::*;

/// Recover `rho` and `u` from `g` at every node
///
/// Columns (fixed `i`) are processed in parallel.
///
/// # Errors
///
/// Returns `Diverged` for the first node (in x-major order) whose density is
/// non-positive or not finite. Fields of other columns may already have been
/// overwritten when that happens; the run is over either way.
pub fn recover_macroscopic(
    g: &PopulationField,
    rho: &mut [f64],
    u: &mut [Vec2],
    iteration: u64,
) -> Result<(), LatticeError> {
    let height = g.height();
    let planes: Vec<&[f64]> = (0..Q).map(|d| g.plane(d)).collect();

    let failure = rho
        .par_chunks_mut(height)
        .zip(u.par_chunks_mut(height))
        .enumerate()
        .filter_map(|(i, (rho_col, u_col))| {
            let mut first_bad = None;
            for j in 0..height {
                let n = i * height + j;
                let mut density = 0.0;
                let mut momentum = Vec2::zeros();
                for (d, plane) in planes.iter().enumerate() {
                    let value = plane[n];
                    let (cx, cy) = velocity(d);
                    density += value;
                    momentum.x += cx * value;
                    momentum.y += cy * value;
                }

                rho_col[j] = density;
                if !(density.is_finite() && density > 0.0) {
                    if first_bad.is_none() {
                        first_bad = Some((i, j, density));
                    }
                    u_col[j] = Vec2::zeros();
                    continue;
                }
                u_col[j] = momentum / density;
            }
            first_bad
        })
        .min_by_key(|&(i, j, _)| (i, j));

    match failure {
        Some((i, j, rho)) => Err(LatticeError::Diverged {
            i,
            j,
            rho,
            iteration,
        }),
        None => Ok(()),
    }
}

/// Total mass `Σ ρ` over the grid
pub fn total_mass(rho: &[f64]) -> f64 {
    rho.par_iter().sum()
}
