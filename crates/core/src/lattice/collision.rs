//! Two-relaxation-time (TRT) collision
//!
//! Each population pair `(d, d̄)` is split into a symmetric part
//! `½(g[d] + g[d̄])` and an antisymmetric part `½(g[d] − g[d̄])`. The symmetric
//! deviation from equilibrium relaxes at `ω⁺ = 1/τ⁺` (sets the viscosity), the
//! antisymmetric one at `ω⁻ = 1/τ⁻`, with `τ⁻` tied to `τ⁺` through the magic
//! parameter Λ. The rest population is a pure BGK term at `ω⁺`.

use super::fields::PopulationField;
use super::geometry::{MAGIC_LAMBDA, OPPOSITE};
use crate::error::LatticeError;
use rayon::prelude::*;

/// Relaxation times and rates of the TRT operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relaxation {
    /// Symmetric relaxation time τ⁺ (the BGK τ)
    pub tau_plus: f64,
    /// Antisymmetric relaxation time τ⁻
    pub tau_minus: f64,
    /// 1/τ⁺
    pub omega_plus: f64,
    /// 1/τ⁻
    pub omega_minus: f64,
}

impl Relaxation {
    /// Derive both rates from τ⁺ with the default magic parameter
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `tau_plus <= 0.5` or is not finite
    pub fn from_tau(tau_plus: f64) -> Result<Self, LatticeError> {
        Self::with_magic(tau_plus, MAGIC_LAMBDA)
    }

    /// Derive both rates from τ⁺ and Λ = (τ⁺ − ½)(τ⁻ − ½)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `tau_plus <= 0.5`, or `lambda <= 0`
    pub fn with_magic(tau_plus: f64, lambda: f64) -> Result<Self, LatticeError> {
        if !tau_plus.is_finite() || tau_plus <= 0.5 {
            return Err(LatticeError::invalid_config(
                "tau_lbm",
                format!("must be finite and exceed 0.5, got {tau_plus}"),
            ));
        }
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(LatticeError::invalid_config(
                "magic_lambda",
                format!("must be finite and positive, got {lambda}"),
            ));
        }

        let tau_minus = lambda / (tau_plus - 0.5) + 0.5;
        Ok(Self {
            tau_plus,
            tau_minus,
            omega_plus: 1.0 / tau_plus,
            omega_minus: 1.0 / tau_minus,
        })
    }
}

/// Post-collision population of direction `d` at one node
#[inline(always)]
pub fn trt_population(d: usize, g: &[f64], g_eq: &[f64], relax: &Relaxation) -> f64 {
    if d == 0 {
        return g[0] - relax.omega_plus * (g[0] - g_eq[0]);
    }
    let o = OPPOSITE[d];
    let sym = 0.5 * (g[d] + g[o]) - 0.5 * (g_eq[d] + g_eq[o]);
    let asym = 0.5 * (g[d] - g[o]) - 0.5 * (g_eq[d] - g_eq[o]);
    g[d] - relax.omega_plus * sym - relax.omega_minus * asym
}

/// Apply TRT collision to every node
///
/// Reads `g` and `g_eq`, writes the post-collision population into `out`.
/// Direction planes are independent once the opposite plane is read, so the
/// sweep runs one plane per rayon task.
///
/// # Arguments
///
/// * `g` - Pre-collision populations
/// * `g_eq` - Equilibrium populations computed from the same state
/// * `relax` - Relaxation rates
/// * `out` - Post-collision populations
pub fn collide_trt(
    g: &PopulationField,
    g_eq: &PopulationField,
    relax: &Relaxation,
    out: &mut PopulationField,
) {
    out.par_planes_mut().for_each(|(d, plane)| {
        let o = OPPOSITE[d];
        let (gd, go) = (g.plane(d), g.plane(o));
        let (ed, eo) = (g_eq.plane(d), g_eq.plane(o));

        if d == 0 {
            for (n, value) in plane.iter_mut().enumerate() {
                *value = gd[n] - relax.omega_plus * (gd[n] - ed[n]);
            }
            return;
        }

        for (n, value) in plane.iter_mut().enumerate() {
            let sym = 0.5 * (gd[n] + go[n]) - 0.5 * (ed[n] + eo[n]);
            let asym = 0.5 * (gd[n] - go[n]) - 0.5 * (ed[n] - eo[n]);
            *value = gd[n] - relax.omega_plus * sym - relax.omega_minus * asym;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::equilibrium::equilibrium;
    use crate::lattice::geometry::{velocity, Q};
    use crate::lattice::Vec2;
    use approx::assert_relative_eq;

    #[test]
    fn test_tau_minus_follows_magic_parameter() {
        let relax = Relaxation::from_tau(0.68).unwrap();
        assert_relative_eq!(
            (relax.tau_plus - 0.5) * (relax.tau_minus - 0.5),
            MAGIC_LAMBDA,
            epsilon = 1e-14
        );
        assert_relative_eq!(relax.omega_plus, 1.0 / 0.68, epsilon = 1e-14);
    }

    #[test]
    fn test_unstable_tau_is_rejected() {
        assert!(matches!(
            Relaxation::from_tau(0.5),
            Err(LatticeError::InvalidConfig {
                parameter: "tau_lbm",
                ..
            })
        ));
        assert!(Relaxation::from_tau(0.3).is_err());
        assert!(Relaxation::from_tau(f64::NAN).is_err());
        assert!(Relaxation::with_magic(0.6, 0.0).is_err());
    }

    #[test]
    fn test_single_node_collision_conserves_moments() {
        let relax = Relaxation::from_tau(0.8).unwrap();
        let g = [0.43, 0.12, 0.10, 0.115, 0.105, 0.03, 0.025, 0.028, 0.027];
        let rho: f64 = g.iter().sum();
        let mut m = Vec2::zeros();
        for d in 0..Q {
            let (cx, cy) = velocity(d);
            m += Vec2::new(cx, cy) * g[d];
        }
        let u = m / rho;
        let g_eq: Vec<f64> = (0..Q).map(|d| equilibrium(d, rho, &u)).collect();

        let post: Vec<f64> = (0..Q).map(|d| trt_population(d, &g, &g_eq, &relax)).collect();
        let mut post_m = Vec2::zeros();
        for d in 0..Q {
            let (cx, cy) = velocity(d);
            post_m += Vec2::new(cx, cy) * post[d];
        }
        assert_relative_eq!(post.iter().sum::<f64>(), rho, epsilon = 1e-14);
        assert_relative_eq!(post_m.x, m.x, epsilon = 1e-14);
        assert_relative_eq!(post_m.y, m.y, epsilon = 1e-14);
    }

    #[test]
    fn test_field_collision_matches_node_formula() {
        let relax = Relaxation::from_tau(0.7).unwrap();
        let mut g = PopulationField::new(3, 2);
        let mut g_eq = PopulationField::new(3, 2);
        for (k, v) in g.as_mut_slice().iter_mut().enumerate() {
            *v = 0.1 + 0.001 * k as f64;
        }
        for (k, v) in g_eq.as_mut_slice().iter_mut().enumerate() {
            *v = 0.1 + 0.0007 * k as f64;
        }
        let mut out = PopulationField::new(3, 2);
        collide_trt(&g, &g_eq, &relax, &mut out);

        for i in 0..3 {
            for j in 0..2 {
                let gn = g.node_populations(i, j);
                let en = g_eq.node_populations(i, j);
                for d in 0..Q {
                    assert_relative_eq!(
                        out.get(d, i, j),
                        trt_population(d, &gn, &en, &relax),
                        epsilon = 1e-15
                    );
                }
            }
        }
    }

    #[test]
    fn test_bgk_limit_when_rates_match() {
        // Λ chosen so that τ⁻ = τ⁺ reduces TRT to BGK
        let tau = 0.9;
        let relax = Relaxation::with_magic(tau, (tau - 0.5) * (tau - 0.5)).unwrap();
        assert_relative_eq!(relax.tau_minus, tau, epsilon = 1e-14);

        let g = [0.4, 0.11, 0.12, 0.1, 0.09, 0.03, 0.02, 0.025, 0.03];
        let g_eq = [0.44, 0.1, 0.1, 0.1, 0.1, 0.028, 0.027, 0.026, 0.029];
        for d in 0..Q {
            let bgk = g[d] - (g[d] - g_eq[d]) / tau;
            assert_relative_eq!(trt_population(d, &g, &g_eq, &relax), bgk, epsilon = 1e-14);
        }
    }
}
