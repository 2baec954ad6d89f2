//! Conservation and fixed-point properties of the TRT collision over random states
use approx::assert_relative_eq;
use lbm_cavity_core::lattice::collision::{collide_trt, trt_population};
use lbm_cavity_core::lattice::equilibrium::{compute_equilibrium, equilibrium};
use lbm_cavity_core::lattice::geometry::{velocity, Q};
use lbm_cavity_core::{PopulationField, Relaxation, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const W: usize = 12;
const H: usize = 9;

fn random_state(rng: &mut StdRng) -> (Vec<f64>, Vec<Vec2>) {
    let n = W * H;
    let rho = (0..n).map(|_| rng.random_range(0.8..1.2)).collect();
    let u = (0..n)
        .map(|_| Vec2::new(rng.random_range(-0.1..0.1), rng.random_range(-0.1..0.1)))
        .collect();
    (rho, u)
}

/// Equilibrium plus a random non-equilibrium part
fn perturbed(g_eq: &PopulationField, rng: &mut StdRng) -> PopulationField {
    let mut g = g_eq.clone();
    for value in g.as_mut_slice() {
        *value += rng.random_range(-0.01..0.01);
    }
    g
}

fn moments(f: &[f64; Q]) -> (f64, Vec2) {
    let mut rho = 0.0;
    let mut m = Vec2::zeros();
    for (d, &value) in f.iter().enumerate() {
        let (cx, cy) = velocity(d);
        rho += value;
        m += Vec2::new(cx, cy) * value;
    }
    (rho, m)
}

#[test]
fn test_collision_conserves_mass_and_momentum_per_node() {
    let mut rng = StdRng::seed_from_u64(0x1b0c);
    for tau in [0.51, 0.6, 0.68, 1.0, 1.9] {
        let relax = Relaxation::from_tau(tau).unwrap();
        let mut g = PopulationField::new(W, H);
        for value in g.as_mut_slice() {
            *value = rng.random_range(0.01..0.3);
        }

        // Equilibrium from the moments of the random state itself
        let mut rho = vec![0.0; W * H];
        let mut u = vec![Vec2::zeros(); W * H];
        for i in 0..W {
            for j in 0..H {
                let (m, p) = moments(&g.node_populations(i, j));
                rho[i * H + j] = m;
                u[i * H + j] = p / m;
            }
        }
        let mut g_eq = PopulationField::new(W, H);
        compute_equilibrium(&rho, &u, &mut g_eq);

        let mut post = PopulationField::new(W, H);
        collide_trt(&g, &g_eq, &relax, &mut post);

        for i in 0..W {
            for j in 0..H {
                let (m_pre, p_pre) = moments(&g.node_populations(i, j));
                let (m_post, p_post) = moments(&post.node_populations(i, j));
                assert_relative_eq!(m_post, m_pre, epsilon = 1e-12);
                assert_relative_eq!(p_post.x, p_pre.x, epsilon = 1e-12);
                assert_relative_eq!(p_post.y, p_pre.y, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn test_equilibrium_is_a_fixed_point_for_random_states() {
    let mut rng = StdRng::seed_from_u64(7);
    for tau in [0.55, 0.8, 1.5] {
        let relax = Relaxation::from_tau(tau).unwrap();
        let (rho, u) = random_state(&mut rng);
        let mut g_eq = PopulationField::new(W, H);
        compute_equilibrium(&rho, &u, &mut g_eq);

        let mut post = PopulationField::new(W, H);
        collide_trt(&g_eq, &g_eq, &relax, &mut post);
        for (&a, &b) in post.as_slice().iter().zip(g_eq.as_slice()) {
            assert_eq!(a, b);
        }
    }
}

#[test]
fn test_equilibrium_moments_match_inputs() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let rho = rng.random_range(0.5..2.0);
        let u = Vec2::new(rng.random_range(-0.2..0.2), rng.random_range(-0.2..0.2));
        let mut f = [0.0; Q];
        for (d, value) in f.iter_mut().enumerate() {
            *value = equilibrium(d, rho, &u);
        }
        let (m, p) = moments(&f);
        assert_relative_eq!(m, rho, epsilon = 1e-13);
        assert_relative_eq!(p.x, rho * u.x, epsilon = 1e-13);
        assert_relative_eq!(p.y, rho * u.y, epsilon = 1e-13);
    }
}

#[test]
fn test_field_sweep_matches_single_node_operator() {
    let mut rng = StdRng::seed_from_u64(11);
    let relax = Relaxation::from_tau(0.7).unwrap();
    let (rho, u) = random_state(&mut rng);
    let mut g_eq = PopulationField::new(W, H);
    compute_equilibrium(&rho, &u, &mut g_eq);
    let g = perturbed(&g_eq, &mut rng);

    let mut post = PopulationField::new(W, H);
    collide_trt(&g, &g_eq, &relax, &mut post);

    for i in 0..W {
        for j in 0..H {
            let node = g.node_populations(i, j);
            let node_eq = g_eq.node_populations(i, j);
            for d in 0..Q {
                assert_eq!(post.get(d, i, j), trt_population(d, &node, &node_eq, &relax));
            }
        }
    }
}
