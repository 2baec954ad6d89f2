//! End-to-end cavity runs: conservation, rest state, Ghia et al. benchmark
use lbm_cavity_core::{
    CavityConfig, CavitySimulation, Lattice, LatticeError, LatticeParameters, Vec2,
};

#[ctor::ctor]
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn closed_cavity_params(nx: usize, tau: f64) -> LatticeParameters {
    LatticeParameters {
        nx,
        ny: nx,
        dx: 1.0 / nx as f64,
        dt: 1e-3,
        tau_lbm: tau,
        re_lbm: 0.0,
        u_lbm: 0.0,
        l_lbm: nx,
        nu_lbm: (tau - 0.5) / 3.0,
        rho_lbm: 1.0,
        output_resolution: 64,
    }
}

#[test]
fn test_closed_cavity_conserves_mass() {
    let mut lattice = Lattice::new(closed_cavity_params(40, 0.8)).unwrap();
    let (w, h) = (lattice.width(), lattice.height());

    // Gaussian density bump in the middle, fluid at rest
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let rho: Vec<f64> = (0..w)
        .flat_map(|i| (0..h).map(move |j| (i, j)))
        .map(|(i, j)| {
            let r2 = (i as f64 - cx).powi(2) + (j as f64 - cy).powi(2);
            1.0 + 1e-3 * (-r2 / 18.0).exp()
        })
        .collect();
    lattice.set_macroscopic(&rho, &vec![Vec2::zeros(); w * h]);
    lattice.recover_macroscopic().unwrap();
    let initial = lattice.total_mass();

    for _ in 0..300 {
        lattice.recover_macroscopic().unwrap();
        lattice.advance().unwrap();
    }
    lattice.recover_macroscopic().unwrap();

    // Bump mass is about 3e-5 of the total
    let excess = initial - (w * h) as f64;
    let drift = (lattice.total_mass() - initial).abs();
    assert!(
        drift < 0.1 * excess,
        "mass drifted by {drift:e} against a bump of {excess:e}"
    );
}

#[test]
fn test_cavity_without_lid_motion_stays_at_rest() {
    let mut lattice = Lattice::new(closed_cavity_params(32, 0.6)).unwrap();
    lattice.set_cavity(0.0);

    for _ in 0..200 {
        lattice.recover_macroscopic().unwrap();
        lattice.advance().unwrap();
    }
    lattice.recover_macroscopic().unwrap();

    for (k, (&rho, u)) in lattice.density().iter().zip(lattice.velocity()).enumerate() {
        assert!((rho - 1.0).abs() < 1e-12, "node {k}: rho = {rho}");
        assert!(u.norm() < 1e-12, "node {k}: |u| = {}", u.norm());
    }
}

#[test]
fn test_unstable_relaxation_is_rejected_before_stepping() {
    // A vanishing lid speed rounds tau to exactly 0.5
    let config = CavityConfig {
        lid_velocity: 1e-300,
        ..Default::default()
    };
    assert!(matches!(
        CavitySimulation::new(config),
        Err(LatticeError::InvalidConfig {
            parameter: "tau_lbm",
            ..
        })
    ));
    assert!(Lattice::new(closed_cavity_params(16, 0.5)).is_err());
}

#[test]
fn test_lid_drives_a_primary_vortex() {
    let config = CavityConfig {
        reynolds: 100.0,
        lid_velocity: 0.1,
        length: 32,
        t_max: 5.0,
        ..Default::default()
    };
    let mut sim = CavitySimulation::new(config).unwrap().without_output();
    sim.run().unwrap();

    let lattice = sim.lattice();
    let mid = lattice.width() / 2;
    let column: Vec<f64> = (0..lattice.height())
        .map(|j| lattice.velocity_at(mid, j).x)
        .collect();

    // Flow follows the lid near the top and returns lower down
    assert!(column[lattice.ly() - 2] > 0.0);
    let min = column.iter().copied().fold(f64::INFINITY, f64::min);
    assert!(min < 0.0, "no return flow along the centreline: {column:?}");
}

#[test]
fn test_coarse_cavity_matches_ghia_at_re_100() {
    let config = CavityConfig {
        reynolds: 100.0,
        lid_velocity: 0.1,
        length: 40,
        t_max: 20.0,
        ..Default::default()
    };
    let mut sim = CavitySimulation::new(config).unwrap().without_output();
    let summary = sim.run().unwrap();

    let error = summary.error.unwrap();
    assert!(error.combined < 0.05, "centreline error {error:?}");
}

#[test]
#[ignore = "runs 133k iterations on a 201x201 grid"]
fn test_reference_cavity_matches_ghia_at_re_100() {
    let config = CavityConfig::default();
    let mut sim = CavitySimulation::new(config).unwrap().without_output();
    let summary = sim.run().unwrap();

    let error = summary.error.unwrap();
    assert!(error.combined < 0.05, "centreline error {error:?}");
}
