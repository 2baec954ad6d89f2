//! Sentinel checks on the cavity perimeter
//!
//! Streaming leaves twelve (direction, wall) slots without a source node; the
//! closures must fill every one of them on every step.
use lbm_cavity_core::lattice::boundary::{segment_nodes, verify_closure, INCOMING};
use lbm_cavity_core::lattice::geometry::{UNSET, WEIGHTS};
use lbm_cavity_core::lattice::streaming::stream;
use lbm_cavity_core::{BoundarySegment, CavityConfig, Lattice, LatticeError, PopulationField};

/// The twelve (direction, wall) pairs whose source lies outside the grid
const DIRECTION_WALLS: [(usize, BoundarySegment); 12] = [
    (1, BoundarySegment::Left),
    (2, BoundarySegment::Right),
    (3, BoundarySegment::Bottom),
    (4, BoundarySegment::Top),
    (5, BoundarySegment::Left),
    (5, BoundarySegment::Bottom),
    (6, BoundarySegment::Right),
    (6, BoundarySegment::Top),
    (7, BoundarySegment::Right),
    (7, BoundarySegment::Bottom),
    (8, BoundarySegment::Left),
    (8, BoundarySegment::Top),
];

/// Every node of a wall, corners included
fn full_wall(segment: BoundarySegment, width: usize, height: usize) -> Vec<(usize, usize)> {
    let (lx, ly) = (width - 1, height - 1);
    match segment {
        BoundarySegment::Bottom => (0..width).map(|i| (i, 0)).collect(),
        BoundarySegment::Top => (0..width).map(|i| (i, ly)).collect(),
        BoundarySegment::Left => (0..height).map(|j| (0, j)).collect(),
        BoundarySegment::Right => (0..height).map(|j| (lx, j)).collect(),
        _ => segment_nodes(segment, width, height),
    }
}

fn cavity(length: usize) -> Lattice {
    let params = CavityConfig {
        length,
        lid_velocity: 0.1,
        reynolds: 100.0,
        ..Default::default()
    }
    .derive()
    .unwrap();
    let mut lattice = Lattice::new(params.lattice).unwrap();
    lattice.set_cavity(0.1);
    lattice
}

#[test]
fn test_streaming_leaves_exactly_the_twelve_slots_unset() {
    let (w, h) = (7, 6);
    let src = PopulationField::with_value(w, h, 0.5);
    let mut dst = PopulationField::new(w, h);
    stream(&src, &mut dst);

    for (d, wall) in DIRECTION_WALLS {
        for (i, j) in full_wall(wall, w, h) {
            assert_eq!(dst.get(d, i, j), UNSET, "direction {d} at ({i}, {j}) on {wall}");
        }
    }

    // Everything else received a real population
    let unset_count = dst.as_slice().iter().filter(|&&v| v == UNSET).count();
    // Axis directions: one wall each; diagonals: two walls sharing one corner
    let expected = 2 * h + 2 * w + 4 * (w + h - 1);
    assert_eq!(unset_count, expected);
}

#[test]
fn test_unclosed_streaming_output_is_reported() {
    let (w, h) = (6, 6);
    let src = PopulationField::with_value(w, h, 0.5);
    let mut dst = PopulationField::new(w, h);
    stream(&src, &mut dst);

    match verify_closure(&dst, 3) {
        Err(LatticeError::UnclosedBoundary {
            direction,
            segment,
            first,
            last,
            iteration,
        }) => {
            assert_eq!(segment, BoundarySegment::Bottom);
            assert_eq!(direction, 3);
            assert_eq!(first, (1, 0));
            assert_eq!(last, (w - 2, 0));
            assert_eq!(iteration, 3);
        }
        other => panic!("expected an unclosed boundary, got {other:?}"),
    }
}

#[test]
fn test_each_direction_wall_pair_is_checked() {
    let (w, h) = (6, 5);
    for (d, wall) in DIRECTION_WALLS {
        for (i, j) in full_wall(wall, w, h) {
            let mut field = PopulationField::with_value(w, h, 0.1);
            field.set(d, i, j, UNSET);
            match verify_closure(&field, 0) {
                Err(LatticeError::UnclosedBoundary {
                    direction, first, ..
                }) => {
                    assert_eq!(direction, d);
                    assert_eq!(first, (i, j));
                }
                other => panic!("sentinel at direction {d}, ({i}, {j}) not caught: {other:?}"),
            }
        }
    }
}

#[test]
fn test_incoming_table_covers_every_pair() {
    for (d, wall) in DIRECTION_WALLS {
        assert!(
            INCOMING
                .iter()
                .any(|(segment, dirs)| *segment == wall && dirs.contains(&d)),
            "direction {d} on {wall} is not scanned"
        );
    }
}

#[test]
fn test_cavity_steps_never_leak_sentinels() {
    let mut lattice = cavity(24);
    for _ in 0..50 {
        lattice.recover_macroscopic().unwrap();
        lattice.advance().unwrap();

        let g = lattice.populations();
        for (d, wall) in DIRECTION_WALLS {
            for (i, j) in full_wall(wall, g.width(), g.height()) {
                assert_ne!(g.get(d, i, j), UNSET, "direction {d} at ({i}, {j})");
            }
        }
    }
}

#[test]
fn test_rest_cavity_closure_is_exact() {
    let mut lattice = cavity(10);
    // Stop the lid before the first step; density goes back to rho_lbm
    lattice.set_cavity(0.0);
    assert!(lattice.density().iter().all(|&r| r == lattice.params().rho_lbm));
    for _ in 0..10 {
        lattice.recover_macroscopic().unwrap();
        lattice.advance().unwrap();
    }
    let g = lattice.populations();
    for d in 0..9 {
        assert!(
            g.plane(d).iter().all(|&v| (v - WEIGHTS[d]).abs() < 1e-13),
            "direction {d} drifted from rest"
        );
    }
}
