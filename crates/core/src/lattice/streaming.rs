//! Streaming (advection) of populations along their discrete velocities
//!
//! `g'[d](i, j) = g[d](i − cx, j − cy)`. Slots whose source lies outside the
//! grid receive the unset sentinel; they are exactly the populations the
//! boundary closure has to reconstruct.

use super::fields::PopulationField;
use super::geometry::{UNSET, VELOCITIES};
use rayon::prelude::*;

/// Stream every direction plane of `src` into `dst`
///
/// `src` and `dst` must be distinct buffers of the same dimensions; the caller
/// swaps them afterwards.
pub fn stream(src: &PopulationField, dst: &mut PopulationField) {
    let width = src.width();
    let height = src.height();
    debug_assert_eq!((width, height), (dst.width(), dst.height()));

    dst.par_planes_mut().for_each(|(d, plane)| {
        let [cx, cy] = VELOCITIES[d];
        let from = src.plane(d);

        for i in 0..width {
            let si = i as isize - cx as isize;
            let row = &mut plane[i * height..(i + 1) * height];
            if si < 0 || si >= width as isize {
                row.fill(UNSET);
                continue;
            }
            let src_row = &from[si as usize * height..(si as usize + 1) * height];

            match cy {
                0 => row.copy_from_slice(src_row),
                1 => {
                    row[0] = UNSET;
                    row[1..].copy_from_slice(&src_row[..height - 1]);
                }
                _ => {
                    row[..height - 1].copy_from_slice(&src_row[1..]);
                    row[height - 1] = UNSET;
                }
            }
        }
    });
}
