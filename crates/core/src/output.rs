//! Field output
//!
//! PNG renderings of the velocity field and plain-text centreline profiles.
//! Writers only read the lattice.

use crate::error::OutputError;
use crate::lattice::{Lattice, Vec2};
use crate::validation::CenterlineProfiles;
use image::{Rgb, RgbImage};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Seeds per image side for streamline tracing
const STREAMLINE_SEEDS: usize = 24;
/// Integration step, in nodes
const STREAMLINE_STEP: f64 = 0.4;
/// Integration steps per seed and direction
const STREAMLINE_MAX_STEPS: usize = 4000;

/// What `output_fields` renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    /// Colour-mapped velocity magnitude, one image per output step
    pub velocity_norm: bool,
    /// Streamlines, overwritten at each output step
    pub streamlines: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            velocity_norm: true,
            streamlines: false,
        }
    }
}

/// Writes field images into a directory
#[derive(Debug, Clone)]
pub struct FieldWriter {
    dir: PathBuf,
    image_size: u32,
}

impl FieldWriter {
    /// Create a writer; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>, image_size: u32) -> Self {
        Self {
            dir: dir.into(),
            image_size: image_size.max(1),
        }
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the requested renderings when `iteration` is a multiple of `frequency`
    ///
    /// Returns whether anything was written. A zero `frequency` disables output.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an image cannot
    /// be encoded
    pub fn output_fields(
        &self,
        lattice: &Lattice,
        iteration: u64,
        frequency: u64,
        options: OutputOptions,
    ) -> Result<bool, OutputError> {
        if frequency == 0 || iteration % frequency != 0 {
            return Ok(false);
        }
        if !options.velocity_norm && !options.streamlines {
            return Ok(false);
        }
        fs::create_dir_all(&self.dir)?;

        let sampler = VelocitySampler::new(lattice);
        if options.velocity_norm {
            let path = self.dir.join(format!("u_norm_{}.png", iteration / frequency));
            self.render_norm(&sampler).save(&path)?;
            debug!("Wrote {}", path.display());
        }
        if options.streamlines {
            let path = self.dir.join("u_stream.png");
            self.render_streamlines(&sampler).save(&path)?;
            debug!("Wrote {}", path.display());
        }
        Ok(true)
    }

    fn image_dims(&self, sampler: &VelocitySampler<'_>) -> (u32, u32) {
        let aspect = sampler.ly() / sampler.lx();
        let height = ((self.image_size as f64) * aspect).round().max(1.0) as u32;
        (self.image_size, height)
    }

    fn render_norm(&self, sampler: &VelocitySampler<'_>) -> RgbImage {
        let (width, height) = self.image_dims(sampler);
        let max = sampler.max_norm().max(1e-12);

        let mut img = RgbImage::new(width, height);
        for py in 0..height {
            for px in 0..width {
                let (x, y) = pixel_to_lattice(px, py, width, height, sampler);
                let norm = sampler.sample(x, y).norm();
                img.put_pixel(px, py, colormap_sequential(norm / max));
            }
        }
        img
    }

    fn render_streamlines(&self, sampler: &VelocitySampler<'_>) -> RgbImage {
        let (width, height) = self.image_dims(sampler);
        let max = sampler.max_norm().max(1e-12);
        let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

        for sx in 0..STREAMLINE_SEEDS {
            for sy in 0..STREAMLINE_SEEDS {
                let x = (sx as f64 + 0.5) / STREAMLINE_SEEDS as f64 * sampler.lx();
                let y = (sy as f64 + 0.5) / STREAMLINE_SEEDS as f64 * sampler.ly();
                for direction in [1.0, -1.0] {
                    let line = trace_streamline(sampler, (x, y), direction);
                    for pair in line.windows(2) {
                        let speed = sampler.sample(pair[0].0, pair[0].1).norm();
                        let color = colormap_sequential(speed / max);
                        let (x0, y0) = lattice_to_pixel(pair[0], width, height, sampler);
                        let (x1, y1) = lattice_to_pixel(pair[1], width, height, sampler);
                        draw_line(&mut img, x0, y0, x1, y1, color);
                    }
                }
            }
        }
        img
    }
}

/// Bilinear view of the velocity field in node coordinates
struct VelocitySampler<'a> {
    u: &'a [Vec2],
    width: usize,
    height: usize,
}

impl<'a> VelocitySampler<'a> {
    fn new(lattice: &'a Lattice) -> Self {
        Self {
            u: lattice.velocity(),
            width: lattice.width(),
            height: lattice.height(),
        }
    }

    fn lx(&self) -> f64 {
        (self.width - 1) as f64
    }

    fn ly(&self) -> f64 {
        (self.height - 1) as f64
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.lx()).contains(&x) && (0.0..=self.ly()).contains(&y)
    }

    fn max_norm(&self) -> f64 {
        self.u.iter().map(|v| v.norm()).fold(0.0, f64::max)
    }

    fn at(&self, i: usize, j: usize) -> Vec2 {
        self.u[i * self.height + j]
    }

    fn sample(&self, x: f64, y: f64) -> Vec2 {
        let x = x.clamp(0.0, self.lx());
        let y = y.clamp(0.0, self.ly());
        let i0 = (x.floor() as usize).min(self.width - 2);
        let j0 = (y.floor() as usize).min(self.height - 2);
        let tx = x - i0 as f64;
        let ty = y - j0 as f64;

        self.at(i0, j0) * ((1.0 - tx) * (1.0 - ty))
            + self.at(i0 + 1, j0) * (tx * (1.0 - ty))
            + self.at(i0, j0 + 1) * ((1.0 - tx) * ty)
            + self.at(i0 + 1, j0 + 1) * (tx * ty)
    }
}

/// Midpoint integration of the normalised velocity direction from `start`
fn trace_streamline(sampler: &VelocitySampler<'_>, start: (f64, f64), sign: f64) -> Vec<(f64, f64)> {
    let threshold = 1e-6 * sampler.max_norm();
    let direction = |x: f64, y: f64| -> Option<Vec2> {
        let v = sampler.sample(x, y);
        let n = v.norm();
        (n > threshold).then(|| v * (sign / n))
    };

    let mut points = vec![start];
    let (mut x, mut y) = start;
    for _ in 0..STREAMLINE_MAX_STEPS {
        let Some(k1) = direction(x, y) else { break };
        let (mx, my) = (x + 0.5 * STREAMLINE_STEP * k1.x, y + 0.5 * STREAMLINE_STEP * k1.y);
        let Some(k2) = direction(mx, my) else { break };
        x += STREAMLINE_STEP * k2.x;
        y += STREAMLINE_STEP * k2.y;
        if !sampler.contains(x, y) {
            break;
        }
        points.push((x, y));
    }
    points
}

/// Pixel centre to node coordinates; image rows run top to bottom
fn pixel_to_lattice(px: u32, py: u32, width: u32, height: u32, sampler: &VelocitySampler<'_>) -> (f64, f64) {
    let x = (px as f64 + 0.5) / width as f64 * sampler.lx();
    let y = (1.0 - (py as f64 + 0.5) / height as f64) * sampler.ly();
    (x, y)
}

fn lattice_to_pixel(p: (f64, f64), width: u32, height: u32, sampler: &VelocitySampler<'_>) -> (i32, i32) {
    let px = p.0 / sampler.lx() * width as f64;
    let py = (1.0 - p.1 / sampler.ly()) * height as f64;
    (px.floor() as i32, py.floor() as i32)
}

fn colormap_sequential(t: f64) -> Rgb<u8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let (r, g, b) = if t < 0.5 {
        let s = t * 2.0;
        (0.0, s, 1.0 - s)
    } else {
        let s = (t - 0.5) * 2.0;
        (s, 1.0 - s, 0.0)
    };
    Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
}

fn draw_line(img: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x0 >= 0 && y0 >= 0 && (x0 as u32) < img.width() && (y0 as u32) < img.height() {
            img.put_pixel(x0 as u32, y0 as u32, color);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Write `cavity_ux` and `cavity_uy` into `dir`
///
/// Each line holds a node position in `[0, 1]` and the normalised velocity
/// there: `y ux` along the vertical centreline, `x uy` along the horizontal one.
///
/// # Errors
///
/// Returns an error if a file cannot be created or written
pub fn write_centerline_profiles(dir: &Path, profiles: &CenterlineProfiles) -> Result<(), OutputError> {
    fs::create_dir_all(dir)?;
    write_profile(&dir.join("cavity_ux"), profiles.spacing, &profiles.ux)?;
    write_profile(&dir.join("cavity_uy"), profiles.spacing, &profiles.uy)?;
    debug!("Wrote centreline profiles to {}", dir.display());
    Ok(())
}

fn write_profile(path: &Path, spacing: f64, values: &[f64]) -> Result<(), OutputError> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for (k, value) in values.iter().enumerate() {
        writeln!(out, "{} {}", k as f64 * spacing, value)?;
    }
    out.flush()?;
    Ok(())
}
