//! Motion intensity from dense optical flow
//!
//! Estimates per-pixel displacement between consecutive frames with
//! Farneback's pyramidal polynomial-expansion method and reduces the flow
//! fields to a single intensity figure. Frame pairs that cannot be compared
//! (mismatched or tiny dimensions) are skipped with a warning instead of
//! failing the whole reduction.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::VisualConfig;
use crate::features::{FeatureMap, FeatureValue};
use crate::stats;
use crate::visual::types::Frame;

/// Feature keys produced by the motion reducer.
pub const MOTION_FEATURE_KEYS: [&str; 1] = ["motion_intensity"];

/// Coarsest pyramid level must keep both dimensions at least this large.
const MIN_LEVEL_DIM: usize = 32;

/// Displacement estimates this close to the frame edge are damped.
const EDGE_RAMP: usize = 5;

/// Reduce a frame sequence to motion features.
///
/// Flow is estimated for every consecutive pair and averaged over pairs.
/// Fewer than two usable pairs yields the fallback value.
pub fn reduce(frames: &[Frame], config: &VisualConfig) -> FeatureMap {
    let mut features = FeatureMap::new();
    if frames.len() < 2 {
        features.insert("motion_intensity", FeatureValue::Fallback);
        return features;
    }

    let params = FlowParams::from_config(config);
    let pair_means: Vec<f64> = frames
        .par_windows(2)
        .filter_map(|pair| pair_flow_mean(&pair[0], &pair[1], &params))
        .collect();

    features.insert(
        "motion_intensity",
        FeatureValue::from_option(stats::mean(&pair_means)),
    );
    features
}

/// Mean flow magnitude for one frame pair, or `None` when the pair is
/// skipped.
fn pair_flow_mean(prev: &Frame, next: &Frame, params: &FlowParams) -> Option<f64> {
    if prev.width() != next.width() || prev.height() != next.height() {
        warn!(
            "Skipping flow pair {} -> {}: dimensions {}x{} vs {}x{}",
            prev.index(),
            next.index(),
            prev.width(),
            prev.height(),
            next.width(),
            next.height()
        );
        return None;
    }

    let min_dim = (2 * params.poly_n + 1) as u32;
    if prev.width() < min_dim || prev.height() < min_dim {
        warn!(
            "Skipping flow pair {} -> {}: frame smaller than the {}px expansion neighborhood",
            prev.index(),
            next.index(),
            min_dim
        );
        return None;
    }

    let flow = farneback_flow(&Grid::from_frame(prev), &Grid::from_frame(next), params);
    let magnitude = flow.mean_magnitude();
    debug!(
        "Flow pair {} -> {}: mean magnitude {:.4}",
        prev.index(),
        next.index(),
        magnitude
    );
    Some(magnitude)
}

/// Optical flow tuning, copied out of the visual configuration.
struct FlowParams {
    pyramid_scale: f64,
    levels: usize,
    window_size: usize,
    iterations: usize,
    poly_n: usize,
    poly_sigma: f64,
}

impl FlowParams {
    fn from_config(config: &VisualConfig) -> Self {
        Self {
            pyramid_scale: config.flow_pyramid_scale,
            levels: config.flow_levels,
            window_size: config.flow_window_size,
            iterations: config.flow_iterations,
            poly_n: config.flow_poly_n,
            poly_sigma: config.flow_poly_sigma,
        }
    }
}

/// Single-channel f32 raster.
#[derive(Clone)]
struct Grid {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Grid {
    fn from_frame(frame: &Frame) -> Self {
        Self {
            width: frame.width() as usize,
            height: frame.height() as usize,
            data: frame.intensities().to_vec(),
        }
    }

    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Separable Gaussian smoothing with replicated borders.
    fn blurred(&self, sigma: f64) -> Grid {
        if sigma <= 0.0 {
            return self.clone();
        }
        let radius = ((sigma * 2.5).round() as usize).max(1);
        let size = 2 * radius + 1;
        let mut kernel = vec![0.0f64; size];
        let mut sum = 0.0;
        for (i, k) in kernel.iter_mut().enumerate() {
            let d = i as f64 - radius as f64;
            *k = (-d * d / (2.0 * sigma * sigma)).exp();
            sum += *k;
        }
        for k in &mut kernel {
            *k /= sum;
        }

        let mut tmp = vec![0.0f32; self.data.len()];
        for y in 0..self.height {
            for x in 0..self.width {
                let mut acc = 0.0f64;
                for (i, k) in kernel.iter().enumerate() {
                    let sx = (x as isize + i as isize - radius as isize)
                        .clamp(0, self.width as isize - 1) as usize;
                    acc += k * self.at(sx, y) as f64;
                }
                tmp[y * self.width + x] = acc as f32;
            }
        }

        let mut data = vec![0.0f32; self.data.len()];
        for y in 0..self.height {
            for x in 0..self.width {
                let mut acc = 0.0f64;
                for (i, k) in kernel.iter().enumerate() {
                    let sy = (y as isize + i as isize - radius as isize)
                        .clamp(0, self.height as isize - 1) as usize;
                    acc += k * tmp[sy * self.width + x] as f64;
                }
                data[y * self.width + x] = acc as f32;
            }
        }
        Grid {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Bilinear resize with half-pixel centers.
    fn resized(&self, new_width: usize, new_height: usize) -> Grid {
        if new_width == self.width && new_height == self.height {
            return self.clone();
        }
        let x_ratio = self.width as f64 / new_width as f64;
        let y_ratio = self.height as f64 / new_height as f64;
        let mut data = Vec::with_capacity(new_width * new_height);
        for y in 0..new_height {
            let sy = ((y as f64 + 0.5) * y_ratio - 0.5).clamp(0.0, (self.height - 1) as f64);
            let y0 = sy as usize;
            let y1 = (y0 + 1).min(self.height - 1);
            let ty = sy - y0 as f64;
            for x in 0..new_width {
                let sx = ((x as f64 + 0.5) * x_ratio - 0.5).clamp(0.0, (self.width - 1) as f64);
                let x0 = sx as usize;
                let x1 = (x0 + 1).min(self.width - 1);
                let tx = sx - x0 as f64;

                let top = self.at(x0, y0) as f64 * (1.0 - tx) + self.at(x1, y0) as f64 * tx;
                let bottom = self.at(x0, y1) as f64 * (1.0 - tx) + self.at(x1, y1) as f64 * tx;
                data.push((top * (1.0 - ty) + bottom * ty) as f32);
            }
        }
        Grid {
            width: new_width,
            height: new_height,
            data,
        }
    }
}

/// Five interleaved values per pixel.
///
/// Holds either polynomial expansion coefficients `[by, bx, ayy, axx, axy]`
/// or the accumulated least-squares terms `[g11, g12, g22, h1, h2]`.
#[derive(Clone)]
struct Field5 {
    width: usize,
    height: usize,
    cells: Vec<[f32; 5]>,
}

impl Field5 {
    fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![[0.0; 5]; width * height],
        }
    }

    fn get(&self, x: usize, y: usize) -> [f32; 5] {
        self.cells[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, cell: [f32; 5]) {
        self.cells[y * self.width + x] = cell;
    }
}

/// Dense displacement field, `[dx, dy]` per pixel.
#[derive(Clone)]
struct FlowField {
    width: usize,
    height: usize,
    vectors: Vec<[f32; 2]>,
}

impl FlowField {
    fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            vectors: vec![[0.0; 2]; width * height],
        }
    }

    fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn get(&self, x: usize, y: usize) -> [f32; 2] {
        self.vectors[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, vector: [f32; 2]) {
        self.vectors[y * self.width + x] = vector;
    }

    /// Bilinear upscale to the next pyramid level, with displacements
    /// rescaled by `gain`.
    fn upscaled(&self, new_width: usize, new_height: usize, gain: f32) -> FlowField {
        let x_ratio = self.width as f64 / new_width as f64;
        let y_ratio = self.height as f64 / new_height as f64;
        let mut out = FlowField::zeros(new_width, new_height);
        for y in 0..new_height {
            let sy = ((y as f64 + 0.5) * y_ratio - 0.5).clamp(0.0, (self.height - 1) as f64);
            let y0 = sy as usize;
            let y1 = (y0 + 1).min(self.height - 1);
            let ty = (sy - y0 as f64) as f32;
            for x in 0..new_width {
                let sx = ((x as f64 + 0.5) * x_ratio - 0.5).clamp(0.0, (self.width - 1) as f64);
                let x0 = sx as usize;
                let x1 = (x0 + 1).min(self.width - 1);
                let tx = (sx - x0 as f64) as f32;

                let p00 = self.get(x0, y0);
                let p10 = self.get(x1, y0);
                let p01 = self.get(x0, y1);
                let p11 = self.get(x1, y1);
                let mut vector = [0.0f32; 2];
                for (c, v) in vector.iter_mut().enumerate() {
                    let top = p00[c] + (p10[c] - p00[c]) * tx;
                    let bottom = p01[c] + (p11[c] - p01[c]) * tx;
                    *v = (top + (bottom - top) * ty) * gain;
                }
                out.set(x, y, vector);
            }
        }
        out
    }

    fn mean_magnitude(&self) -> f64 {
        if self.vectors.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .vectors
            .iter()
            .map(|v| (v[0] as f64).hypot(v[1] as f64))
            .sum();
        total / self.vectors.len() as f64
    }
}

/// Coarse-to-fine flow between two equally sized grids.
fn farneback_flow(prev: &Grid, next: &Grid, params: &FlowParams) -> FlowField {
    // Cap the pyramid so the coarsest level keeps a usable size.
    let mut levels = 0usize;
    let mut scale = 1.0f64;
    while levels < params.levels {
        scale *= params.pyramid_scale;
        if prev.width as f64 * scale < MIN_LEVEL_DIM as f64
            || prev.height as f64 * scale < MIN_LEVEL_DIM as f64
        {
            break;
        }
        levels += 1;
    }

    let mut flow = FlowField::zeros(0, 0);
    for level in (0..=levels).rev() {
        let level_scale = params.pyramid_scale.powi(level as i32);
        let width = ((prev.width as f64 * level_scale).round() as usize).max(1);
        let height = ((prev.height as f64 * level_scale).round() as usize).max(1);

        // Each level works on a smoothed resample of the original grids,
        // not on the previous level's output.
        let (level_prev, level_next) = if level == 0 {
            (prev.clone(), next.clone())
        } else {
            let sigma = (1.0 / level_scale - 1.0) * 0.5;
            (
                prev.blurred(sigma).resized(width, height),
                next.blurred(sigma).resized(width, height),
            )
        };

        let mut level_flow = if flow.is_empty() {
            FlowField::zeros(width, height)
        } else {
            flow.upscaled(width, height, (1.0 / params.pyramid_scale) as f32)
        };

        let expansion_prev = polynomial_expansion(&level_prev, params.poly_n, params.poly_sigma);
        let expansion_next = polynomial_expansion(&level_next, params.poly_n, params.poly_sigma);

        for _ in 0..params.iterations {
            let system = displacement_system(&expansion_prev, &expansion_next, &level_flow);
            let blurred = box_blur(&system, params.window_size / 2);
            solve_flow(&blurred, &mut level_flow);
        }

        flow = level_flow;
    }
    flow
}

/// Quadratic polynomial expansion of a grid.
///
/// Fits `f(x) ~ x^T A x + b^T x + c` over a Gaussian-weighted neighborhood
/// around every pixel, via two separable 1D passes. Output channels are
/// `[by, bx, ayy, axx, axy]`.
fn polynomial_expansion(src: &Grid, n: usize, sigma: f64) -> Field5 {
    let size = 2 * n + 1;
    let mut g = vec![0.0f64; size];
    let mut sum = 0.0;
    for (i, weight) in g.iter_mut().enumerate() {
        let x = i as f64 - n as f64;
        *weight = (-x * x / (2.0 * sigma * sigma)).exp();
        sum += *weight;
    }
    for weight in &mut g {
        *weight /= sum;
    }

    let mut xg = vec![0.0f64; size];
    let mut xxg = vec![0.0f64; size];
    let mut s2 = 0.0f64;
    let mut s4 = 0.0f64;
    for i in 0..size {
        let x = i as f64 - n as f64;
        xg[i] = x * g[i];
        xxg[i] = x * x * g[i];
        s2 += g[i] * x * x;
        s4 += g[i] * x * x * x * x;
    }

    // Inverse entries of the weighted Gramian. The separable basis makes
    // every cross term we need either zero or one of these four values.
    let ig11 = 1.0 / s2;
    let ig33 = 1.0 / (s4 - s2 * s2);
    let ig03 = -s2 / (s4 - s2 * s2);
    let ig55 = 1.0 / (s2 * s2);

    let mut out = Field5::zeros(src.width, src.height);
    let mut vert: Vec<[f64; 3]> = vec![[0.0; 3]; src.width];

    for y in 0..src.height {
        // Vertical pass: plain, y-weighted and y^2-weighted sums.
        for (x, triple) in vert.iter_mut().enumerate() {
            let mut t = [0.0f64; 3];
            for k in 0..size {
                let sy = (y as isize + k as isize - n as isize)
                    .clamp(0, src.height as isize - 1) as usize;
                let v = src.at(x, sy) as f64;
                t[0] += g[k] * v;
                t[1] += xg[k] * v;
                t[2] += xxg[k] * v;
            }
            *triple = t;
        }

        // Horizontal pass combines the moments and projects onto the
        // polynomial coefficients.
        for x in 0..src.width {
            let mut b1 = 0.0f64;
            let mut b2 = 0.0f64;
            let mut b3 = 0.0f64;
            let mut b4 = 0.0f64;
            let mut b5 = 0.0f64;
            let mut b6 = 0.0f64;
            for k in 0..size {
                let sx = (x as isize + k as isize - n as isize)
                    .clamp(0, src.width as isize - 1) as usize;
                let t = vert[sx];
                b1 += g[k] * t[0];
                b2 += xg[k] * t[0];
                b4 += xxg[k] * t[0];
                b3 += g[k] * t[1];
                b6 += xg[k] * t[1];
                b5 += g[k] * t[2];
            }
            out.set(
                x,
                y,
                [
                    (b3 * ig11) as f32,
                    (b2 * ig11) as f32,
                    (b1 * ig03 + b5 * ig33) as f32,
                    (b1 * ig03 + b4 * ig33) as f32,
                    (b6 * ig55) as f32,
                ],
            );
        }
    }
    out
}

/// Per-pixel least-squares terms relating the two expansions under the
/// current flow estimate.
fn displacement_system(
    expansion_prev: &Field5,
    expansion_next: &Field5,
    flow: &FlowField,
) -> Field5 {
    let (width, height) = (expansion_prev.width, expansion_prev.height);
    let mut out = Field5::zeros(width, height);

    for y in 0..height {
        for x in 0..width {
            let [dx, dy] = flow.get(x, y);
            let warped = sample_bilinear(expansion_next, x as f32 + dx, y as f32 + dy);
            let local = expansion_prev.get(x, y);

            let r4 = (local[2] + warped[2]) * 0.5;
            let r5 = (local[3] + warped[3]) * 0.5;
            let r6 = (local[4] + warped[4]) * 0.25;
            let mut r2 = (local[0] - warped[0]) * 0.5;
            let mut r3 = (local[1] - warped[1]) * 0.5;
            r2 += r4 * dy + r6 * dx;
            r3 += r6 * dy + r5 * dx;

            // Displacement observations near the frame edge are unreliable;
            // ramp them down to zero at the border.
            let edge = x.min(y).min(width - 1 - x).min(height - 1 - y);
            if edge < EDGE_RAMP {
                let damp = edge as f32 / EDGE_RAMP as f32;
                r2 *= damp;
                r3 *= damp;
            }

            out.set(
                x,
                y,
                [
                    r4 * r4 + r6 * r6,
                    (r4 + r5) * r6,
                    r5 * r5 + r6 * r6,
                    r4 * r2 + r6 * r3,
                    r6 * r2 + r5 * r3,
                ],
            );
        }
    }
    out
}

fn sample_bilinear(field: &Field5, fx: f32, fy: f32) -> [f32; 5] {
    let fx = fx.clamp(0.0, (field.width - 1) as f32);
    let fy = fy.clamp(0.0, (field.height - 1) as f32);
    let x0 = (fx as usize).min(field.width.saturating_sub(2));
    let y0 = (fy as usize).min(field.height.saturating_sub(2));
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let p00 = field.get(x0, y0);
    let p10 = field.get(x0 + 1, y0);
    let p01 = field.get(x0, y0 + 1);
    let p11 = field.get(x0 + 1, y0 + 1);
    let mut out = [0.0f32; 5];
    for (c, v) in out.iter_mut().enumerate() {
        let top = p00[c] + (p10[c] - p00[c]) * tx;
        let bottom = p01[c] + (p11[c] - p01[c]) * tx;
        *v = top + (bottom - top) * ty;
    }
    out
}

/// Box blur over all five channels with replicated borders, via running
/// sums in both directions.
fn box_blur(src: &Field5, radius: usize) -> Field5 {
    if radius == 0 {
        return src.clone();
    }
    let (width, height) = (src.width, src.height);
    let span = (2 * radius + 1) as f64;
    let norm = 1.0 / (span * span);

    let mut column_sums: Vec<[f64; 5]> = vec![[0.0; 5]; width * height];
    let mut acc: Vec<[f64; 5]> = vec![[0.0; 5]; width];
    for dy in -(radius as isize)..=(radius as isize) {
        let sy = dy.clamp(0, height as isize - 1) as usize;
        for (x, cell_acc) in acc.iter_mut().enumerate() {
            let cell = src.get(x, sy);
            for c in 0..5 {
                cell_acc[c] += cell[c] as f64;
            }
        }
    }
    for y in 0..height {
        if y > 0 {
            let leaving = (y as isize - 1 - radius as isize).clamp(0, height as isize - 1) as usize;
            let entering = (y as isize + radius as isize).clamp(0, height as isize - 1) as usize;
            for (x, cell_acc) in acc.iter_mut().enumerate() {
                let out_cell = src.get(x, leaving);
                let in_cell = src.get(x, entering);
                for c in 0..5 {
                    cell_acc[c] += in_cell[c] as f64 - out_cell[c] as f64;
                }
            }
        }
        column_sums[y * width..(y + 1) * width].copy_from_slice(&acc);
    }

    let mut out = Field5::zeros(width, height);
    for y in 0..height {
        let row = &column_sums[y * width..(y + 1) * width];
        let mut window = [0.0f64; 5];
        for dx in -(radius as isize)..=(radius as isize) {
            let sx = dx.clamp(0, width as isize - 1) as usize;
            for c in 0..5 {
                window[c] += row[sx][c];
            }
        }
        for x in 0..width {
            if x > 0 {
                let leaving = (x as isize - 1 - radius as isize).clamp(0, width as isize - 1) as usize;
                let entering = (x as isize + radius as isize).clamp(0, width as isize - 1) as usize;
                for c in 0..5 {
                    window[c] += row[entering][c] - row[leaving][c];
                }
            }
            let mut cell = [0.0f32; 5];
            for (c, v) in cell.iter_mut().enumerate() {
                *v = (window[c] * norm) as f32;
            }
            out.set(x, y, cell);
        }
    }
    out
}

/// Solve the blurred 2x2 system at every pixel for the new flow vector.
fn solve_flow(system: &Field5, flow: &mut FlowField) {
    for y in 0..system.height {
        for x in 0..system.width {
            let m = system.get(x, y);
            let g11 = m[0] as f64;
            let g12 = m[1] as f64;
            let g22 = m[2] as f64;
            let h1 = m[3] as f64;
            let h2 = m[4] as f64;
            let idet = 1.0 / (g11 * g22 - g12 * g12 + 1e-3);
            flow.set(
                x,
                y,
                [
                    ((g11 * h2 - g12 * h1) * idet) as f32,
                    ((g22 * h1 - g12 * h2) * idet) as f32,
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smooth two-tone wave, optionally shifted along x.
    fn wave_frame(index: usize, size: u32, x_shift: f32) -> Frame {
        let mut data = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                let fx = (x as f32 - x_shift) * std::f32::consts::TAU / 32.0;
                let fy = y as f32 * std::f32::consts::TAU / 40.0;
                data.push(127.5 + 60.0 * fx.sin() + 30.0 * fy.cos());
            }
        }
        Frame::from_intensities(index, size, size, data).unwrap()
    }

    #[test]
    fn identical_frames_produce_no_motion() {
        let frames: Vec<Frame> = (0..4).map(|i| wave_frame(i, 64, 0.0)).collect();
        let features = reduce(&frames, &VisualConfig::default());
        let motion = features.get("motion_intensity").unwrap();
        assert!(motion.abs() < 1e-6, "motion {}", motion);
    }

    #[test]
    fn horizontal_shift_registers_as_motion() {
        let frames = vec![wave_frame(0, 64, 0.0), wave_frame(1, 64, 3.0)];
        let features = reduce(&frames, &VisualConfig::default());
        let motion = features.get("motion_intensity").unwrap();
        assert!(motion > 0.2, "motion {}", motion);
        assert!(motion < 8.0, "motion {}", motion);
    }

    #[test]
    fn recovered_flow_points_along_the_shift() {
        let prev = Grid::from_frame(&wave_frame(0, 64, 0.0));
        let next = Grid::from_frame(&wave_frame(1, 64, 3.0));
        let params = FlowParams::from_config(&VisualConfig::default());

        let flow = farneback_flow(&prev, &next, &params);
        let mean_dx: f64 = flow.vectors.iter().map(|v| v[0] as f64).sum::<f64>()
            / flow.vectors.len() as f64;
        assert!(mean_dx > 0.5, "mean dx {}", mean_dx);
    }

    #[test]
    fn single_frame_falls_back_to_zero() {
        let features = reduce(&[wave_frame(0, 64, 0.0)], &VisualConfig::default());
        assert_eq!(features.get("motion_intensity"), Some(0.0));
    }

    #[test]
    fn mismatched_dimensions_are_skipped() {
        let frames = vec![
            wave_frame(0, 64, 0.0),
            wave_frame(1, 32, 0.0),
            wave_frame(2, 64, 0.0),
        ];
        // Both pairs straddle the odd-sized frame, so nothing is measured.
        let features = reduce(&frames, &VisualConfig::default());
        assert_eq!(features.get("motion_intensity"), Some(0.0));
    }
}
