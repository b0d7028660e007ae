//! Pluggable 2D complex FFT backends.
//!
//! Two implementations share one interface:
//! - [`ReferenceFft`] - single-threaded rustfft, always available
//! - [`ParallelFft`] - row/column passes on a dedicated rayon pool
//!   (cargo feature `parallel`)
//!
//! Backends are unnormalised. The normalised transform pair lives on the
//! wavefront so every backend obeys the same contract.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use ndarray::Array2;
use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner, FftPlannerScalar};
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
mod parallel;
mod reference;

#[cfg(feature = "parallel")]
pub use self::parallel::ParallelFft;
pub use self::reference::ReferenceFft;

/// Whether the optimized multi-threaded backend was compiled in.
pub const OPTIMIZED_FFT_AVAILABLE: bool = cfg!(feature = "parallel");

/// In-place, unnormalised 2D complex transforms.
pub trait FftBackend: Send + Sync + fmt::Debug {
    /// Forward transform, `exp(-2*pi*i*k*n/N)` kernel.
    fn forward_2d(&self, data: &mut Array2<Complex64>);

    /// Inverse transform without the `1/(rows*cols)` factor.
    fn inverse_2d(&self, data: &mut Array2<Complex64>);

    /// Name of the backend for logging.
    fn name(&self) -> &'static str;
}

/// How hard the planner works before transforming.
///
/// rustfft has a single measuring planner, so `Patient` and `Exhaustive`
/// plan exactly like `Measure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerEffort {
    /// Scalar algorithms only, no instruction-set detection.
    Estimate,
    #[default]
    Measure,
    Patient,
    Exhaustive,
}

/// FFT backend selection, passed explicitly to every wavefront.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FftConfig {
    /// Use the multi-threaded backend if it is available.
    pub optimized: bool,
    /// Worker threads of the multi-threaded backend.
    pub threads: usize,
    pub planner_effort: PlannerEffort,
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            optimized: false,
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            planner_effort: PlannerEffort::default(),
        }
    }
}

impl FftConfig {
    pub fn reference() -> Self {
        Self {
            optimized: false,
            threads: 1,
            planner_effort: PlannerEffort::Measure,
        }
    }

    pub fn optimized(threads: usize) -> Self {
        Self {
            optimized: true,
            threads,
            planner_effort: PlannerEffort::Measure,
        }
    }
}

/// Builds the backend described by `config`, falling back to the reference
/// backend when the optimized one is unavailable.
pub fn select_backend(config: &FftConfig) -> Arc<dyn FftBackend> {
    if config.optimized {
        if !OPTIMIZED_FFT_AVAILABLE {
            debug!("Optimized FFT not compiled in, using reference FFT");
        } else if let Some(backend) = optimized_backend(config) {
            return backend;
        }
    }
    Arc::new(ReferenceFft::new(config.planner_effort))
}

#[cfg(feature = "parallel")]
fn optimized_backend(config: &FftConfig) -> Option<Arc<dyn FftBackend>> {
    match ParallelFft::new(config.threads, config.planner_effort) {
        Ok(backend) => {
            debug!("Using {} FFT with {} threads", backend.name(), backend.threads());
            Some(Arc::new(backend))
        }
        Err(err) => {
            debug!("Parallel FFT unavailable ({}), using reference FFT", err);
            None
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn optimized_backend(_config: &FftConfig) -> Option<Arc<dyn FftBackend>> {
    None
}

/// Plans a 1D transform of length `len` with the planner chosen by `effort`.
fn plan(len: usize, direction: FftDirection, effort: PlannerEffort) -> Arc<dyn Fft<f64>> {
    match effort {
        PlannerEffort::Estimate => FftPlannerScalar::new().plan_fft(len, direction),
        _ => FftPlanner::new().plan_fft(len, direction),
    }
}

/// 1D plans owned by a backend, built once per length and direction.
#[derive(Default)]
pub(crate) struct PlanCache {
    effort: PlannerEffort,
    plans: Mutex<HashMap<(usize, bool), Arc<dyn Fft<f64>>>>,
}

impl PlanCache {
    pub(crate) fn new(effort: PlannerEffort) -> Self {
        Self {
            effort,
            plans: Mutex::default(),
        }
    }

    pub(crate) fn get(&self, len: usize, direction: FftDirection) -> Arc<dyn Fft<f64>> {
        let key = (len, direction == FftDirection::Forward);
        let mut plans = self.plans.lock().unwrap_or_else(PoisonError::into_inner);
        plans
            .entry(key)
            .or_insert_with(|| plan(len, direction, self.effort))
            .clone()
    }

    /// Number of plans built so far.
    pub(crate) fn len(&self) -> usize {
        self.plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanCache")
            .field("effort", &self.effort)
            .field("plans", &self.len())
            .finish()
    }
}

/// Transforms every row of a standard-layout array in place.
pub(crate) fn transform_rows(data: &mut Array2<Complex64>, fft: &dyn Fft<f64>) {
    let cols = data.ncols();
    if let Some(slice) = data.as_slice_mut() {
        for row in slice.chunks_exact_mut(cols) {
            fft.process(row);
        }
    } else {
        let mut buffer = vec![Complex64::default(); cols];
        for mut row in data.rows_mut() {
            buffer.iter_mut().zip(row.iter()).for_each(|(b, v)| *b = *v);
            fft.process(&mut buffer);
            row.iter_mut().zip(buffer.iter()).for_each(|(v, b)| *v = *b);
        }
    }
}

/// Swaps rows and columns into a fresh standard-layout array.
pub(crate) fn transposed(data: &Array2<Complex64>) -> Array2<Complex64> {
    data.t().as_standard_layout().into_owned()
}

/// Moves the zero-frequency sample to the centre of the array.
pub fn fftshift<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (rows, cols) = data.dim();
    roll(data, rows / 2, cols / 2)
}

/// Inverse of [`fftshift`], also for odd dimensions.
pub fn ifftshift<T: Clone>(data: &Array2<T>) -> Array2<T> {
    let (rows, cols) = data.dim();
    roll(data, rows - rows / 2, cols - cols / 2)
}

fn roll<T: Clone>(data: &Array2<T>, dy: usize, dx: usize) -> Array2<T> {
    let (rows, cols) = data.dim();
    if rows == 0 || cols == 0 {
        return data.clone();
    }
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        data[[(i + rows - dy % rows) % rows, (j + cols - dx % cols) % cols]].clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(rows: usize, cols: usize) -> Array2<Complex64> {
        Array2::from_shape_fn((rows, cols), |(i, j)| {
            Complex64::new((i * cols + j) as f64, (i as f64) - (j as f64) * 0.5)
        })
    }

    fn assert_close(a: &Array2<Complex64>, b: &Array2<Complex64>) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x.re, y.re, epsilon = 1e-9);
            assert_abs_diff_eq!(x.im, y.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn shift_moves_origin_to_centre() {
        let mut data = Array2::<f64>::zeros((4, 6));
        data[[0, 0]] = 1.0;
        let shifted = fftshift(&data);
        assert_eq!(shifted[[2, 3]], 1.0);
        assert_eq!(ifftshift(&shifted), data);
    }

    #[test]
    fn odd_shift_round_trips() {
        let data = Array2::from_shape_fn((5, 3), |(i, j)| (i * 3 + j) as f64);
        assert_eq!(ifftshift(&fftshift(&data)), data);
        assert_eq!(fftshift(&data)[[2, 1]], data[[0, 0]]);
    }

    #[test]
    fn reference_forward_matches_dft() {
        let data = ramp(4, 4);
        let mut transformed = data.clone();
        ReferenceFft::default().forward_2d(&mut transformed);

        let n = 4.0;
        for u in 0..4 {
            for v in 0..4 {
                let mut sum = Complex64::default();
                for ((i, j), value) in data.indexed_iter() {
                    let phase = -2.0 * std::f64::consts::PI * ((u * i) as f64 + (v * j) as f64) / n;
                    sum += value * Complex64::from_polar(1.0, phase);
                }
                assert_abs_diff_eq!(transformed[[u, v]].re, sum.re, epsilon = 1e-9);
                assert_abs_diff_eq!(transformed[[u, v]].im, sum.im, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn backends_agree() {
        let data = ramp(8, 6);
        let reference = select_backend(&FftConfig::reference());
        let optimized = select_backend(&FftConfig::optimized(2));

        let mut a = data.clone();
        let mut b = data.clone();
        reference.forward_2d(&mut a);
        optimized.forward_2d(&mut b);
        assert_close(&a, &b);

        reference.inverse_2d(&mut a);
        optimized.inverse_2d(&mut b);
        assert_close(&a, &b);
        assert_close(&a.mapv(|v| v / 48.0), &data);
    }

    #[test]
    fn plans_are_built_once_per_length() {
        let backend = ReferenceFft::new(PlannerEffort::Measure);
        let mut data = ramp(8, 6);
        backend.forward_2d(&mut data);
        assert_eq!(backend.cached_plans(), 2);
        backend.forward_2d(&mut data);
        assert_eq!(backend.cached_plans(), 2);
        backend.inverse_2d(&mut data);
        assert_eq!(backend.cached_plans(), 4);

        let mut square = ramp(8, 8);
        backend.forward_2d(&mut square);
        assert_eq!(backend.cached_plans(), 4);
    }

    #[test]
    fn patient_planning_matches_measure() {
        let data = ramp(6, 6);
        let mut a = data.clone();
        let mut b = data.clone();
        ReferenceFft::new(PlannerEffort::Measure).forward_2d(&mut a);
        ReferenceFft::new(PlannerEffort::Exhaustive).forward_2d(&mut b);
        assert_close(&a, &b);
    }

    #[test]
    fn selects_reference_when_not_requested() {
        assert_eq!(select_backend(&FftConfig::reference()).name(), "rustfft");
        #[cfg(feature = "parallel")]
        assert_eq!(select_backend(&FftConfig::optimized(2)).name(), "rustfft-rayon");
        #[cfg(not(feature = "parallel"))]
        assert_eq!(select_backend(&FftConfig::optimized(2)).name(), "rustfft");
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_backend_keeps_at_least_one_thread() {
        let backend = ParallelFft::new(0, PlannerEffort::Measure).unwrap();
        assert_eq!(backend.threads(), 1);
        let mut data = ramp(4, 4);
        backend.forward_2d(&mut data);
        assert_eq!(backend.cached_plans(), 1);
    }
}
