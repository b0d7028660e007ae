//! Multi-threaded backend: rustfft row and column passes on a rayon pool.

use std::fmt;

use ndarray::Array2;
use num_complex::Complex64;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use rustfft::{Fft, FftDirection};

use super::{transposed, FftBackend, PlanCache, PlannerEffort};

pub struct ParallelFft {
    pool: ThreadPool,
    threads: usize,
    plans: PlanCache,
}

impl ParallelFft {
    /// Creates a backend with its own pool of `threads` workers.
    pub fn new(threads: usize, effort: PlannerEffort) -> Result<Self, ThreadPoolBuildError> {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
        Ok(Self {
            pool,
            threads,
            plans: PlanCache::new(effort),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Number of 1D plans built so far.
    pub fn cached_plans(&self) -> usize {
        self.plans.len()
    }

    fn transform(&self, data: &mut Array2<Complex64>, direction: FftDirection) {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return;
        }
        if !data.is_standard_layout() {
            *data = data.as_standard_layout().into_owned();
        }

        let row_fft = self.plans.get(cols, direction);
        let col_fft = self.plans.get(rows, direction);

        self.pool.install(|| {
            par_transform_rows(data, row_fft.as_ref());
            let mut columns = transposed(data);
            par_transform_rows(&mut columns, col_fft.as_ref());
            data.assign(&columns.t());
        });
    }
}

fn par_transform_rows(data: &mut Array2<Complex64>, fft: &dyn Fft<f64>) {
    let cols = data.ncols();
    // callers hand in standard layout, so the slice is always contiguous
    if let Some(slice) = data.as_slice_mut() {
        slice
            .par_chunks_exact_mut(cols)
            .for_each(|row| fft.process(row));
    } else {
        super::transform_rows(data, fft);
    }
}

impl FftBackend for ParallelFft {
    fn forward_2d(&self, data: &mut Array2<Complex64>) {
        self.transform(data, FftDirection::Forward);
    }

    fn inverse_2d(&self, data: &mut Array2<Complex64>) {
        self.transform(data, FftDirection::Inverse);
    }

    fn name(&self) -> &'static str {
        "rustfft-rayon"
    }
}

impl fmt::Debug for ParallelFft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelFft")
            .field("threads", &self.threads)
            .field("plans", &self.plans)
            .finish()
    }
}
