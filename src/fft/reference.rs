//! Reference backend: single-threaded rustfft.

use ndarray::Array2;
use num_complex::Complex64;
use rustfft::FftDirection;

use super::{transform_rows, transposed, FftBackend, PlanCache, PlannerEffort};

#[derive(Debug, Default)]
pub struct ReferenceFft {
    plans: PlanCache,
}

impl ReferenceFft {
    pub fn new(effort: PlannerEffort) -> Self {
        Self {
            plans: PlanCache::new(effort),
        }
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

        transform_rows(data, self.plans.get(cols, direction).as_ref());

        let mut columns = transposed(data);
        transform_rows(&mut columns, self.plans.get(rows, direction).as_ref());
        data.assign(&columns.t());
    }
}

impl FftBackend for ReferenceFft {
    fn forward_2d(&self, data: &mut Array2<Complex64>) {
        self.transform(data, FftDirection::Forward);
    }

    fn inverse_2d(&self, data: &mut Array2<Complex64>) {
        self.transform(data, FftDirection::Inverse);
    }

    fn name(&self) -> &'static str {
        "rustfft"
    }
}
