use fresnel_beam::{FresnelConfig, FresnelError, FresnelWavefront, Length, ThinLens};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn to_py_err(err: FresnelError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Fresnel wavefront. All lengths are in meters.
#[pyclass(name = "FresnelWavefront")]
pub struct PyFresnelWavefront {
    inner: FresnelWavefront,
}

#[pymethods]
impl PyFresnelWavefront {
    #[new]
    #[pyo3(signature = (beam_radius, wavelength=2e-6, npix=1024, oversample=2, rayl_factor=2.0, force_fresnel=true))]
    fn py_new(
        beam_radius: f64,
        wavelength: f64,
        npix: usize,
        oversample: usize,
        rayl_factor: f64,
        force_fresnel: bool,
    ) -> PyResult<Self> {
        let config = FresnelConfig {
            wavelength: Length::meters(wavelength),
            npix,
            oversample,
            rayl_factor,
            force_fresnel,
            ..FresnelConfig::default()
        };
        let inner = FresnelWavefront::new(Length::meters(beam_radius), &config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Propagate by `delta_z` along the optical axis.
    fn propagate_fresnel(&mut self, delta_z: f64) {
        self.inner.propagate_fresnel(Length::meters(delta_z));
    }

    fn propagate_direct(&mut self, z: f64) -> PyResult<()> {
        self.inner
            .propagate_direct(Length::meters(z))
            .map_err(to_py_err)
    }

    /// Apply a thin lens of focal length `focal_length` located at `z_lens`.
    #[pyo3(signature = (focal_length, z_lens, ignore_wavefront=false))]
    fn apply_lens(&mut self, focal_length: f64, z_lens: f64, ignore_wavefront: bool) -> PyResult<()> {
        let lens = ThinLens::new(
            Length::meters(focal_length),
            Length::meters(self.inner.wavelength()),
        )
        .with_oversample(self.inner.oversample());
        self.inner
            .apply_optic(&lens, Length::meters(z_lens), ignore_wavefront)
            .map_err(to_py_err)
    }

    #[getter]
    fn z(&self) -> f64 {
        self.inner.z().as_meters()
    }

    #[getter]
    fn z_w0(&self) -> f64 {
        self.inner.z_w0().as_meters()
    }

    #[getter]
    fn w_0(&self) -> f64 {
        self.inner.w_0().as_meters()
    }

    #[getter]
    fn z_r(&self) -> f64 {
        self.inner.z_r().as_meters()
    }

    #[getter]
    fn divergence(&self) -> f64 {
        self.inner.divergence()
    }

    #[getter]
    fn pixelscale(&self) -> f64 {
        self.inner.pixelscale()
    }

    #[getter]
    fn spherical(&self) -> bool {
        self.inner.is_spherical()
    }

    #[getter]
    fn force_fresnel(&self) -> bool {
        self.inner.force_fresnel()
    }

    fn param_str(&self) -> String {
        self.inner.param_str()
    }

    /// Waist positions and radii as two rows.
    fn waists(&self) -> Vec<Vec<f64>> {
        vec![
            self.inner.waists_z().to_vec(),
            self.inner.waists_w0().to_vec(),
        ]
    }

    /// Intensity of the field, optical axis at the centre.
    fn intensity(&self) -> Vec<Vec<f64>> {
        self.inner
            .centred_intensity()
            .outer_iter()
            .map(|row| row.to_vec())
            .collect()
    }

    fn history(&self) -> Vec<String> {
        self.inner.history().lines()
    }

    fn __repr__(&self) -> String {
        format!("FresnelWavefront({})", self.inner.param_str().replace('\n', ", "))
    }
}

/// Fresnel diffraction propagation implemented in Rust.
#[pymodule]
fn _fresnel_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFresnelWavefront>()?;
    Ok(())
}
