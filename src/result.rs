use std::time::Duration;

use chrono::Local;
use serde::Serialize;

use crate::fresnel::FresnelWavefront;
use crate::plane::PlaneType;

/// A beam waist created by the source or an optic. Meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Waist {
    pub z: f64,
    pub w_0: f64,
}

/// Serializable summary of the final state of a propagation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub wavelength: f64,
    pub z: f64,
    pub z_w0: f64,
    pub w_0: f64,
    pub z_r: f64,
    pub divergence: f64,
    pub spherical: bool,
    pub pixelscale: f64,
    pub planetype: PlaneType,
    pub shape: (usize, usize),
    pub total_intensity: f64,
    pub fft_backend: String,
    pub elapsed_seconds: f64,
    pub waists: Vec<Waist>,
    pub history: Vec<String>,
}

impl RunSummary {
    pub fn new(wavefront: &FresnelWavefront, elapsed: Duration) -> Self {
        let waists = wavefront
            .waists_z()
            .iter()
            .zip(wavefront.waists_w0())
            .map(|(&z, &w_0)| Waist { z, w_0 })
            .collect();

        Self {
            timestamp: Local::now().to_rfc3339(),
            wavelength: wavefront.wavelength(),
            z: wavefront.z().as_meters(),
            z_w0: wavefront.z_w0().as_meters(),
            w_0: wavefront.w_0().as_meters(),
            z_r: wavefront.z_r().as_meters(),
            divergence: wavefront.divergence(),
            spherical: wavefront.is_spherical(),
            pixelscale: wavefront.pixelscale(),
            planetype: wavefront.planetype(),
            shape: wavefront.wavefront().shape(),
            total_intensity: wavefront.wavefront().total_intensity(),
            fft_backend: wavefront.wavefront().fft_backend().to_string(),
            elapsed_seconds: elapsed.as_secs_f64(),
            waists,
            history: wavefront.history().lines(),
        }
    }
}
