//! Optical elements that act on a wavefront through a complex mask.
//!
//! Every element answers one question: what complex phasor does it apply at
//! each point of a coordinate grid. Elements are immutable values, created
//! per optic and consumed by multiplication against a wavefront.

use std::fmt;

use log::debug;
use ndarray::{Array2, Zip};
use num_complex::Complex64;

use crate::config;
use crate::plane::PlaneType;
use crate::units::Length;
use crate::wavefront::wavenumber;

/// Capability shared by every element that can be multiplied onto a wavefront.
pub trait OpticalElement: fmt::Debug {
    fn name(&self) -> &str;

    fn planetype(&self) -> PlaneType;

    /// Zero-padding factor the element was designed for.
    fn oversample(&self) -> usize;

    /// Complex mask evaluated on physical `y`, `x` grids (meters).
    fn phasor(&self, y: &Array2<f64>, x: &Array2<f64>) -> Array2<Complex64>;
}

/// Quadratic phase factor `exp(i*k*r^2/(2z))` of a spherical wavefront
/// curvature with radius `z`.
///
/// Lawrence (1992), eq. 88.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadPhase {
    z: Length,
    reference_wavelength: f64,
    name: String,
    planetype: PlaneType,
    oversample: usize,
}

impl QuadPhase {
    /// `z` may be negative; `reference_wavelength` sets the wavenumber.
    pub fn new(z: Length, reference_wavelength: Length) -> Self {
        Self {
            z,
            reference_wavelength: reference_wavelength.as_meters(),
            name: "Quadratic Wavefront Curvature Operator".to_string(),
            planetype: PlaneType::Intermediate,
            oversample: config::DEFAULT_OVERSAMPLE,
        }
    }

    /// Radius of curvature given as a bare number of meters.
    pub fn from_meters(z: f64, reference_wavelength: Length) -> Self {
        Self::new(Length::assume_meters(z, "quadratic phase curvature"), reference_wavelength)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_planetype(mut self, planetype: PlaneType) -> Self {
        self.planetype = planetype;
        self
    }

    pub fn with_oversample(mut self, oversample: usize) -> Self {
        self.oversample = oversample;
        self
    }

    /// Radius of curvature.
    pub fn z(&self) -> Length {
        self.z
    }

    pub fn reference_wavelength(&self) -> f64 {
        self.reference_wavelength
    }
}

impl OpticalElement for QuadPhase {
    fn name(&self) -> &str {
        &self.name
    }

    fn planetype(&self) -> PlaneType {
        self.planetype
    }

    fn oversample(&self) -> usize {
        self.oversample
    }

    fn phasor(&self, y: &Array2<f64>, x: &Array2<f64>) -> Array2<Complex64> {
        let z = self.z.as_meters();
        let k = wavenumber(self.reference_wavelength);
        debug!("Applying spherical phase curvature = {:.2e} m", z);
        debug!("Applying spherical lens phase = {:.2e} 1/m", 1.0 / z);

        Zip::from(y)
            .and(x)
            .map_collect(|&y, &x| Complex64::from_polar(1.0, k * (x * x + y * y) / (2.0 * z)))
    }
}

/// Idealised thin lens: a quadratic phase with radius equal to the focal
/// length, remembered for Gaussian beam bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinLens {
    phase: QuadPhase,
    focal_length: Length,
}

impl ThinLens {
    pub fn new(focal_length: Length, reference_wavelength: Length) -> Self {
        let focal_length = focal_length.to(crate::units::LengthUnit::Meter);
        let phase = QuadPhase::new(focal_length, reference_wavelength).with_name("Gaussian Lens");
        debug!("Initialized: {}, fl = {:.2}", phase.name(), focal_length);
        Self {
            phase,
            focal_length,
        }
    }

    /// Focal length given as a bare number of meters.
    pub fn from_meters(focal_length: f64, reference_wavelength: Length) -> Self {
        Self::new(Length::assume_meters(focal_length, "focal length"), reference_wavelength)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.phase = self.phase.with_name(name);
        self
    }

    pub fn with_planetype(mut self, planetype: PlaneType) -> Self {
        self.phase = self.phase.with_planetype(planetype);
        self
    }

    pub fn with_oversample(mut self, oversample: usize) -> Self {
        self.phase = self.phase.with_oversample(oversample);
        self
    }

    pub fn focal_length(&self) -> Length {
        self.focal_length
    }
}

impl OpticalElement for ThinLens {
    fn name(&self) -> &str {
        self.phase.name()
    }

    fn planetype(&self) -> PlaneType {
        self.phase.planetype()
    }

    fn oversample(&self) -> usize {
        self.phase.oversample()
    }

    fn phasor(&self, y: &Array2<f64>, x: &Array2<f64>) -> Array2<Complex64> {
        self.phase.phasor(y, x)
    }
}

/// Circular aperture: unit transmission inside `radius`, opaque outside.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularAperture {
    radius: Length,
    name: String,
    planetype: PlaneType,
    oversample: usize,
}

impl CircularAperture {
    pub fn new(radius: Length) -> Self {
        Self {
            radius,
            name: "Circle".to_string(),
            planetype: PlaneType::Pupil,
            oversample: config::DEFAULT_OVERSAMPLE,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_oversample(mut self, oversample: usize) -> Self {
        self.oversample = oversample;
        self
    }
}

impl OpticalElement for CircularAperture {
    fn name(&self) -> &str {
        &self.name
    }

    fn planetype(&self) -> PlaneType {
        self.planetype
    }

    fn oversample(&self) -> usize {
        self.oversample
    }

    fn phasor(&self, y: &Array2<f64>, x: &Array2<f64>) -> Array2<Complex64> {
        let r2 = self.radius.as_meters().powi(2);
        Zip::from(y).and(x).map_collect(|&y, &x| {
            if x * x + y * y <= r2 {
                Complex64::new(1.0, 0.0)
            } else {
                Complex64::default()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavefront::centred_coordinates;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn quad_phase_matches_formula() {
        let (y, x) = centred_coordinates((8, 8), 1e-3);
        let q = QuadPhase::new(Length::meters(2.0), Length::micrometers(1.0));
        let phasor = q.phasor(&y, &x);

        let k = 2.0 * PI / 1e-6;
        let (r_y, r_x) = (y[[7, 1]], x[[7, 1]]);
        let expected = k * (r_x * r_x + r_y * r_y) / 4.0;
        let got = phasor[[7, 1]];
        assert_relative_eq!(got.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(got.re, expected.cos(), epsilon = 1e-9);
        assert_relative_eq!(got.im, expected.sin(), epsilon = 1e-9);
        // no phase on axis
        assert_eq!(phasor[[4, 4]], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn opposite_curvatures_cancel() {
        let (y, x) = centred_coordinates((6, 6), 2e-3);
        let a = QuadPhase::new(Length::meters(0.7), Length::micrometers(0.5)).phasor(&y, &x);
        let b = QuadPhase::new(Length::meters(-0.7), Length::micrometers(0.5)).phasor(&y, &x);
        for (p, q) in a.iter().zip(b.iter()) {
            assert!((p * q - Complex64::new(1.0, 0.0)).norm() < 1e-9);
        }
    }

    #[test]
    fn lens_is_quad_phase_of_focal_length() {
        let (y, x) = centred_coordinates((6, 6), 1e-3);
        let lens = ThinLens::new(Length::millimeters(500.0), Length::micrometers(1.0));
        assert_eq!(lens.focal_length(), Length::meters(0.5));
        assert_eq!(lens.focal_length().unit(), crate::units::LengthUnit::Meter);
        assert_eq!(lens.name(), "Gaussian Lens");
        assert_eq!(lens.planetype(), PlaneType::Intermediate);
        assert_eq!(lens.oversample(), 2);

        let quad = QuadPhase::new(Length::meters(0.5), Length::micrometers(1.0));
        assert_eq!(lens.phasor(&y, &x), quad.phasor(&y, &x));
    }

    #[test]
    fn bare_focal_length_assumed_meters() {
        let lens = ThinLens::from_meters(0.25, Length::micrometers(1.0));
        assert_eq!(lens.focal_length(), Length::meters(0.25));
    }

    #[test]
    fn aperture_masks_outside_radius() {
        let (y, x) = centred_coordinates((8, 8), 1.0);
        let mask = CircularAperture::new(Length::meters(2.0)).phasor(&y, &x);
        assert_eq!(mask[[4, 4]], Complex64::new(1.0, 0.0));
        assert_eq!(mask[[4, 6]], Complex64::new(1.0, 0.0));
        assert_eq!(mask[[4, 7]], Complex64::default());
        assert_eq!(mask[[0, 0]], Complex64::default());
    }
}
