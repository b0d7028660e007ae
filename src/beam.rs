//! Gaussian beam parameters of a propagating wavefront.
//!
//! The beam model is described entirely by its wavelength and the size and
//! axial location of its most recent waist. Everything else (Rayleigh range,
//! divergence, curvature, spot size) is derived on demand.
//!
//! # References
//!
//! - Lawrence, G. N. (1992), Optical Modeling, in Applied Optics and Optical
//!   Engineering, vol. XI, Academic Press, New York.
//! - IDEX Optics and Photonics, Gaussian Beam Optics.

use std::f64::consts::PI;

use serde::Serialize;

/// Gaussian beam model valid until the next optic updates it.
///
/// **Context**: Fresnel propagation picks its kernels from where the target
/// plane lies relative to the beam waist, so the waist has to be tracked
/// through every lens the beam crosses.
///
/// **How it Works**: Stores the waist radius `w_0` and position `z_w0` (both
/// in meters) and derives the remaining quantities from the standard
/// Gaussian beam relations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaussianBeam {
    pub wavelength: f64,
    pub w_0: f64,
    pub z_w0: f64,
}

impl GaussianBeam {
    pub fn new(wavelength: f64, w_0: f64, z_w0: f64) -> Self {
        Self {
            wavelength,
            w_0,
            z_w0,
        }
    }

    /// Distance from the waist at which the cross-section area has doubled.
    pub fn rayleigh_range(&self) -> f64 {
        PI * self.w_0 * self.w_0 / self.wavelength
    }

    /// Full far-field divergence angle in radians.
    pub fn divergence(&self) -> f64 {
        2.0 * self.wavelength / (PI * self.w_0)
    }

    /// Radius of curvature of the wavefront at axial position `z`.
    /// Infinite exactly at the waist.
    pub fn radius_of_curvature(&self, z: f64) -> f64 {
        let dz = z - self.z_w0;
        if dz == 0.0 {
            return f64::INFINITY;
        }
        dz * (1.0 + (self.rayleigh_range() / dz).powi(2))
    }

    /// Beam radius at axial position `z`.
    pub fn spot_radius(&self, z: f64) -> f64 {
        self.w_0 * (1.0 + ((z - self.z_w0) / self.rayleigh_range()).powi(2)).sqrt()
    }

    /// True iff `z` lies strictly within one Rayleigh range of the waist.
    pub fn planar_range(&self, z: f64) -> bool {
        (self.z_w0 - z).abs() < self.rayleigh_range()
    }

    /// Waist of the beam leaving a lens at `z_lens`, where the output
    /// wavefront has radius of curvature `r_curve` and the beam radius is
    /// `spot`. Returns the new `(z_w0, w_0)`.
    pub fn through_lens(&self, z_lens: f64, r_curve: f64, spot: f64) -> (f64, f64) {
        let a = self.wavelength * r_curve / (PI * spot * spot);
        let z_w0 = -r_curve / (1.0 + a * a) + z_lens;
        let b = PI * spot * spot / (self.wavelength * r_curve);
        let w_0 = spot / (1.0 + b * b).sqrt();
        (z_w0, w_0)
    }
}
