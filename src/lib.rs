//! Fresnel (near-field) diffraction propagation of sampled optical wavefronts.
//!
//! A [`FresnelWavefront`] carries a complex field together with a Gaussian
//! beam model and is propagated through free space and thin lenses, choosing
//! between plane-to-plane, waist-to-spherical and spherical-to-waist kernels
//! from where each plane lies relative to the beam waist.
//!
//! # Modules
//!
//! - [`fresnel`]: the propagator and lens interaction
//! - [`wavefront`]: sampled field container and Fraunhofer fallback
//! - [`optic`]: quadratic phase, thin lens and aperture elements
//! - [`beam`]: Gaussian beam relations
//! - [`fft`]: pluggable FFT backends
//! - [`settings`], [`train`], [`output`]: configuration, optical train
//!   runner and output files

pub mod beam;
pub mod config;
pub mod display;
pub mod error;
pub mod fft;
pub mod fresnel;
pub mod history;
pub mod optic;
pub mod output;
pub mod plane;
pub mod result;
pub mod settings;
pub mod train;
pub mod units;
pub mod wavefront;

pub use crate::error::FresnelError;
pub use crate::fresnel::{FresnelConfig, FresnelWavefront, LensRegime};
pub use crate::optic::{CircularAperture, OpticalElement, QuadPhase, ThinLens};
pub use crate::plane::PlaneType;
pub use crate::units::{Length, LengthUnit};
