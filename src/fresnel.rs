//! Fresnel (near-field) diffraction propagation.
//!
//! This module extends the Fraunhofer-domain [`Wavefront`] with Gaussian beam
//! bookkeeping so that a sampled wavefront can be carried through free space
//! and thin lenses while the sampling follows the beam.
//!
//! The propagator provides:
//! - Plane-to-plane propagation within the Rayleigh range of a waist
//! - Waist-to-spherical and spherical-to-waist propagation, which rescale
//!   the pixel size through the Fourier relation
//! - Regime selection from where the target plane lies relative to the waist
//! - Thin lens interaction, updating the beam waist and wavefront curvature
//! - Direct single-FFT propagation for far-field distances
//!
//! # References
//!
//! - Lawrence, G. N. (1992), Optical Modeling, in Applied Optics and Optical
//!   Engineering, vol. XI, Academic Press, New York.
//! - Krist, J. E. (2007), PROPER: an optical propagation library for IDL,
//!   Proc. SPIE 6675.
//! - Andersen, T., and A. Enmark (2011), Integrated Modeling of Telescopes,
//!   Springer.

use std::f64::consts::PI;

use log::{debug, error, warn};
use ndarray::{Array2, Zip};
use num_complex::Complex64;

use crate::beam::GaussianBeam;
use crate::config;
use crate::display::{DisplayMode, PlaneObserver};
use crate::error::FresnelError;
use crate::fft::{fftshift, ifftshift, select_backend, FftConfig};
use crate::history::{Event, History};
use crate::optic::{OpticalElement, QuadPhase, ThinLens};
use crate::plane::PlaneType;
use crate::units::{Length, LengthUnit};
use crate::wavefront::{
    centred_coordinates, fft_frequencies_sq, fft_order_coordinates, wavenumber, Sampling,
    Wavefront,
};

/// Construction parameters of a [`FresnelWavefront`].
#[derive(Debug, Clone, PartialEq)]
pub struct FresnelConfig {
    pub wavelength: Length,
    /// Pixels across the illuminated beam diameter, before padding.
    pub npix: usize,
    /// Zero-padding factor applied on top of the beam diameter.
    pub oversample: usize,
    /// Unit used when reporting beam parameters.
    pub units: LengthUnit,
    /// Use Fresnel propagation even between pupil and image planes.
    pub force_fresnel: bool,
    /// Multiple of the Rayleigh range beyond which the input beam of an optic
    /// is treated as spherical.
    pub rayl_factor: f64,
    pub fft: FftConfig,
    pub record_history: bool,
}

impl Default for FresnelConfig {
    fn default() -> Self {
        Self {
            wavelength: Length::meters(config::DEFAULT_WAVELENGTH),
            npix: config::DEFAULT_NPIX,
            oversample: config::DEFAULT_OVERSAMPLE,
            units: LengthUnit::Meter,
            force_fresnel: true,
            rayl_factor: config::DEFAULT_RAYL_FACTOR,
            fft: FftConfig::default(),
            record_history: true,
        }
    }
}

/// Curvature regime of the beam across a thin lens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LensRegime {
    PlaneToPlane,
    PlaneToSpherical,
    SphericalToSpherical,
    SphericalToPlane,
}

impl LensRegime {
    /// Regime from the input curvature and whether the lens lies strictly
    /// inside the Rayleigh range of the output waist.
    pub fn classify(spherical: bool, lens_in_range: bool) -> Self {
        match (spherical, lens_in_range) {
            (false, true) => LensRegime::PlaneToPlane,
            (false, false) => LensRegime::PlaneToSpherical,
            (true, false) => LensRegime::SphericalToSpherical,
            (true, true) => LensRegime::SphericalToPlane,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LensRegime::PlaneToPlane => "plane-to-plane",
            LensRegime::PlaneToSpherical => "plane-to-spherical",
            LensRegime::SphericalToSpherical => "spherical-to-spherical",
            LensRegime::SphericalToPlane => "spherical-to-plane",
        }
    }

    /// Whether the wavefront leaving the lens is spherical.
    pub fn output_spherical(self, spherical: bool) -> bool {
        match self {
            LensRegime::PlaneToSpherical => true,
            LensRegime::SphericalToPlane => false,
            _ => spherical,
        }
    }

    /// Focal length of the phase actually applied at the lens.
    ///
    /// Curvatures combine reciprocally: `1/z_eff = 1/f + 1/z_rel - 1/r_input`,
    /// where `z_rel` is the wavefront position and `zl_rel` the lens position,
    /// both relative to the output waist, and `r_input` the curvature radius
    /// of the incoming beam (infinite when flat). Zero distances are checked
    /// before the generic combination, lens-at-waist first.
    pub fn effective_focal_length(
        self,
        fl: f64,
        z_rel: f64,
        zl_rel: f64,
        r_input: f64,
    ) -> Result<f64, FresnelError> {
        let degenerate = FresnelError::DegenerateCurvature {
            regime: self.name(),
        };
        let z_eff = match self {
            LensRegime::PlaneToPlane => fl,
            LensRegime::PlaneToSpherical => 1.0 / (1.0 / fl + 1.0 / z_rel),
            LensRegime::SphericalToSpherical => {
                if zl_rel == 0.0 {
                    1.0 / (1.0 / fl + 1.0 / z_rel)
                } else if r_input == 0.0 {
                    return Err(degenerate);
                } else {
                    1.0 / (1.0 / fl + 1.0 / z_rel - 1.0 / r_input)
                }
            }
            LensRegime::SphericalToPlane => {
                if r_input == 0.0 {
                    return Err(degenerate);
                }
                1.0 / (1.0 / fl - 1.0 / r_input)
            }
        };

        // an infinite z_eff is a flat output wavefront, zero has no phase
        if z_eff.is_nan() || z_eff == 0.0 {
            return Err(degenerate);
        }
        Ok(z_eff)
    }
}

/// Wavefront for Fresnel diffraction calculations.
///
/// **Context**: Fraunhofer propagation only links pupil and image planes. To
/// follow a beam through arbitrary distances and lenses, the wavefront must
/// know where it sits relative to the beam waist and whether its curvature is
/// locally planar or spherical, since that decides which propagation kernel
/// pair is valid and how the sampling changes.
///
/// **How it Works**: Wraps a [`Wavefront`] (field, pixel scale, plane type)
/// and tracks a [`GaussianBeam`] model, the current axial position `z`, the
/// planar/spherical regime and the history of every waist an optic created.
/// Every propagation and optic call mutates this state in place; it is meant
/// for a single owner calling sequentially.
#[derive(Debug, Clone)]
pub struct FresnelWavefront {
    wavefront: Wavefront,
    beam: GaussianBeam,
    z: f64,               // current axial position, meters
    spherical: bool,      // regime of the wavefront at z
    waists_z: Vec<f64>,   // waist positions, in the order created
    waists_w0: Vec<f64>,  // waist radii, parallel to waists_z
    rayl_factor: f64,
    force_fresnel: bool,
    units: LengthUnit,
    fft_order: bool, // field currently stored corner-centred
}

impl FresnelWavefront {
    /// Creates a pupil-plane wavefront illuminated over `2 * beam_radius`.
    pub fn new(beam_radius: Length, config: &FresnelConfig) -> Result<Self, FresnelError> {
        if !(beam_radius.as_meters() > 0.0) {
            return Err(FresnelError::InvalidParameter(format!(
                "beam radius must be positive, got {}",
                beam_radius
            )));
        }
        let mut wavefront = Wavefront::new(
            config.wavelength,
            config.npix,
            Sampling::Diameter(beam_radius * 2.0),
            config.oversample,
            select_backend(&config.fft),
        )?;
        wavefront.history.set_enabled(config.record_history);

        Self::from_wavefront(wavefront, beam_radius, config)
    }

    /// Wraps an existing wavefront. Wavelength, sampling, oversampling and
    /// FFT backend come from `wavefront`; only the beam options of `config`
    /// are used.
    pub fn from_wavefront(
        mut wavefront: Wavefront,
        beam_radius: Length,
        config: &FresnelConfig,
    ) -> Result<Self, FresnelError> {
        if wavefront.planetype.is_angular() {
            return Err(FresnelError::ImagePlaneInput);
        }
        if !(config.rayl_factor > 0.0) {
            return Err(FresnelError::InvalidParameter(format!(
                "rayl_factor must be positive, got {}",
                config.rayl_factor
            )));
        }
        let w_0 = beam_radius.as_meters();
        if !(w_0 > 0.0) {
            return Err(FresnelError::InvalidParameter(format!(
                "beam radius must be positive, got {}",
                beam_radius
            )));
        }

        if wavefront.oversample > 1 && !wavefront.ispadded {
            wavefront.pad_to_oversample();
        } else {
            debug!("Skipping oversampling, oversample < 1 or already padded");
        }
        if wavefront.oversample < config::RECOMMENDED_OVERSAMPLE {
            warn!("Oversampling > 2x suggested for reliable results.");
        }

        let (rows, cols) = wavefront.shape();
        if rows != cols {
            return Err(FresnelError::NonSquareGrid { rows, cols });
        }

        let beam = GaussianBeam::new(wavefront.wavelength, w_0, 0.0);
        Ok(Self {
            wavefront,
            beam,
            z: 0.0,
            spherical: false,
            waists_z: vec![0.0],
            waists_w0: vec![w_0],
            rayl_factor: config.rayl_factor,
            force_fresnel: config.force_fresnel,
            units: config.units,
            fft_order: false,
        })
    }

    fn length(&self, meters: f64) -> Length {
        Length::meters(meters).to(self.units)
    }

    /// Current axial position.
    pub fn z(&self) -> Length {
        self.length(self.z)
    }

    /// Axial position of the current beam waist.
    pub fn z_w0(&self) -> Length {
        self.length(self.beam.z_w0)
    }

    /// Radius of the current beam waist.
    pub fn w_0(&self) -> Length {
        self.length(self.beam.w_0)
    }

    /// Rayleigh range of the current beam waist.
    pub fn z_r(&self) -> Length {
        self.length(self.beam.rayleigh_range())
    }

    /// Far-field divergence angle in radians.
    pub fn divergence(&self) -> f64 {
        self.beam.divergence()
    }

    /// Radius of curvature of the beam at axial position `z`.
    pub fn r_c(&self, z: Length) -> Length {
        self.length(self.beam.radius_of_curvature(z.as_meters()))
    }

    /// Beam radius at axial position `z`.
    pub fn spot_radius(&self, z: Length) -> Length {
        self.length(self.beam.spot_radius(z.as_meters()))
    }

    /// True iff `z` lies strictly within one Rayleigh range of the waist.
    pub fn planar_range(&self, z: Length) -> bool {
        self.beam.planar_range(z.as_meters())
    }

    pub fn beam(&self) -> &GaussianBeam {
        &self.beam
    }

    pub fn wavelength(&self) -> f64 {
        self.wavefront.wavelength
    }

    pub fn is_spherical(&self) -> bool {
        self.spherical
    }

    pub fn rayl_factor(&self) -> f64 {
        self.rayl_factor
    }

    pub fn force_fresnel(&self) -> bool {
        self.force_fresnel
    }

    pub fn units(&self) -> LengthUnit {
        self.units
    }

    pub fn oversample(&self) -> usize {
        self.wavefront.oversample
    }

    pub fn pixelscale(&self) -> f64 {
        self.wavefront.pixelscale
    }

    pub fn planetype(&self) -> PlaneType {
        self.wavefront.planetype
    }

    pub fn field(&self) -> &Array2<Complex64> {
        &self.wavefront.field
    }

    pub fn history(&self) -> &History {
        &self.wavefront.history
    }

    pub fn wavefront(&self) -> &Wavefront {
        &self.wavefront
    }

    pub fn wavefront_mut(&mut self) -> &mut Wavefront {
        &mut self.wavefront
    }

    /// Field with the optical axis at the array centre, whatever the current
    /// storage order.
    pub fn centred_field(&self) -> Array2<Complex64> {
        if self.fft_order {
            fftshift(&self.wavefront.field)
        } else {
            self.wavefront.field.clone()
        }
    }

    pub fn centred_intensity(&self) -> Array2<f64> {
        self.centred_field().mapv(|v| v.norm_sqr())
    }

    /// Waist positions (row 0) and radii (row 1) in meters, one column per
    /// waist in the order they were created.
    pub fn waists(&self) -> Array2<f64> {
        Array2::from_shape_fn((2, self.waists_z.len()), |(i, j)| {
            if i == 0 {
                self.waists_z[j]
            } else {
                self.waists_w0[j]
            }
        })
    }

    pub fn waists_z(&self) -> &[f64] {
        &self.waists_z
    }

    pub fn waists_w0(&self) -> &[f64] {
        &self.waists_w0
    }

    /// Formatted Gaussian beam parameters.
    pub fn param_str(&self) -> String {
        let u = self.units;
        format!(
            "w_0:{:.3e} {u}, z_w0={:.3e} {u}\nz={:.3e} {u}, z_R={:.3e} {u}",
            self.w_0().value(),
            self.z_w0().value(),
            self.z().value(),
            self.z_r().value(),
        )
    }

    /// Physical Y, X coordinates of the field in its current storage order.
    pub fn coordinates(&self) -> (Array2<f64>, Array2<f64>) {
        let shape = self.wavefront.shape();
        if self.fft_order {
            fft_order_coordinates(shape, self.wavefront.pixelscale)
        } else {
            centred_coordinates(shape, self.wavefront.pixelscale)
        }
    }

    /// Multiplies the field by the mask of `element`.
    pub fn multiply(&mut self, element: &dyn OpticalElement) {
        let (y, x) = self.coordinates();
        let phasor = element.phasor(&y, &x);
        self.wavefront.multiply_phasor(&phasor, element.name());
    }

    /// Normalised forward 2D FFT: the raw transform divided by the linear
    /// grid size.
    pub fn fft(&mut self) {
        debug!("Forward FFT using {}", self.wavefront.fft.name());
        let n = self.wavefront.field.nrows() as f64;
        self.wavefront.fft.forward_2d(&mut self.wavefront.field);
        self.wavefront.field.mapv_inplace(|v| v / n);
    }

    /// Normalised inverse 2D FFT, undoing [`fft`](Self::fft) exactly.
    pub fn inv_fft(&mut self) {
        debug!("Inverse FFT using {}", self.wavefront.fft.name());
        let (rows, cols) = self.wavefront.field.dim();
        let scale = rows as f64 / (rows * cols) as f64;
        self.wavefront.fft.inverse_2d(&mut self.wavefront.field);
        self.wavefront.field.mapv_inplace(|v| v * scale);
    }

    /// Pixel scale after a Fourier-domain step over `dz` meters.
    fn fourier_pixelscale(&self, dz: f64) -> f64 {
        let n = self.wavefront.field.nrows() as f64;
        self.wavefront.wavelength * dz.abs() / (n * self.wavefront.pixelscale)
    }

    fn quad_phase(&self, dz: Length) -> QuadPhase {
        QuadPhase::new(dz, Length::meters(self.wavefront.wavelength))
            .with_oversample(self.wavefront.oversample)
    }

    /// Plane-to-plane propagation over `dz`, keeping the wavefront planar and
    /// the pixel scale unchanged. Used entirely within the Rayleigh range.
    ///
    /// Lawrence eq. 82, 86, 87.
    pub fn ptp(&mut self, dz: Length) {
        let dz_m = dz.as_meters();
        if dz_m.abs() < config::NEGLIGIBLE_DISTANCE {
            debug!("Skipping small dz = {}", dz);
            return;
        }
        if self.spherical {
            debug!("Plane-to-plane propagation of a spherical wavefront");
        }

        let rho = fft_frequencies_sq(self.wavefront.shape(), self.wavefront.pixelscale);
        // transfer function exp(-i*pi*lambda*dz*rho)
        let phase = -PI * self.wavefront.wavelength * dz_m;

        self.fft();
        Zip::from(&mut self.wavefront.field)
            .and(&rho)
            .for_each(|f, &r| *f *= Complex64::from_polar(1.0, phase * r));
        self.inv_fft();

        self.z += dz_m;
        self.wavefront
            .history
            .push(Event::PlaneToPlane { dz: dz_m });
    }

    /// Waist-to-spherical propagation over `dz`: a planar wavefront near the
    /// waist becomes a spherical one outside the Rayleigh range.
    ///
    /// Lawrence eq. 83, 88.
    pub fn wts(&mut self, dz: Length) {
        let dz_m = dz.as_meters();
        debug!("Waist to Spherical propagation, dz = {}", dz);
        if dz_m == 0.0 {
            error!("Waist to Spherical propagation stopped, no change in distance.");
            return;
        }
        if self.spherical {
            debug!("Waist-to-spherical propagation of a spherical wavefront");
        }

        let curvature = self.quad_phase(dz);
        self.multiply(&curvature);
        if dz_m > 0.0 {
            self.fft();
        } else {
            self.inv_fft();
        }

        self.wavefront.pixelscale = self.fourier_pixelscale(dz_m);
        self.z += dz_m;
        self.spherical = true;
        self.wavefront
            .history
            .push(Event::WaistToSpherical { dz: dz_m });
    }

    /// Spherical-to-waist propagation over `dz`: a spherical wavefront outside
    /// the Rayleigh range becomes planar at the waist.
    ///
    /// Lawrence eq. 89.
    pub fn stw(&mut self, dz: Length) {
        let dz_m = dz.as_meters();
        debug!("Spherical to Waist propagation, dz = {}", dz);
        if dz_m == 0.0 {
            error!("Spherical to Waist propagation stopped, no change in distance.");
            return;
        }
        if !self.spherical {
            debug!("Spherical-to-waist propagation of a planar wavefront");
        }

        if dz_m > 0.0 {
            self.fft();
        } else {
            self.inv_fft();
        }

        // the curvature is evaluated on the new sampling
        self.wavefront.pixelscale = self.fourier_pixelscale(dz_m);
        let curvature = self.quad_phase(dz);
        self.multiply(&curvature);
        self.z += dz_m;
        self.spherical = false;
        self.wavefront
            .history
            .push(Event::SphericalToWaist { dz: dz_m });
    }

    fn to_fft_order(&mut self) {
        if !self.fft_order {
            self.wavefront.field = ifftshift(&self.wavefront.field);
            self.fft_order = true;
        }
    }

    fn to_centred_order(&mut self) {
        if self.fft_order {
            self.wavefront.field = fftshift(&self.wavefront.field);
            self.fft_order = false;
        }
    }

    fn show(&self, observer: &mut Option<&mut dyn PlaneObserver>, title: &str) {
        if let Some(observer) = observer.as_deref_mut() {
            observer.display(self, DisplayMode::Both, title);
        }
    }

    /// Propagates the wavefront by `delta_z` along the optical axis.
    ///
    /// Spherical wavefronts are first taken back to the waist, then on to the
    /// target plane with the kernel that fits where the target lies relative
    /// to the Rayleigh range.
    pub fn propagate_fresnel(&mut self, delta_z: Length) {
        self.propagate(delta_z, None);
    }

    /// Like [`propagate_fresnel`](Self::propagate_fresnel), showing the start
    /// surface, any intermediate waist and the end surface to `observer`.
    pub fn propagate_fresnel_observed(&mut self, delta_z: Length, observer: &mut dyn PlaneObserver) {
        self.propagate(delta_z, Some(observer));
    }

    fn propagate(&mut self, delta_z: Length, mut observer: Option<&mut dyn PlaneObserver>) {
        let z_target = self.z + delta_z.as_meters();
        self.show(&mut observer, "Starting Surface");

        self.to_fft_order();
        debug!("Beginning Fresnel Prop. Waist at z = {:.4e} m", self.beam.z_w0);

        let to_waist = Length::meters(self.beam.z_w0 - self.z);
        match (self.spherical, self.beam.planar_range(z_target)) {
            (false, true) => {
                debug!("Plane to Plane Regime, dz = {}", delta_z);
                debug!("Constant Pixelscale: {:.2e}", self.wavefront.pixelscale);
                self.ptp(delta_z);
            }
            (false, false) => {
                debug!("Plane to Spherical, inside Z_R to outside Z_R");
                self.ptp(to_waist);
                self.show(&mut observer, "Intermediate Waist");
                self.wts(Length::meters(z_target - self.beam.z_w0));
            }
            (true, true) => {
                debug!("Spherical to Plane Regime, outside Z_R to inside Z_R");
                self.stw(to_waist);
                self.show(&mut observer, "Intermediate Waist");
                self.ptp(Length::meters(z_target - self.beam.z_w0));
            }
            (true, false) => {
                debug!("Spherical to Spherical, Outside Z_R to waist (z_w0) to outside Z_R");
                debug!("Starting Pixelscale: {:.2e}", self.wavefront.pixelscale);
                self.stw(to_waist);
                debug!("Intermediate Pixelscale: {:.2e}", self.wavefront.pixelscale);
                self.show(&mut observer, "Intermediate Waist");
                self.wts(Length::meters(z_target - self.beam.z_w0));
            }
        }

        self.to_centred_order();
        self.wavefront.planetype = PlaneType::Intermediate;
        self.show(&mut observer, "Final Surface");
        debug!(
            "------ Propagated to plane of type {} at z = {:.2e} m ------",
            self.wavefront.planetype, z_target
        );
    }

    /// Passes the wavefront through a thin lens at axial position `z_lens`,
    /// updating the Gaussian beam parameters and the wavefront curvature.
    ///
    /// With `ignore_wavefront` only the beam parameters are updated, which is
    /// enough for a quick Gaussian beam trace.
    pub fn apply_optic(
        &mut self,
        optic: &ThinLens,
        z_lens: Length,
        ignore_wavefront: bool,
    ) -> Result<(), FresnelError> {
        if self.wavefront.oversample != optic.oversample() {
            return Err(FresnelError::OversampleMismatch {
                wavefront: self.wavefront.oversample,
                optic: optic.oversample(),
            });
        }
        debug!("Pre-Lens Parameters: {}", self.param_str());

        let zl = z_lens.as_meters();
        let fl = optic.focal_length().as_meters();
        let new_waist = self.beam.spot_radius(zl);
        debug!("Beam radius at {} = {:.2e} m", optic.name(), new_waist);

        // is the last surface outside the rayleigh distance?
        let mut spherical = self.spherical;
        let r_input_beam =
            if (self.beam.z_w0 - self.z).abs() > self.rayl_factor * self.beam.rayleigh_range() {
                debug!("spherical input beam");
                spherical = true;
                self.z - self.beam.z_w0
            } else {
                f64::INFINITY
            };

        let r_c = self.beam.radius_of_curvature(zl);
        let r_curve = if self.wavefront.planetype.is_pupil_or_image() {
            // at a focus or pupil the optic is the only curvature of the beam
            debug!("input flat wavefront and {} has a curvature of {:.2e} m", optic.name(), -fl);
            -fl
        } else {
            let r = 1.0 / (1.0 / r_c - 1.0 / fl);
            debug!("input curved wavefront and {} has a curvature of {:.2e} m", optic.name(), r);
            r
        };

        let mut beam = self.beam;
        if r_c == fl {
            debug!("{} has a flat output wavefront", optic.name());
            beam.z_w0 = zl;
            beam.w_0 = new_waist;
        } else {
            let (z_w0, w_0) = beam.through_lens(zl, r_curve, new_waist);
            beam.z_w0 = z_w0;
            beam.w_0 = w_0;
        }
        debug!(
            "Post Optic Parameters: w_0 = {:.3e} m, z_w0 = {:.3e} m",
            beam.w_0, beam.z_w0
        );

        if !self.force_fresnel
            && self.wavefront.planetype.is_pupil_or_image()
            && optic.planetype().is_pupil_or_image()
        {
            debug!("Simple pupil / image propagation, Fresnel unnecessary. Reverting to Fraunhofer.");
            self.beam = beam;
            self.spherical = spherical;
            return self.wavefront.propagate_to(optic.planetype());
        }

        if ignore_wavefront {
            self.beam = beam;
            self.spherical = spherical;
            self.record_waist(optic);
            return Ok(());
        }

        let lens_in_range = (beam.z_w0 - zl).abs() < beam.rayleigh_range();
        let regime = LensRegime::classify(spherical, lens_in_range);
        debug!("Lens regime: {}", regime.name());
        let z_eff =
            regime.effective_focal_length(fl, self.z - beam.z_w0, zl - beam.z_w0, r_input_beam)?;

        self.beam = beam;
        self.spherical = regime.output_spherical(spherical);
        let lens_phase = self.quad_phase(Length::meters(-z_eff));
        self.multiply(&lens_phase);
        self.record_waist(optic);
        debug!("------ Optic: {} applied ------", optic.name());
        Ok(())
    }

    fn record_waist(&mut self, optic: &ThinLens) {
        self.waists_z.push(self.beam.z_w0);
        self.waists_w0.push(self.beam.w_0);
        self.wavefront.planetype = optic.planetype();
        self.wavefront.history.push(Event::OpticApplied {
            name: optic.name().to_string(),
            z_w0: self.beam.z_w0,
            w_0: self.beam.w_0,
        });
    }

    /// Direct single-FFT Fresnel propagation over `z` (Andersen & Enmark
    /// 2011, eq. 6.67-6.70). Best suited to far-field distances; the Gaussian
    /// beam parameters are left untouched.
    pub fn propagate_direct(&mut self, z: Length) -> Result<(), FresnelError> {
        let z_m = z.as_meters();
        if !(z_m > 0.0) {
            return Err(FresnelError::NonPositiveDistance(z_m));
        }
        self.to_centred_order();

        let shape = self.wavefront.shape();
        let wavelength = self.wavefront.wavelength;
        let dx = self.wavefront.pixelscale;
        let k = wavenumber(wavelength);
        let dx_out = self.fourier_pixelscale(z_m);
        debug!(
            "Propagation Parameters: k = {:.2e}, S = {:.2e}, z = {:.2e}",
            k,
            shape.0 as f64 * dx,
            z_m
        );

        let (y, x) = centred_coordinates(shape, dx);
        let mut stage = Zip::from(&self.wavefront.field)
            .and(&y)
            .and(&x)
            .map_collect(|&f, &y, &x| f * Complex64::from_polar(1.0, k * (x * x + y * y) / (2.0 * z_m)));
        stage = ifftshift(&stage);
        self.wavefront.fft.forward_2d(&mut stage);
        let mut result = fftshift(&stage);

        let prefactor =
            Complex64::from_polar(dx * dx, k * z_m) / (Complex64::i() * wavelength * z_m);
        let (y2, x2) = centred_coordinates(shape, dx_out);
        Zip::from(&mut result)
            .and(&y2)
            .and(&x2)
            .for_each(|r, &y, &x| {
                *r *= prefactor * Complex64::from_polar(1.0, k * (x * x + y * y) / (2.0 * z_m))
            });

        self.wavefront.field = result;
        self.wavefront.pixelscale = dx_out;
        self.wavefront.planetype = PlaneType::Intermediate;
        self.z += z_m;
        self.wavefront.history.push(Event::Direct { dz: z_m });
        Ok(())
    }
}
