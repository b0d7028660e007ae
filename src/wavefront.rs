//! Sampled complex field with plane metadata.
//!
//! [`Wavefront`] is the Fraunhofer-domain container the Fresnel propagator
//! builds on: the complex amplitude array, its physical sampling, the plane
//! type and an operation log. It can also carry out plain pupil <-> image
//! propagation, which the Fresnel layer falls back to when near-field
//! treatment is unnecessary.

use std::f64::consts::PI;
use std::sync::Arc;

use log::debug;
use ndarray::{s, Array2, Zip};
use num_complex::Complex64;

use crate::config;
use crate::error::FresnelError;
use crate::fft::{fftshift, ifftshift, FftBackend};
use crate::history::{Event, History};
use crate::plane::PlaneType;
use crate::units::Length;

/// How the initial plane is sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampling {
    /// Pupil plane of the given diameter spread over `npix` pixels.
    Diameter(Length),
    /// Image plane with the given arcseconds per pixel.
    AngularScale(f64),
}

#[derive(Debug, Clone)]
pub struct Wavefront {
    pub wavelength: f64,             // meters
    pub field: Array2<Complex64>,    // complex amplitude
    pub pixelscale: f64,             // m/pix in pupil-like planes, rad/pix in image planes
    pub planetype: PlaneType,        // kind of plane currently sampled
    pub oversample: usize,           // zero-padding factor
    pub ispadded: bool,              // whether the padding has been applied
    pub history: History,            // log of applied operations
    pub(crate) fft: Arc<dyn FftBackend>,
}

impl Wavefront {
    /// Creates a uniformly illuminated `npix` x `npix` wavefront.
    pub fn new(
        wavelength: Length,
        npix: usize,
        sampling: Sampling,
        oversample: usize,
        fft: Arc<dyn FftBackend>,
    ) -> Result<Self, FresnelError> {
        let wavelength = wavelength.as_meters();
        if !(wavelength > 0.0) {
            return Err(FresnelError::InvalidParameter(format!(
                "wavelength must be positive, got {:.3e} m",
                wavelength
            )));
        }
        if npix == 0 {
            return Err(FresnelError::InvalidParameter("npix must be at least 1".into()));
        }
        if oversample == 0 {
            return Err(FresnelError::InvalidParameter(
                "oversample must be at least 1".into(),
            ));
        }

        let (pixelscale, planetype) = match sampling {
            Sampling::Diameter(diam) => {
                let diam = diam.as_meters();
                if !(diam > 0.0) {
                    return Err(FresnelError::InvalidParameter(format!(
                        "diameter must be positive, got {:.3e} m",
                        diam
                    )));
                }
                (diam / npix as f64, PlaneType::Pupil)
            }
            Sampling::AngularScale(arcsec) => {
                if !(arcsec > 0.0) {
                    return Err(FresnelError::InvalidParameter(format!(
                        "pixel scale must be positive, got {} arcsec",
                        arcsec
                    )));
                }
                (arcsec / config::ARCSEC_PER_RADIAN, PlaneType::Image)
            }
        };

        Ok(Self {
            wavelength,
            field: Array2::from_elem((npix, npix), Complex64::new(1.0, 0.0)),
            pixelscale,
            planetype,
            oversample,
            ispadded: false,
            history: History::default(),
            fft,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.field.dim()
    }

    /// Name of the FFT backend in use.
    pub fn fft_backend(&self) -> &'static str {
        self.fft.name()
    }

    /// Zero-pads the field centrally to `oversample` times its size.
    pub fn pad_to_oversample(&mut self) {
        if self.ispadded {
            return;
        }
        let (rows, cols) = self.field.dim();
        let (new_rows, new_cols) = (rows * self.oversample, cols * self.oversample);
        let (y0, x0) = ((new_rows - rows) / 2, (new_cols - cols) / 2);

        let mut padded = Array2::<Complex64>::zeros((new_rows, new_cols));
        padded
            .slice_mut(s![y0..y0 + rows, x0..x0 + cols])
            .assign(&self.field);
        self.field = padded;
        self.ispadded = true;

        debug!("Padded WF array for oversampling by {}x", self.oversample);
        self.history.push(Event::Padded {
            oversample: self.oversample,
        });
    }

    /// Physical Y and X coordinates of every pixel, origin at index `N/2`.
    pub fn coordinates(&self) -> (Array2<f64>, Array2<f64>) {
        centred_coordinates(self.field.dim(), self.pixelscale)
    }

    /// Multiplies the field by `phasor` sample by sample.
    pub fn multiply_phasor(&mut self, phasor: &Array2<Complex64>, name: &str) {
        Zip::from(&mut self.field)
            .and(phasor)
            .for_each(|f, &p| *f *= p);
        self.history.push(Event::Multiplied {
            name: name.to_string(),
        });
    }

    pub fn intensity(&self) -> Array2<f64> {
        self.field.mapv(|v| v.norm_sqr())
    }

    pub fn total_intensity(&self) -> f64 {
        self.field.iter().map(|v| v.norm_sqr()).sum()
    }

    /// Fraunhofer propagation to a plane of type `target`.
    ///
    /// Pupil to image (or detector) is a centred forward transform, the
    /// reverse an inverse transform; both conserve total intensity.
    pub fn propagate_to(&mut self, target: PlaneType) -> Result<(), FresnelError> {
        let from = self.planetype;
        if from == target || target == PlaneType::Rotation {
            debug!("No Fraunhofer propagation needed from {} to {}", from, target);
            return Ok(());
        }

        let forward = match (from.is_angular(), target) {
            (false, PlaneType::Image | PlaneType::Detector) if from == PlaneType::Pupil => true,
            (true, PlaneType::Pupil) => false,
            (true, PlaneType::Image | PlaneType::Detector) => {
                self.planetype = target;
                return Ok(());
            }
            _ => return Err(FresnelError::UnsupportedPropagation { from, to: target }),
        };

        let (rows, cols) = self.field.dim();
        let norm = ((rows * cols) as f64).sqrt();
        let mut field = ifftshift(&self.field);
        if forward {
            self.fft.forward_2d(&mut field);
        } else {
            self.fft.inverse_2d(&mut field);
        }
        self.field = fftshift(&field).mapv(|v| v / norm);
        // the same Fourier relation maps meters to radians and back
        self.pixelscale = self.wavelength / (rows as f64 * self.pixelscale);
        self.planetype = target;

        debug!(
            "Fraunhofer propagation {} -> {}, pixelscale {:.3e}",
            from, target, self.pixelscale
        );
        self.history.push(Event::Fraunhofer { from, to: target });
        Ok(())
    }
}

/// Coordinates for an array of `shape` with the origin at index `N/2`.
pub fn centred_coordinates(shape: (usize, usize), pixelscale: f64) -> (Array2<f64>, Array2<f64>) {
    let (rows, cols) = shape;
    let (cy, cx) = ((rows / 2) as f64, (cols / 2) as f64);
    let y = Array2::from_shape_fn(shape, |(i, _)| (i as f64 - cy) * pixelscale);
    let x = Array2::from_shape_fn(shape, |(_, j)| (j as f64 - cx) * pixelscale);
    (y, x)
}

/// Coordinates of an array stored in FFT order: the centred grid, ifftshifted.
pub fn fft_order_coordinates(shape: (usize, usize), pixelscale: f64) -> (Array2<f64>, Array2<f64>) {
    let (y, x) = centred_coordinates(shape, pixelscale);
    (ifftshift(&y), ifftshift(&x))
}

/// Squared spatial frequency `fx^2 + fy^2` of each sample in FFT order.
pub fn fft_frequencies_sq(shape: (usize, usize), pixelscale: f64) -> Array2<f64> {
    let (rows, cols) = shape;
    let freq = |k: usize, n: usize| {
        let k = if k < (n + 1) / 2 { k as f64 } else { k as f64 - n as f64 };
        k / (n as f64 * pixelscale)
    };
    Array2::from_shape_fn(shape, |(i, j)| {
        let fy = freq(i, rows);
        let fx = freq(j, cols);
        fx * fx + fy * fy
    })
}

/// Wavenumber for `wavelength` in meters.
pub fn wavenumber(wavelength: f64) -> f64 {
    2.0 * PI / wavelength
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::ReferenceFft;
    use approx::assert_relative_eq;

    fn pupil(npix: usize, oversample: usize) -> Wavefront {
        Wavefront::new(
            Length::micrometers(1.0),
            npix,
            Sampling::Diameter(Length::meters(0.02)),
            oversample,
            Arc::new(ReferenceFft::default()),
        )
        .unwrap()
    }

    #[test]
    fn pupil_sampling() {
        let wf = pupil(16, 2);
        assert_eq!(wf.planetype, PlaneType::Pupil);
        assert_relative_eq!(wf.pixelscale, 0.02 / 16.0);
        assert_eq!(wf.shape(), (16, 16));
    }

    #[test]
    fn image_sampling() {
        let wf = Wavefront::new(
            Length::micrometers(1.0),
            8,
            Sampling::AngularScale(0.1),
            1,
            Arc::new(ReferenceFft::default()),
        )
        .unwrap();
        assert_eq!(wf.planetype, PlaneType::Image);
        assert_relative_eq!(wf.pixelscale, 0.1 / config::ARCSEC_PER_RADIAN);
    }

    #[test]
    fn rejects_bad_parameters() {
        let fft: Arc<dyn FftBackend> = Arc::new(ReferenceFft::default());
        let diam = Sampling::Diameter(Length::meters(1.0));
        assert!(Wavefront::new(Length::zero(), 8, diam, 1, fft.clone()).is_err());
        assert!(Wavefront::new(Length::meters(1e-6), 0, diam, 1, fft.clone()).is_err());
        assert!(Wavefront::new(Length::meters(1e-6), 8, diam, 0, fft.clone()).is_err());
        let zero = Sampling::Diameter(Length::zero());
        assert!(Wavefront::new(Length::meters(1e-6), 8, zero, 1, fft).is_err());
    }

    #[test]
    fn padding_centres_field() {
        let mut wf = pupil(4, 2);
        wf.pad_to_oversample();
        assert_eq!(wf.shape(), (8, 8));
        assert!(wf.ispadded);
        assert_eq!(wf.field[[0, 0]], Complex64::default());
        assert_eq!(wf.field[[2, 2]], Complex64::new(1.0, 0.0));
        assert_eq!(wf.field[[5, 5]], Complex64::new(1.0, 0.0));
        assert_eq!(wf.field[[6, 6]], Complex64::default());
        assert_relative_eq!(wf.total_intensity(), 16.0);

        // second call is a no-op
        wf.pad_to_oversample();
        assert_eq!(wf.shape(), (8, 8));
        assert_eq!(wf.history.len(), 1);
    }

    #[test]
    fn coordinates_centred_on_half_index() {
        let (y, x) = centred_coordinates((4, 4), 0.5);
        assert_eq!(x[[0, 2]], 0.0);
        assert_eq!(y[[2, 0]], 0.0);
        assert_eq!(x[[0, 0]], -1.0);
        assert_eq!(y[[3, 0]], 0.5);

        let (fy, fx) = fft_order_coordinates((4, 4), 0.5);
        assert_eq!(fx[[0, 0]], 0.0);
        assert_eq!(fy[[0, 0]], 0.0);
        assert_eq!(fx[[0, 1]], 0.5);
        assert_eq!(fx[[0, 2]], -1.0);
    }

    #[test]
    fn frequencies_in_fft_order() {
        let f = fft_frequencies_sq((4, 4), 0.25);
        assert_eq!(f[[0, 0]], 0.0);
        assert_relative_eq!(f[[0, 1]], 1.0);
        assert_relative_eq!(f[[0, 2]], 4.0);
        assert_relative_eq!(f[[0, 3]], 1.0);
        assert_relative_eq!(f[[1, 3]], 2.0);
    }

    #[test]
    fn fraunhofer_round_trip_conserves_energy() {
        let mut wf = pupil(8, 2);
        wf.pad_to_oversample();
        let original = wf.field.clone();
        let power = wf.total_intensity();
        let scale = wf.pixelscale;

        wf.propagate_to(PlaneType::Image).unwrap();
        assert_eq!(wf.planetype, PlaneType::Image);
        assert_relative_eq!(wf.total_intensity(), power, max_relative = 1e-10);
        assert_relative_eq!(wf.pixelscale, 1e-6 / (16.0 * scale), max_relative = 1e-12);
        // uniform square aperture peaks at the centre of the image
        let peak = wf.intensity()[[8, 8]];
        assert!(wf.intensity().iter().all(|&v| v <= peak + 1e-12));

        wf.propagate_to(PlaneType::Pupil).unwrap();
        assert_relative_eq!(wf.pixelscale, scale, max_relative = 1e-12);
        for (a, b) in wf.field.iter().zip(original.iter()) {
            assert!((a - b).norm() < 1e-10);
        }
    }

    #[test]
    fn fraunhofer_rejects_intermediate() {
        let mut wf = pupil(4, 1);
        wf.planetype = PlaneType::Intermediate;
        assert_eq!(
            wf.propagate_to(PlaneType::Image),
            Err(FresnelError::UnsupportedPropagation {
                from: PlaneType::Intermediate,
                to: PlaneType::Image
            })
        );
    }
}
