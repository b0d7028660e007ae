/// Propagation distances below this many meters (one Angstrom) are skipped.
pub const NEGLIGIBLE_DISTANCE: f64 = 1e-10;
/// Default multiple of the Rayleigh range beyond which an input beam is spherical.
pub const DEFAULT_RAYL_FACTOR: f64 = 2.0;
/// Default zero-padding factor of the wavefront array.
pub const DEFAULT_OVERSAMPLE: usize = 2;
/// Oversampling below this factor gives unreliable results.
pub const RECOMMENDED_OVERSAMPLE: usize = 2;
/// Default number of pixels across the illuminated beam diameter.
pub const DEFAULT_NPIX: usize = 1024;
/// Default wavelength in meters.
pub const DEFAULT_WAVELENGTH: f64 = 2e-6;
/// Arcseconds per radian.
pub const ARCSEC_PER_RADIAN: f64 = 206_264.806_247_096_36;
