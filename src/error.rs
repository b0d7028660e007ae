use thiserror::Error;

use crate::plane::PlaneType;

/// Fatal errors raised by wavefront construction and optic interaction.
///
/// Degenerate but recoverable inputs (zero propagation distances, missing
/// units, low oversampling) are logged instead and never show up here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FresnelError {
    #[error(
        "input wavefront needs to be a pupil plane in units of m/pix; specify a diameter not a pixel scale"
    )]
    ImagePlaneInput,

    #[error("wavefront oversampling ({wavefront}x) differs from optic oversampling ({optic}x)")]
    OversampleMismatch { wavefront: usize, optic: usize },

    #[error("Fresnel propagation requires a square grid, got {rows}x{cols}")]
    NonSquareGrid { rows: usize, cols: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no Fraunhofer propagation from a {from} plane to a {to} plane")]
    UnsupportedPropagation { from: PlaneType, to: PlaneType },

    #[error("degenerate wavefront curvature in the {regime} regime")]
    DegenerateCurvature { regime: &'static str },

    #[error("direct propagation distance must be positive, got {0:.3e} m")]
    NonPositiveDistance(f64),
}
