use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of optical plane a wavefront is sampled in.
///
/// Pupil planes are sampled in length per pixel, image and detector planes in
/// angle per pixel. Fresnel-propagated planes are neither and are marked
/// `Intermediate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaneType {
    #[default]
    Pupil,
    Image,
    Detector,
    Rotation,
    Intermediate,
}

impl PlaneType {
    /// Pupil or image: the planes where a flat input wavefront is assumed.
    pub fn is_pupil_or_image(self) -> bool {
        matches!(self, PlaneType::Pupil | PlaneType::Image)
    }

    /// Planes sampled in angular units.
    pub fn is_angular(self) -> bool {
        matches!(self, PlaneType::Image | PlaneType::Detector)
    }
}

impl fmt::Display for PlaneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaneType::Pupil => "pupil",
            PlaneType::Image => "image",
            PlaneType::Detector => "detector",
            PlaneType::Rotation => "rotation",
            PlaneType::Intermediate => "intermediate",
        };
        write!(f, "{}", name)
    }
}
