//! Hooks for inspecting intermediate planes during propagation.
//!
//! Propagation calls back into a [`PlaneObserver`] at the start surface, at
//! any intermediate waist and at the final surface when the caller asks to
//! see intermediate planes. Rendering is up to the observer;
//! [`SnapshotRecorder`] just keeps copies for later output.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::fresnel::FresnelWavefront;

/// What an observer should show of a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Intensity,
    Phase,
    #[default]
    Both,
}

pub trait PlaneObserver {
    fn display(&mut self, wavefront: &FresnelWavefront, what: DisplayMode, title: &str);
}

/// One captured plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub title: String,
    pub z: f64,
    pub pixelscale: f64,
    pub intensity: Option<Array2<f64>>,
    pub phase: Option<Array2<f64>>,
}

/// Observer that stores every plane it is shown.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRecorder {
    pub snapshots: Vec<Snapshot>,
}

impl SnapshotRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.snapshots.iter().map(|s| s.title.as_str()).collect()
    }
}

impl PlaneObserver for SnapshotRecorder {
    fn display(&mut self, wavefront: &FresnelWavefront, what: DisplayMode, title: &str) {
        let field = wavefront.centred_field();
        let intensity = match what {
            DisplayMode::Intensity | DisplayMode::Both => Some(field.mapv(|v| v.norm_sqr())),
            DisplayMode::Phase => None,
        };
        let phase = match what {
            DisplayMode::Phase | DisplayMode::Both => Some(field.mapv(|v| v.arg())),
            DisplayMode::Intensity => None,
        };
        self.snapshots.push(Snapshot {
            title: title.to_string(),
            z: wavefront.z().as_meters(),
            pixelscale: wavefront.pixelscale(),
            intensity,
            phase,
        });
    }
}
