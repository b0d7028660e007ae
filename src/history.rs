//! Append-only log of the operations applied to a wavefront.
//!
//! The log is kept apart from the numerical state: disabling it changes
//! nothing but what gets recorded.

use std::fmt;

use serde::Serialize;

use crate::plane::PlaneType;

/// A single recorded operation. Distances are in meters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Padded { oversample: usize },
    PlaneToPlane { dz: f64 },
    WaistToSpherical { dz: f64 },
    SphericalToWaist { dz: f64 },
    Direct { dz: f64 },
    Fraunhofer { from: PlaneType, to: PlaneType },
    Multiplied { name: String },
    OpticApplied { name: String, z_w0: f64, w_0: f64 },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Padded { oversample } => {
                write!(f, "    Padded WF array for oversampling by {}x", oversample)
            }
            Event::PlaneToPlane { dz } => write!(f, "Propagated Plane-to-Plane, dz = {:.4e} m", dz),
            Event::WaistToSpherical { dz } => {
                write!(f, "Propagated Waist to Spherical, dz = {:.4e} m", dz)
            }
            Event::SphericalToWaist { dz } => {
                write!(f, "Propagated Spherical to Waist, dz = {:.4e} m", dz)
            }
            Event::Direct { dz } => write!(f, "Direct propagation to z = {:.4e} m", dz),
            Event::Fraunhofer { from, to } => {
                write!(f, "Fraunhofer propagation from {} to {} plane", from, to)
            }
            Event::Multiplied { name } => write!(f, "Multiplied WF by phasor for {}", name),
            Event::OpticApplied { name, z_w0, w_0 } => write!(
                f,
                "Applied {}: new waist w_0 = {:.4e} m at z_w0 = {:.4e} m",
                name, w_0, z_w0
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct History {
    enabled: bool,
    events: Vec<Event>,
}

impl History {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    /// Records `event` if the log is enabled.
    pub fn push(&mut self, event: Event) {
        if self.enabled {
            self.events.push(event);
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Human-readable lines, one per event.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_history_records_nothing() {
        let mut history = History::new(false);
        history.push(Event::PlaneToPlane { dz: 1.0 });
        assert!(history.is_empty());

        history.set_enabled(true);
        history.push(Event::PlaneToPlane { dz: 1.0 });
        assert_eq!(history.len(), 1);
        assert_eq!(history.last(), Some(&Event::PlaneToPlane { dz: 1.0 }));
    }

    #[test]
    fn events_render_readably() {
        let line = Event::WaistToSpherical { dz: 0.5 }.to_string();
        assert!(line.starts_with("Propagated Waist to Spherical"));
        assert!(line.contains("5.0000e-1"));
    }
}
