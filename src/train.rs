//! Sequential optical train runner.
//!
//! An [`OpticalTrain`] builds the entrance wavefront from [`Settings`] and
//! applies each configured [`TrainStep`] in order, reporting progress with an
//! `indicatif` bar.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::display::SnapshotRecorder;
use crate::fresnel::FresnelWavefront;
use crate::optic::{CircularAperture, ThinLens};
use crate::settings::{Settings, TrainStep};
use crate::units::Length;

/// Outcome of a train run.
#[derive(Debug)]
pub struct TrainRun {
    pub wavefront: FresnelWavefront,
    /// Planes shown during propagation, when snapshots were requested.
    pub snapshots: Option<SnapshotRecorder>,
    pub elapsed: Duration,
}

/// Optical train described by runtime settings.
///
/// **Context**: A propagation problem is a source followed by apertures,
/// lenses and free-space gaps. Each step depends on the state the previous
/// one left behind, so the train is strictly sequential.
///
/// **How it Works**: Creates a [`FresnelWavefront`] of the configured beam
/// radius, then walks the steps, keeping the axial position of the current
/// plane so lenses are placed where the beam has reached. In Gaussian trace
/// mode (`ignore_wavefront`) only lenses act and distances just advance the
/// position.
#[derive(Debug, Clone)]
pub struct OpticalTrain {
    settings: Settings,
}

impl OpticalTrain {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn steps(&self) -> &[TrainStep] {
        &self.settings.train
    }

    /// Entrance wavefront, before any step.
    pub fn source(&self) -> Result<FresnelWavefront> {
        FresnelWavefront::new(self.settings.beam_radius, &self.settings.fresnel_config())
            .context("failed to create the entrance wavefront")
    }

    /// Runs every step on a fresh entrance wavefront.
    pub fn run(&self) -> Result<TrainRun> {
        let start = Instant::now();
        info!("{}", self.settings);

        let mut wavefront = self.source()?;
        let mut recorder = self.settings.snapshots.then(SnapshotRecorder::new);
        let mut position = Length::zero();

        let pb = ProgressBar::new(self.steps().len() as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>3}/{len:3} {msg}",
            )?
            .progress_chars("█▇▆▅▄▃▂▁"),
        );

        for (i, step) in self.steps().iter().enumerate() {
            pb.set_message(step.to_string());
            self.apply_step(&mut wavefront, step, &mut position, recorder.as_mut())
                .with_context(|| format!("step {} ({}) failed", i + 1, step))?;
            pb.inc(1);
        }
        pb.finish_with_message("done");

        let elapsed = start.elapsed();
        info!("Time taken: {:.2?}", elapsed);
        info!("{}", wavefront.param_str());

        Ok(TrainRun {
            wavefront,
            snapshots: recorder,
            elapsed,
        })
    }

    fn apply_step(
        &self,
        wavefront: &mut FresnelWavefront,
        step: &TrainStep,
        position: &mut Length,
        recorder: Option<&mut SnapshotRecorder>,
    ) -> Result<()> {
        let trace_only = self.settings.ignore_wavefront;
        debug!("Applying {} at z = {:.4}", step, position);

        match step {
            TrainStep::Aperture { radius } => {
                if !trace_only {
                    let aperture =
                        CircularAperture::new(*radius).with_oversample(wavefront.oversample());
                    wavefront.multiply(&aperture);
                }
            }
            TrainStep::Lens {
                focal_length,
                name,
                planetype,
            } => {
                let mut lens = ThinLens::new(*focal_length, self.settings.wavelength)
                    .with_oversample(wavefront.oversample());
                if let Some(name) = name {
                    lens = lens.with_name(name.as_str());
                }
                if let Some(planetype) = planetype {
                    lens = lens.with_planetype(*planetype);
                }
                wavefront.apply_optic(&lens, *position, trace_only)?;
            }
            TrainStep::Propagate { distance } => {
                if !trace_only {
                    match recorder {
                        Some(recorder) => wavefront.propagate_fresnel_observed(*distance, recorder),
                        None => wavefront.propagate_fresnel(*distance),
                    }
                }
                *position = *position + *distance;
            }
            TrainStep::Direct { distance } => {
                if !trace_only {
                    wavefront.propagate_direct(*distance)?;
                }
                *position = *position + *distance;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settings(extra: &str) -> Settings {
        let doc = format!(
            r#"
            wavelength = "1 um"
            beam_radius = "1 mm"
            npix = 16
            {}

            [fft]
            optimized = false
            threads = 1

            [[train]]
            type = "lens"
            focal_length = "1 m"

            [[train]]
            type = "propagate"
            distance = "1 m"
            "#,
            extra
        );
        Settings::from_toml_str(&doc).unwrap()
    }

    #[test]
    fn trace_mode_matches_full_run_beam_parameters() {
        let full = OpticalTrain::new(settings("")).run().unwrap();
        let trace = OpticalTrain::new(settings("ignore_wavefront = true"))
            .run()
            .unwrap();

        assert_eq!(full.wavefront.waists_z().len(), 2);
        assert_relative_eq!(
            full.wavefront.z_w0().as_meters(),
            trace.wavefront.z_w0().as_meters()
        );
        assert_relative_eq!(
            full.wavefront.w_0().as_meters(),
            trace.wavefront.w_0().as_meters()
        );
        // trace mode leaves the field and position alone
        assert_relative_eq!(trace.wavefront.z().as_meters(), 0.0);
        assert_relative_eq!(full.wavefront.z().as_meters(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn snapshots_recorded_on_request() {
        let run = OpticalTrain::new(settings("snapshots = true")).run().unwrap();
        let recorder = run.snapshots.unwrap();
        assert_eq!(recorder.titles().first(), Some(&"Starting Surface"));
        assert_eq!(recorder.titles().last(), Some(&"Final Surface"));

        let run = OpticalTrain::new(settings("")).run().unwrap();
        assert!(run.snapshots.is_none());
    }
}
