//! Runtime configuration for the propagator and its optical train.
//!
//! Settings are layered, later sources overriding earlier ones:
//! - `config/default.toml` (or `config/local.toml` when present)
//! - environment variables prefixed `FRESNEL_`, nested keys joined by `__`
//!   (e.g. `FRESNEL_FFT__THREADS=8`)
//! - command-line flags parsed by [`CliArgs`]
//!
//! Lengths accept either a number of meters or a string with a unit such as
//! `"25 mm"`.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::info;
use serde::Deserialize;

use crate::config::{DEFAULT_OVERSAMPLE, DEFAULT_RAYL_FACTOR};
use crate::fft::FftConfig;
use crate::fresnel::FresnelConfig;
use crate::plane::PlaneType;
use crate::units::{Length, LengthUnit};

/// One element of the optical train, applied in order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TrainStep {
    /// Circular pupil mask at the current plane.
    Aperture { radius: Length },
    /// Thin lens at the current plane.
    Lens {
        focal_length: Length,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        planetype: Option<PlaneType>,
    },
    /// Fresnel propagation by `distance`.
    Propagate { distance: Length },
    /// Single-FFT propagation by `distance`.
    Direct { distance: Length },
}

impl fmt::Display for TrainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainStep::Aperture { radius } => write!(f, "aperture r = {:.3}", radius),
            TrainStep::Lens {
                focal_length, name, ..
            } => write!(
                f,
                "{} f = {:.3}",
                name.as_deref().unwrap_or("lens"),
                focal_length
            ),
            TrainStep::Propagate { distance } => write!(f, "propagate {:.3}", distance),
            TrainStep::Direct { distance } => write!(f, "direct {:.3}", distance),
        }
    }
}

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub wavelength: Length,
    pub beam_radius: Length,
    pub npix: usize,
    #[serde(default = "default_oversample")]
    pub oversample: usize,
    #[serde(default = "default_rayl_factor")]
    pub rayl_factor: f64,
    #[serde(default = "default_true")]
    pub force_fresnel: bool,
    #[serde(default)]
    pub units: LengthUnit,
    #[serde(default = "default_true")]
    pub record_history: bool,
    /// Trace Gaussian beam parameters only, leaving the field untouched.
    #[serde(default)]
    pub ignore_wavefront: bool,
    /// Keep intensity and phase of every start, waist and end plane.
    #[serde(default)]
    pub snapshots: bool,
    #[serde(default)]
    pub fft: FftConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub train: Vec<TrainStep>,
}

fn default_oversample() -> usize {
    DEFAULT_OVERSAMPLE
}

fn default_rayl_factor() -> f64 {
    DEFAULT_RAYL_FACTOR
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Settings {
    /// Parses settings from a TOML document and validates them.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(s).context("invalid settings document")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.wavelength.as_meters() > 0.0,
            "wavelength must be greater than 0, got {}",
            self.wavelength
        );
        ensure!(
            self.beam_radius.as_meters() > 0.0,
            "beam radius must be greater than 0, got {}",
            self.beam_radius
        );
        ensure!(
            self.npix >= 2 && self.npix % 2 == 0,
            "npix must be even and at least 2, got {}",
            self.npix
        );
        ensure!(self.oversample >= 1, "oversample must be at least 1");
        ensure!(
            self.rayl_factor > 0.0,
            "rayl_factor must be greater than 0, got {}",
            self.rayl_factor
        );
        ensure!(self.fft.threads >= 1, "fft.threads must be at least 1");
        for step in &self.train {
            match step {
                TrainStep::Aperture { radius } => {
                    ensure!(radius.as_meters() > 0.0, "aperture radius must be positive")
                }
                TrainStep::Lens { focal_length, .. } => ensure!(
                    focal_length.as_meters() != 0.0 && focal_length.is_finite(),
                    "lens focal length must be finite and non-zero"
                ),
                TrainStep::Direct { distance } => {
                    ensure!(distance.as_meters() > 0.0, "direct distance must be positive")
                }
                TrainStep::Propagate { .. } => {}
            }
        }
        Ok(())
    }

    /// Propagator parameters described by these settings.
    pub fn fresnel_config(&self) -> FresnelConfig {
        FresnelConfig {
            wavelength: self.wavelength,
            npix: self.npix,
            oversample: self.oversample,
            units: self.units,
            force_fresnel: self.force_fresnel,
            rayl_factor: self.rayl_factor,
            fft: self.fft.clone(),
            record_history: self.record_history,
        }
    }

    /// Overrides fields with any values given on the command line.
    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(wavelength) = args.wavelength {
            self.wavelength = wavelength;
        }
        if let Some(radius) = args.beam_radius {
            self.beam_radius = radius;
        }
        if let Some(npix) = args.npix {
            self.npix = npix;
        }
        if let Some(oversample) = args.oversample {
            self.oversample = oversample;
        }
        if let Some(rayl_factor) = args.rayl_factor {
            self.rayl_factor = rayl_factor;
        }
        if let Some(units) = args.units {
            self.units = units;
        }
        if let Some(threads) = args.threads {
            self.fft.optimized = true;
            self.fft.threads = threads;
        }
        if args.reference_fft {
            self.fft.optimized = false;
        }
        if let Some(dir) = &args.output_dir {
            self.output_dir = dir.clone();
        }
        if args.allow_fraunhofer {
            self.force_fresnel = false;
        }
        if args.ignore_wavefront {
            self.ignore_wavefront = true;
        }
        if args.snapshots {
            self.snapshots = true;
        }
        if args.no_history {
            self.record_history = false;
        }
    }
}

/// Loads settings from the default configuration file only, with no
/// environment or command-line overrides.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let settings = build(&root.join("config/default.toml"), false)?;
    settings.validate()?;
    Ok(settings)
}

/// Loads settings, overriding them with the process command line.
pub fn load_config() -> Result<Settings> {
    load_config_with(&CliArgs::parse())
}

/// Loads settings, overriding them with already-parsed arguments.
pub fn load_config_with(args: &CliArgs) -> Result<Settings> {
    let config_file = match &args.config {
        Some(path) => path.clone(),
        None => {
            let root = retrieve_project_root()?;
            let local_config = root.join("config/local.toml");
            if local_config.exists() {
                local_config
            } else {
                root.join("config/default.toml")
            }
        }
    };
    info!("Using configuration: {:?}", config_file);

    let mut settings = build(&config_file, true)?;
    settings.apply_args(args);
    settings.validate()?;
    Ok(settings)
}

fn build(path: &Path, with_env: bool) -> Result<Settings> {
    let mut builder = Config::builder().add_source(File::from(path).required(true));
    if with_env {
        builder = builder.add_source(
            Environment::with_prefix("fresnel")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
    }
    let config = builder
        .build()
        .with_context(|| format!("error loading configuration from {:?}", path))?;
    config
        .try_deserialize()
        .with_context(|| format!("error deserializing configuration from {:?}", path))
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the FRESNEL_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("FRESNEL_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("failed to get current executable path")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("could not find a project directory containing config/"))
}

#[derive(Parser, Debug, Default)]
#[command(version, about = "Fresnel - near-field diffraction propagation of Gaussian beams")]
pub struct CliArgs {
    /// Wavelength, e.g. "1.064 um". A bare number is taken as meters.
    #[arg(short, long)]
    pub wavelength: Option<Length>,

    /// Radius of the illuminated beam at the entrance pupil.
    #[arg(short, long)]
    pub beam_radius: Option<Length>,

    /// Pixels across the beam diameter, before oversampling.
    #[arg(short, long)]
    pub npix: Option<usize>,

    /// Zero-padding factor. Values below 2 alias the propagated field.
    #[arg(long)]
    pub oversample: Option<usize>,

    /// Multiple of the Rayleigh range beyond which an optic sees a spherical input beam.
    #[arg(long)]
    pub rayl_factor: Option<f64>,

    /// Unit used to report beam parameters.
    #[arg(short, long)]
    pub units: Option<LengthUnit>,

    /// Use the multi-threaded FFT with this many threads.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Force the single-threaded reference FFT.
    #[arg(long, conflicts_with = "threads")]
    pub reference_fft: bool,

    /// Directory for output files.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Fall back to Fraunhofer propagation between pupil and image planes.
    #[arg(long)]
    pub allow_fraunhofer: bool,

    /// Trace the Gaussian beam parameters without propagating the field.
    #[arg(long)]
    pub ignore_wavefront: bool,

    /// Record the start, waist and end planes of every propagation.
    #[arg(long)]
    pub snapshots: bool,

    /// Do not record the operation history.
    #[arg(long)]
    pub no_history: bool,

    /// Configuration file to load instead of config/default.toml.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Wavelength: {:.4}
  - Beam Radius: {:.4}
  - Grid: {} px x{} oversampling
  - Rayleigh Factor: {}
  - Force Fresnel: {}
  - Train Steps: {}
  ",
            self.wavelength,
            self.beam_radius,
            self.npix,
            self.oversample,
            self.rayl_factor,
            self.force_fresnel,
            self.train.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        wavelength = "1 um"
        beam_radius = "1 mm"
        npix = 64
    "#;

    #[test]
    fn defaults_fill_optional_fields() {
        let settings = Settings::from_toml_str(MINIMAL).unwrap();
        assert_eq!(settings.wavelength, Length::micrometers(1.0));
        assert_eq!(settings.oversample, 2);
        assert_eq!(settings.rayl_factor, 2.0);
        assert!(settings.force_fresnel);
        assert!(settings.record_history);
        assert!(!settings.ignore_wavefront);
        assert_eq!(settings.units, LengthUnit::Meter);
        assert_eq!(settings.output_dir, PathBuf::from("output"));
        assert!(settings.train.is_empty());
    }

    #[test]
    fn parses_train_steps() {
        let doc = format!(
            "{}{}",
            MINIMAL,
            r#"
            [[train]]
            type = "aperture"
            radius = "1 mm"

            [[train]]
            type = "lens"
            focal_length = 0.5
            planetype = "pupil"

            [[train]]
            type = "propagate"
            distance = "500 mm"

            [[train]]
            type = "direct"
            distance = "2 m"
            "#
        );
        let settings = Settings::from_toml_str(&doc).unwrap();
        assert_eq!(
            settings.train,
            vec![
                TrainStep::Aperture {
                    radius: Length::millimeters(1.0)
                },
                TrainStep::Lens {
                    focal_length: Length::meters(0.5),
                    name: None,
                    planetype: Some(PlaneType::Pupil)
                },
                TrainStep::Propagate {
                    distance: Length::meters(0.5)
                },
                TrainStep::Direct {
                    distance: Length::meters(2.0)
                },
            ]
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let odd = MINIMAL.replace("npix = 64", "npix = 63");
        assert!(Settings::from_toml_str(&odd).is_err());

        let no_light = MINIMAL.replace("\"1 um\"", "0.0");
        assert!(Settings::from_toml_str(&no_light).is_err());

        let doc = format!("{}\nrayl_factor = -1.0\n", MINIMAL);
        assert!(Settings::from_toml_str(&doc).is_err());

        let doc = format!(
            "{}\n[[train]]\ntype = \"direct\"\ndistance = \"-1 m\"\n",
            MINIMAL
        );
        assert!(Settings::from_toml_str(&doc).is_err());
    }

    #[test]
    fn command_line_overrides() {
        let mut settings = Settings::from_toml_str(MINIMAL).unwrap();
        let args = CliArgs::try_parse_from([
            "fresnel-beam",
            "--wavelength",
            "633 nm",
            "-n",
            "128",
            "--threads",
            "3",
            "--allow-fraunhofer",
            "--units",
            "mm",
        ])
        .unwrap();
        settings.apply_args(&args);

        assert_eq!(settings.wavelength, Length::nanometers(633.0));
        assert_eq!(settings.npix, 128);
        assert!(settings.fft.optimized);
        assert_eq!(settings.fft.threads, 3);
        assert!(!settings.force_fresnel);
        assert_eq!(settings.units, LengthUnit::Millimeter);
        // untouched
        assert_eq!(settings.beam_radius, Length::millimeters(1.0));
    }

    #[test]
    fn fresnel_config_mirrors_settings() {
        let settings = Settings::from_toml_str(MINIMAL).unwrap();
        let config = settings.fresnel_config();
        assert_eq!(config.wavelength, settings.wavelength);
        assert_eq!(config.npix, 64);
        assert_eq!(config.oversample, 2);
        assert!(config.force_fresnel);
    }
}
