use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use clap::Parser;
use fresnel_beam::output;
use fresnel_beam::settings::{self, CliArgs, TrainStep};
use fresnel_beam::train::OpticalTrain;
use fresnel_beam::{Length, LengthUnit};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fresnel-beam-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn default_config_loads() {
    let settings = settings::load_default_config().unwrap();
    assert_eq!(settings.wavelength, Length::micrometers(1.0));
    assert_eq!(settings.beam_radius, Length::millimeters(1.0));
    assert_eq!(settings.npix, 128);
    assert_eq!(settings.units, LengthUnit::Meter);
    assert_eq!(settings.train.len(), 4);
    assert!(matches!(
        settings.train[1],
        TrainStep::Lens { ref name, .. } if name.as_deref() == Some("Focusing Lens")
    ));
}

#[test]
fn explicit_config_file_with_overrides() {
    let dir = scratch_dir("config");
    let path = dir.join("trace.toml");
    fs::write(
        &path,
        r#"
        wavelength = "500 nm"
        beam_radius = 0.002
        npix = 32

        [[train]]
        type = "lens"
        focal_length = "250 mm"
        "#,
    )
    .unwrap();

    let args = CliArgs::try_parse_from([
        "fresnel-beam",
        "--config",
        path.to_str().unwrap(),
        "--npix",
        "16",
        "--ignore-wavefront",
        "--reference-fft",
    ])
    .unwrap();
    let settings = settings::load_config_with(&args).unwrap();

    assert_eq!(settings.wavelength, Length::nanometers(500.0));
    assert_relative_eq!(settings.beam_radius.as_meters(), 0.002);
    assert_eq!(settings.npix, 16);
    assert!(settings.ignore_wavefront);
    assert!(!settings.fft.optimized);
}

#[test]
fn invalid_override_is_rejected() {
    let args = CliArgs::try_parse_from(["fresnel-beam", "--npix", "15"]).unwrap();
    assert!(settings::load_config_with(&args).is_err());
}

#[test]
fn default_train_runs_and_writes_output() {
    let mut settings = settings::load_default_config().unwrap();
    settings.npix = 16;
    settings.snapshots = true;
    settings.output_dir = scratch_dir("run");

    let train = OpticalTrain::new(settings);
    let run = train.run().unwrap();

    // lens at the entrance, then 1.5 m of propagation
    assert_relative_eq!(run.wavefront.z().as_meters(), 1.5, max_relative = 1e-12);
    assert_eq!(run.wavefront.waists_z().len(), 2);

    let dir = &train.settings().output_dir;
    output::writeup(dir, &run).unwrap();

    let intensity = fs::read_to_string(dir.join("intensity.dat")).unwrap();
    assert_eq!(intensity.lines().count(), 32);
    assert!(intensity.lines().all(|l| l.split(' ').count() == 32));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["waists"].as_array().unwrap().len(), 2);
    assert_eq!(summary["planetype"], "intermediate");
    assert!(!summary["history"].as_array().unwrap().is_empty());
    assert!(dir.join("snapshot_0_starting_surface.dat").exists());

    fs::remove_dir_all(dir).unwrap();
}
