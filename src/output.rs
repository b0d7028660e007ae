//! Output files of a propagation run.
//!
//! A run directory holds:
//! - `intensity.dat`: the final intensity grid, one row per line
//! - `summary.json`: beam parameters, waists and the operation history
//! - `snapshot_<n>_<title>.dat`: intensity of each observed plane, if any

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;
use ndarray::Array2;

use crate::result::RunSummary;
use crate::train::TrainRun;

/// Writes `grid` as whitespace-separated rows.
pub fn write_grid<W: Write>(writer: &mut W, grid: &Array2<f64>) -> Result<()> {
    for row in grid.outer_iter() {
        writeln!(writer, "{}", row.iter().map(|v| format!("{:.6e}", v)).join(" "))?;
    }
    Ok(())
}

pub fn write_summary<W: Write>(writer: &mut W, summary: &RunSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

fn slug(title: &str) -> String {
    title
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .join("_")
}

fn write_grid_file(path: &Path, grid: &Array2<f64>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    write_grid(&mut writer, grid)?;
    writer.flush()?;
    Ok(())
}

/// Writes every output file of `run` into `dir`, creating it if needed.
pub fn writeup(dir: &Path, run: &TrainRun) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create output directory {:?}", dir))?;

    write_grid_file(&dir.join("intensity.dat"), &run.wavefront.centred_intensity())?;

    let summary = RunSummary::new(&run.wavefront, run.elapsed);
    let path = dir.join("summary.json");
    let file = File::create(&path).with_context(|| format!("cannot create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    write_summary(&mut writer, &summary)?;
    writer.flush()?;

    if let Some(recorder) = &run.snapshots {
        for (i, snapshot) in recorder.snapshots.iter().enumerate() {
            if let Some(intensity) = &snapshot.intensity {
                let name = format!("snapshot_{}_{}.dat", i, slug(&snapshot.title));
                write_grid_file(&dir.join(name), intensity)?;
            }
        }
    }

    info!("Output written to {:?}", dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn grid_rows_are_lines() {
        let grid = array![[1.0, 0.5], [0.0, 2.0]];
        let mut buf = Vec::new();
        write_grid(&mut buf, &grid).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "1.000000e0 5.000000e-1\n0.000000e0 2.000000e0\n");
    }

    #[test]
    fn titles_become_file_names() {
        assert_eq!(slug("Intermediate Waist"), "intermediate_waist");
        assert_eq!(slug("Final  Surface"), "final_surface");
    }
}
