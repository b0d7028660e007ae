use anyhow::Result;
use fresnel_beam::{output, settings, train::OpticalTrain};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = settings::load_config()?;
    let train = OpticalTrain::new(settings);

    let run = train.run()?;
    output::writeup(&train.settings().output_dir, &run)?;
    Ok(())
}
