use std::error::Error;
use std::path::PathBuf;
use clap::Parser;
use log::info;

use mobcore::algorithm::cancel::NeverCancel;
use mobcore::algorithm::cluster::SeedOrder;
use mobdf::builder::params::{read_params, MobilogramBuilderParams};
use mobdf::builder::task::{BuildReport, MobilogramBuilderTask};
use mobdf::data::dataset::read_dataset;

/// Build mobilograms for the frames of an ion mobility dataset
#[derive(Parser, Debug)]
#[command(name = "mobbuild", version, about)]
struct Args {
    /// JSON dataset with frames, mass lists and optional raw points
    dataset: PathBuf,
    /// JSON parameter file, fields not given keep their defaults
    #[arg(short, long)]
    params: Option<PathBuf>,
    /// Name of the mass list to build from
    #[arg(long)]
    mass_list: Option<String>,
    /// Mobilograms need more points than this
    #[arg(long)]
    min_points: Option<usize>,
    /// Back-fill mobilograms from the raw points
    #[arg(long, default_value_t = false)]
    add_raw_points: bool,
    /// Seed mobilograms from the most intense point down
    #[arg(long, default_value_t = false)]
    descending: bool,
    #[arg(short = 't', long, default_value_t = 1)]
    num_threads: usize,
    /// Print every mobilogram aligned to all scans of its frame
    #[arg(long, default_value_t = false)]
    dense: bool,
}

fn build_params(args: &Args) -> Result<MobilogramBuilderParams, Box<dyn Error>> {
    let mut params = match &args.params {
        Some(path) => read_params(path)?,
        None => MobilogramBuilderParams::default(),
    };
    if let Some(mass_list) = &args.mass_list {
        params.mass_list = mass_list.clone();
    }
    if let Some(min_points) = args.min_points {
        params.min_points = min_points;
    }
    if args.add_raw_points {
        params.add_raw_points = true;
    }
    if args.descending {
        params.seed_order = SeedOrder::Descending;
    }
    params.validate()?;
    Ok(params)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let params = build_params(&args)?;
    let mut dataset = read_dataset(&args.dataset)?;

    let task = MobilogramBuilderTask::new(params);
    let reports = task.run_partitioned(&mut dataset.frames, &dataset.store, &NeverCancel, args.num_threads)?;
    let report = BuildReport::merge(reports);
    info!("{}", report);

    for frame_report in &report.frames {
        println!("{}", frame_report);
        for warning in &frame_report.warnings {
            println!("  warning: {}", warning);
        }
    }

    if args.dense {
        for frame in &dataset.frames {
            for (mobilogram, dense) in frame.mobilograms().iter().zip(frame.dense_mobilograms()) {
                println!("frame {}: {}", frame.frame_id, mobilogram);
                for point in dense.iter() {
                    println!("  {}\t{:.6}\t{:.4}\t{:.1}", point.scan_id, point.mobility, point.mz, point.intensity);
                }
            }
        }
    }

    println!("{}", report);
    Ok(())
}
