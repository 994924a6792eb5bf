use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use rayon::{ThreadPoolBuilder, prelude::*};
use std::{
    fs,
    path::{Path, PathBuf},
};
use twn_util_rust::{
    Boundary, CandidatePattern, Event, LogReporter, PointRecord, Reporter, SdfFile, Trajectories,
    WaterRecord, candidate_points, file_stem, identify_patterns, list_pdb_files, pattern_block,
    read_atoms, trajectory_waters,
};

/// Identify water network patterns that recur across trajectories
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory with one .pdb frame per trajectory
    #[arg(short = 'j', long)]
    trajectory_dir: PathBuf,

    /// Boundary file limiting the waters taken from each trajectory
    #[arg(short, long)]
    boundary: PathBuf,

    /// Directory with one .pdb file of cluster-center waters per candidate
    #[arg(short, long)]
    candidate_dir: PathBuf,

    /// Directory the TWN.sdf pattern file is written to
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Number of threads to run in parallel
    #[arg(short, long, default_value_t = 2)]
    threads: usize,
}

fn read_trajectory(path: &Path, boundary: &Boundary) -> Result<(String, Vec<WaterRecord>)> {
    let trajectory_id = file_stem(path);
    let atoms = read_atoms(path)?;
    let waters = trajectory_waters(&atoms, &trajectory_id, boundary);
    debug!("{trajectory_id}: {} waters inside boundary", waters.len());
    Ok((trajectory_id, waters))
}

fn read_candidate(path: &Path) -> Result<(String, Vec<PointRecord>)> {
    let name = file_stem(path);
    let atoms = read_atoms(path)?;
    let points = candidate_points(&atoms, &name);
    Ok((name, points))
}

fn load_trajectories(
    files: &[PathBuf],
    boundary: &Boundary,
    reporter: &mut impl Reporter,
) -> Result<Trajectories> {
    let records = files
        .par_iter()
        .map(|path| read_trajectory(path, boundary))
        .collect::<Result<Vec<_>>>()?;
    let mut trajectories = Trajectories::new();
    for (trajectory_id, waters) in records {
        trajectories.insert_trajectory(&trajectory_id);
        for err in trajectories.extend_records(waters) {
            reporter.report(Event::RecordSkipped(err));
        }
    }
    Ok(trajectories)
}

fn load_candidates(
    files: &[PathBuf],
    reporter: &mut impl Reporter,
) -> Result<Vec<CandidatePattern>> {
    let records = files
        .par_iter()
        .map(|path| read_candidate(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(records
        .into_iter()
        .map(|(name, points)| {
            let (pattern, skipped) = CandidatePattern::from_records(&name, &points);
            for err in skipped {
                reporter.report(Event::RecordSkipped(err));
            }
            pattern
        })
        .collect())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let boundary = Boundary::read(&cli.boundary)?;
    info!(
        "Limited boundary: {} ({:?}, range {})",
        cli.boundary.to_string_lossy(),
        boundary.method,
        boundary.range
    );
    let trajectory_files = list_pdb_files(&cli.trajectory_dir)?;
    let candidate_files = list_pdb_files(&cli.candidate_dir)?;
    info!(
        "{} trajectory files, {} candidate files",
        trajectory_files.len(),
        candidate_files.len()
    );

    let mut reporter = LogReporter;
    let tp = ThreadPoolBuilder::new().num_threads(cli.threads).build()?;
    let set = tp.install(|| -> Result<_> {
        let trajectories = load_trajectories(&trajectory_files, &boundary, &mut reporter)?;
        let candidates = load_candidates(&candidate_files, &mut reporter)?;
        Ok(identify_patterns(&candidates, &trajectories, &mut reporter))
    })?;

    let blocks = set
        .kept
        .iter()
        .enumerate()
        .map(|(i, scored)| pattern_block(i + 1, scored))
        .collect();
    fs::create_dir_all(&cli.output_dir).context(format!(
        "Creating {}",
        cli.output_dir.to_string_lossy()
    ))?;
    let path = cli.output_dir.join("TWN.sdf");
    SdfFile::new(blocks).save(&path)?;
    info!("Saved {}", path.to_string_lossy());
    Ok(())
}
