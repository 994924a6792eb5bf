use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::{fs, path::PathBuf};
use twn_util_rust::{
    LogReporter, PatternCloud, SdfFile, extract_regions, region_block, region_name,
};

/// Merge water network patterns into disjoint regions
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Pattern file written by twn-pattern
    pattern_file: PathBuf,

    /// Directory the region files are written to
    #[arg(short, long)]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let patterns = SdfFile::read(&cli.pattern_file)?;
    let clouds = patterns
        .get_blocks()
        .iter()
        .map(PatternCloud::try_from)
        .collect::<Result<Vec<_>, _>>()
        .context(format!("Reading patterns from {}", cli.pattern_file.to_string_lossy()))?;

    let regions = extract_regions(&clouds, &mut LogReporter);

    fs::create_dir_all(&cli.output_dir).context(format!(
        "Creating {}",
        cli.output_dir.to_string_lossy()
    ))?;
    for region in &regions {
        let path = cli
            .output_dir
            .join(format!("{}.sdf", region_name(region.region_id)));
        SdfFile::new(vec![region_block(region, &clouds)]).save(&path)?;
    }
    info!(
        "{} regions written to {}",
        regions.len(),
        cli.output_dir.to_string_lossy()
    );
    Ok(())
}
