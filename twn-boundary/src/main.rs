use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use log::{info, warn};
use std::path::{Path, PathBuf};
use twn_util_rust::{Boundary, PdbAtom, XYZ, file_stem, list_pdb_files, mean_position, read_atoms};

/// Write a boundary file that limits the waters taken from each trajectory
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory with one .pdb frame per trajectory
    #[arg(short = 'j', long)]
    trajectory_dir: PathBuf,

    /// Radius around the center inside which waters are kept
    #[arg(short, long)]
    range: f64,

    /// Resulting boundary file
    #[arg(short, long, default_value = "Center.bd")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Uses the same fixed coordinate for every trajectory.
    Point(PointArgs),
    /// Uses the mean position of the CA atoms of the given residues in each trajectory.
    Residue(ResidueArgs),
}

#[derive(Parser)]
struct PointArgs {
    /// Center coordinate "x y z"
    #[arg(num_args = 3, allow_negative_numbers = true)]
    center: Vec<f64>,
}

#[derive(Parser)]
struct ResidueArgs {
    /// Residue sequence numbers
    #[arg(required = true, num_args = 1..)]
    residues: Vec<i64>,
}

fn residue_center(atoms: &[PdbAtom], residues: &[i64]) -> Option<XYZ> {
    let alpha_carbons = atoms
        .iter()
        .filter(|atom| !atom.is_solvent() && !atom.is_ion() && atom.name == "CA")
        .filter(|atom| residues.contains(&atom.residue_number))
        .map(|atom| atom.position)
        .collect::<Vec<_>>();
    mean_position(&alpha_carbons)
}

fn point_coords(files: &[PathBuf], center: &[f64]) -> Result<Vec<(String, XYZ)>> {
    let [x, y, z] = center else {
        bail!("Center needs 3 coordinates, got {}", center.len());
    };
    Ok(files
        .iter()
        .map(|path| (file_stem(path), XYZ::from([*x, *y, *z], 0)))
        .collect())
}

fn residue_coords(files: &[PathBuf], residues: &[i64]) -> Result<Vec<(String, XYZ)>> {
    let mut coords = Vec::new();
    for path in files {
        let atoms = read_atoms(path)?;
        match residue_center(&atoms, residues) {
            Some(center) => coords.push((file_stem(path), center)),
            None => warn!(
                "No CA atoms of residues {} in {}, skipped",
                residues.iter().join(","),
                path.to_string_lossy()
            ),
        }
    }
    Ok(coords)
}

fn make_boundary(cli: &Cli) -> Result<Boundary> {
    let files = list_pdb_files(&cli.trajectory_dir)?;
    let coords = match &cli.command {
        Commands::Point(args) => point_coords(&files, &args.center)?,
        Commands::Residue(args) => residue_coords(&files, &args.residues)?,
    };
    Ok(Boundary::point(cli.range, coords))
}

fn save(boundary: &Boundary, path: &Path) -> Result<()> {
    boundary.save(path)?;
    info!(
        "Boundary with {} centers saved to {}",
        boundary.coords.len(),
        path.to_string_lossy()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let boundary = make_boundary(&cli)?;
    save(&boundary, &cli.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::assert_f64_near;
    use twn_util_rust::parse_atoms;

    const FRAME: &str = "\
ATOM      2  CA  LYS A  17       0.000   0.000   0.000  1.00  0.00           C
ATOM      3  CB  LYS A  17       5.000   5.000   5.000  1.00  0.00           C
ATOM     12  CA  GLU A  51       4.000   2.000   0.000  1.00  0.00           C
ATOM     30  OW  SOL   200       9.000   9.000   9.000  1.00  0.00           O
";

    #[test]
    fn test_residue_center() {
        let atoms = parse_atoms(FRAME.lines()).unwrap();
        let center = residue_center(&atoms, &[17, 51]).unwrap();
        assert_f64_near!(center.x(), 2.0);
        assert_f64_near!(center.y(), 1.0);
        assert_f64_near!(center.z(), 0.0);
        let center = residue_center(&atoms, &[17]).unwrap();
        assert_f64_near!(center.x(), 0.0);
        assert!(residue_center(&atoms, &[200]).is_none());
    }

    #[test]
    fn test_point_coords() {
        let files = vec![PathBuf::from("a/0.pdb"), PathBuf::from("a/1.pdb")];
        let coords = point_coords(&files, &[1.0, -2.0, 3.0]).unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[1].0, "1");
        assert_f64_near!(coords[1].1.y(), -2.0);
        assert!(point_coords(&files, &[1.0]).is_err());
    }
}
