use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::boundary::Boundary;
use crate::pattern::PointRecord;
use crate::water::WaterRecord;
use crate::{check_cutoff, XYZ};

pub const SOLVENT: &str = "SOL";
pub const IONS: [&str; 2] = ["CL", "NA"];
pub const WATER_OXYGEN: &str = "OW";
const SERIAL_WRAP: usize = 100_000;

#[derive(Debug)]
pub enum PdbParsingError {
    InvalidSerial { line: usize },
    InvalidResidueNumber { line: usize },
    InvalidCoordinate { line: usize },
    InvalidOccupancy { line: usize },
    InvalidTemperatureFactor { line: usize },
}

impl std::fmt::Display for PdbParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for PdbParsingError {}

#[derive(Debug, Clone, PartialEq)]
pub struct PdbAtom {
    pub serial: usize,
    pub name: String,
    pub residue_name: String,
    pub chain: String,
    pub residue_number: i64,
    pub position: XYZ,
    pub occupancy: f64,
    pub temperature_factor: f64,
    pub element: String,
}

fn column(line: &str, begin: usize, end: usize) -> &str {
    line.get(begin..end.min(line.len()))
        .or_else(|| line.get(begin..))
        .unwrap_or("")
        .trim()
}

fn optional_f64(value: &str, err: PdbParsingError) -> Result<f64, PdbParsingError> {
    match value {
        "" => Ok(0.0),
        value => value.parse().map_err(|_| err),
    }
}

impl PdbAtom {
    pub fn is_atom_record(line: &str) -> bool {
        line.starts_with("ATOM") || line.starts_with("HETATM")
    }

    /// Splits a fixed-column `ATOM`/`HETATM` record.
    pub fn parse(line: &str, line_number: usize) -> Result<Self, PdbParsingError> {
        let serial = column(line, 6, 11)
            .parse()
            .map_err(|_| PdbParsingError::InvalidSerial { line: line_number })?;
        let residue_number = column(line, 22, 26)
            .parse()
            .map_err(|_| PdbParsingError::InvalidResidueNumber { line: line_number })?;
        let coords = [(30, 38), (38, 46), (46, 54)]
            .iter()
            .map(|&(begin, end)| column(line, begin, end).parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| PdbParsingError::InvalidCoordinate { line: line_number })?;
        Ok(Self {
            serial,
            name: column(line, 11, 17).to_string(),
            residue_name: column(line, 17, 20).to_string(),
            chain: column(line, 21, 22).to_string(),
            residue_number,
            position: XYZ::from([coords[0], coords[1], coords[2]], serial),
            occupancy: optional_f64(
                column(line, 54, 60),
                PdbParsingError::InvalidOccupancy { line: line_number },
            )?,
            temperature_factor: optional_f64(
                column(line, 60, 66),
                PdbParsingError::InvalidTemperatureFactor { line: line_number },
            )?,
            element: column(line, 66, line.len()).to_string(),
        })
    }

    /// Residue name followed by the sequence number, e.g. `LYS17`.
    pub fn residue_label(&self) -> String {
        format!("{}{}", self.residue_name, self.residue_number)
    }

    pub fn is_solvent(&self) -> bool {
        self.residue_name == SOLVENT
    }

    pub fn is_ion(&self) -> bool {
        IONS.contains(&self.residue_name.as_str())
    }
}

pub fn parse_atoms(
    lines: impl IntoIterator<Item = impl AsRef<str>>,
) -> Result<Vec<PdbAtom>, PdbParsingError> {
    lines
        .into_iter()
        .enumerate()
        .filter(|(_, line)| PdbAtom::is_atom_record(line.as_ref()))
        .map(|(i, line)| PdbAtom::parse(line.as_ref(), i + 1))
        .collect()
}

pub fn read_atoms(path: &Path) -> Result<Vec<PdbAtom>> {
    let file = File::open(path).context(format!("Reading {}", path.to_string_lossy()))?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .context(format!("Reading {}", path.to_string_lossy()))?;
    parse_atoms(lines).context(format!("Parsing {}", path.to_string_lossy()))
}

/// `.pdb` files of a directory sorted by name.
pub fn list_pdb_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = fs::read_dir(dir)
        .context(format!("Listing {}", dir.to_string_lossy()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "pdb"))
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// `W` + first two digits of the zero-padded water number + the rest as an integer.
pub fn water_label(water_number: usize) -> String {
    let digits = format!("{water_number:06}");
    let (head, tail) = digits.split_at(2);
    format!("W{head}{}", tail.parse::<u64>().unwrap_or_default())
}

/// Water oxygens of one trajectory frame that lie inside the boundary.
pub fn trajectory_waters(
    atoms: &[PdbAtom],
    trajectory_id: &str,
    boundary: &Boundary,
) -> Vec<WaterRecord> {
    let centers = boundary.centers(trajectory_id, atoms);
    let mut offset = 0;
    let mut first_serial = None;
    atoms
        .iter()
        .filter(|atom| atom.is_solvent())
        .filter_map(|atom| {
            if atom.serial == 0 {
                offset += SERIAL_WRAP;
            }
            let serial = atom.serial + offset;
            let first = *first_serial.get_or_insert(serial);
            if atom.name != WATER_OXYGEN {
                return None;
            }
            centers
                .iter()
                .any(|center| check_cutoff(center, &atom.position, boundary.range))
                .then(|| WaterRecord {
                    id: atom.serial,
                    trajectory: trajectory_id.to_string(),
                    residue: water_label(serial.saturating_sub(first) / 3 + 1),
                    x: atom.position.x(),
                    y: atom.position.y(),
                    z: atom.position.z(),
                    occupancy: atom.occupancy,
                    temperature_factor: atom.temperature_factor,
                    element: atom.element.clone(),
                })
        })
        .collect()
}

/// Cluster-center waters of one candidate file.
pub fn candidate_points(atoms: &[PdbAtom], name: &str) -> Vec<PointRecord> {
    atoms
        .iter()
        .filter(|atom| atom.name == WATER_OXYGEN)
        .map(|atom| PointRecord {
            point_id: atom.serial,
            group_name: name.to_string(),
            label: atom.residue_label(),
            x: atom.position.x(),
            y: atom.position.y(),
            z: atom.position.z(),
        })
        .collect()
}
