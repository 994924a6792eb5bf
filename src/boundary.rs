use anyhow::{Context, Result};
use itertools::Itertools;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::math::mean_position;
use crate::pdb::PdbAtom;
use crate::XYZ;

const METHOD_POINT: &str = "point";
const METHOD_RESIDUE_CENTER: &str = "residue_center_extraction";

#[derive(Debug)]
pub enum BoundaryParsingError {
    MissingMethod,
    UnknownMethod(String),
    InvalidOrMissingRange,
    InvalidCoord { line: usize },
    MissingResidues,
}

impl fmt::Display for BoundaryParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for BoundaryParsingError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMethod {
    /// One fixed point per trajectory, taken from the `COORD` lines.
    Point,
    /// Mean position of the `CA` atoms of the listed residues.
    ResidueCenter,
}

/// Spatial filter applied to trajectory waters before matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub method: BoundaryMethod,
    pub range: f64,
    pub coords: Vec<(String, XYZ)>,
    pub residues: Vec<String>,
}

fn parse_coord(tokens: &[&str], line: usize) -> Result<(String, XYZ), BoundaryParsingError> {
    let err = || BoundaryParsingError::InvalidCoord { line };
    match tokens {
        [trajectory, x, y, z] => {
            let coords = [x, y, z]
                .iter()
                .map(|v| v.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| err())?;
            Ok((
                trajectory.to_string(),
                XYZ::from([coords[0], coords[1], coords[2]], 0),
            ))
        }
        _ => Err(err()),
    }
}

impl Boundary {
    pub fn point(range: f64, coords: Vec<(String, XYZ)>) -> Self {
        Self {
            method: BoundaryMethod::Point,
            range,
            coords,
            residues: vec![],
        }
    }

    pub fn parse<'a>(
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, BoundaryParsingError> {
        let mut method = None;
        let mut range = None;
        let mut coords = Vec::new();
        let mut residues = Vec::new();
        for (i, line) in lines.into_iter().enumerate() {
            let tokens = line.split_whitespace().collect::<Vec<_>>();
            match tokens.split_first() {
                Some((&"METHOD", words)) => method = Some(words.join("_")),
                Some((&"RANGE", [value, ..])) => {
                    range = Some(
                        value
                            .parse::<f64>()
                            .map_err(|_| BoundaryParsingError::InvalidOrMissingRange)?,
                    )
                }
                Some((&"COORD", values)) => coords.push(parse_coord(values, i + 1)?),
                Some((&"RESIDUE", names)) => residues.extend(
                    names
                        .iter()
                        .flat_map(|name| name.split('-'))
                        .filter(|name| !name.is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }
        let method = match method.as_deref() {
            Some(METHOD_POINT) => BoundaryMethod::Point,
            Some(METHOD_RESIDUE_CENTER) => BoundaryMethod::ResidueCenter,
            Some(other) => return Err(BoundaryParsingError::UnknownMethod(other.to_string())),
            None => return Err(BoundaryParsingError::MissingMethod),
        };
        if method == BoundaryMethod::ResidueCenter && residues.is_empty() {
            return Err(BoundaryParsingError::MissingResidues);
        }
        Ok(Self {
            method,
            range: range.ok_or(BoundaryParsingError::InvalidOrMissingRange)?,
            coords,
            residues,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let lines = BufReader::new(
            File::open(path).context(format!("Reading {}", path.to_string_lossy()))?,
        )
        .lines()
        .collect::<Result<Vec<_>, _>>()?;
        Self::parse(lines.iter().map(String::as_str))
            .context(format!("Parsing {}", path.to_string_lossy()))
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let f = fs::File::create(path)?;
        let mut w = io::BufWriter::new(f);
        write!(w, "{self}")?;
        w.flush()
    }

    /// Points a water must be within `range` of, for one trajectory frame.
    pub fn centers(&self, trajectory_id: &str, atoms: &[PdbAtom]) -> Vec<XYZ> {
        match self.method {
            BoundaryMethod::Point => self
                .coords
                .iter()
                .filter(|(trajectory, _)| trajectory == trajectory_id)
                .map(|(_, xyz)| *xyz)
                .collect(),
            BoundaryMethod::ResidueCenter => {
                let alpha_carbons = atoms
                    .iter()
                    .filter(|atom| !atom.is_solvent() && !atom.is_ion() && atom.name == "CA")
                    .filter(|atom| self.residues.contains(&atom.residue_label()))
                    .map(|atom| atom.position)
                    .collect::<Vec<_>>();
                mean_position(&alpha_carbons).into_iter().collect()
            }
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Boundary file for water network pattern analysis")?;
        writeln!(f)?;
        match self.method {
            BoundaryMethod::Point => writeln!(f, "METHOD  {METHOD_POINT}")?,
            BoundaryMethod::ResidueCenter => {
                writeln!(f, "METHOD  {}", METHOD_RESIDUE_CENTER.split('_').join(" "))?
            }
        }
        writeln!(f)?;
        writeln!(f, "RANGE  {}", self.range)?;
        writeln!(f)?;
        if !self.residues.is_empty() {
            writeln!(f, "RESIDUE  {}", self.residues.iter().join(" "))?;
        }
        for (trajectory, xyz) in &self.coords {
            writeln!(
                f,
                "COORD  {trajectory:>6}  {:8.3}  {:8.3}  {:8.3}",
                xyz.x(),
                xyz.y(),
                xyz.z()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdb::parse_atoms;
    use assert_float_eq::assert_f64_near;

    const POINT_BOUNDARY: &str = "\
# Boundary file
# PDB ID: 1abc

METHOD  point

RANGE  20.5

COORD       0     1.000     2.000     3.000
COORD       1     4.000     5.000     6.000
";

    #[test]
    fn test_parse_point_boundary() {
        let boundary = Boundary::parse(POINT_BOUNDARY.lines()).unwrap();
        assert_eq!(boundary.method, BoundaryMethod::Point);
        assert_f64_near!(boundary.range, 20.5);
        assert_eq!(boundary.coords.len(), 2);
        let centers = boundary.centers("1", &[]);
        assert_eq!(centers.len(), 1);
        assert_f64_near!(centers[0].z(), 6.0);
        assert!(boundary.centers("2", &[]).is_empty());
    }

    #[test]
    fn test_parse_residue_boundary() {
        let text = "METHOD residue center extraction\nRANGE 10\nRESIDUE LYS17-GLU51\n";
        let boundary = Boundary::parse(text.lines()).unwrap();
        assert_eq!(boundary.method, BoundaryMethod::ResidueCenter);
        assert_eq!(boundary.residues, vec!["LYS17", "GLU51"]);
        let frame = "\
ATOM      2  CA  LYS A  17       0.000   0.000   0.000  1.00  0.00           C
ATOM     12  CA  GLU A  51       4.000   2.000   0.000  1.00  0.00           C
ATOM     13  CB  GLU A  51       9.000   9.000   9.000  1.00  0.00           C
";
        let atoms = parse_atoms(frame.lines()).unwrap();
        let centers = boundary.centers("0", &atoms);
        assert_eq!(centers.len(), 1);
        assert_f64_near!(centers[0].x(), 2.0);
        assert_f64_near!(centers[0].y(), 1.0);
        assert!(boundary.centers("0", &[]).is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Boundary::parse("RANGE 1.0".lines()),
            Err(BoundaryParsingError::MissingMethod)
        ));
        assert!(matches!(
            Boundary::parse("METHOD point".lines()),
            Err(BoundaryParsingError::InvalidOrMissingRange)
        ));
        assert!(matches!(
            Boundary::parse("METHOD sphere\nRANGE 1".lines()),
            Err(BoundaryParsingError::UnknownMethod(_))
        ));
        assert!(matches!(
            Boundary::parse("METHOD point\nRANGE 1\nCOORD 0 1.0 x 2.0".lines()),
            Err(BoundaryParsingError::InvalidCoord { line: 3 })
        ));
        assert!(matches!(
            Boundary::parse("METHOD residue center extraction\nRANGE 1".lines()),
            Err(BoundaryParsingError::MissingResidues)
        ));
    }

    #[test]
    fn test_written_boundary_reads_back() {
        let boundary = Boundary::point(
            12.0,
            vec![
                ("0".to_string(), XYZ::from([1.0, 2.0, 3.0], 0)),
                ("1".to_string(), XYZ::from([-1.5, 0.25, 8.0], 0)),
            ],
        );
        let text = boundary.to_string();
        let parsed = Boundary::parse(text.lines()).unwrap();
        assert_eq!(parsed, boundary);
    }
}
