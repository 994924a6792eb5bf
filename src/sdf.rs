use anyhow::{Context, Result};
use itertools::Itertools;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::iter::Peekable;
use std::path::Path;

use crate::dedup::ScoredPattern;
use crate::region::{PatternCloud, RegionRecord};
use crate::XYZ;

pub const PATTERN_PROGRAM: &str = "TWNPATTERN";
pub const REGION_PROGRAM: &str = "TWNREGION";
pub const KEY_CENTER_NAME: &str = "twn.center.name";
pub const KEY_OCCUPATION: &str = "twn.occupation.trjs";
pub const KEY_FREQUENCY: &str = "twn.frequency";
pub const KEY_WATER_NAMES: &str = "twn.w.names";
pub const KEY_REGION_FREQUENCY: &str = "region.frequency";
pub const KEY_PATTERN_NAMES: &str = "twn.pattern.names";
const BLOCK_END: &str = "$$$$";
const ATOMS_END: &str = "M  END";
const LIST_SEPARATOR: &str = "  ";

#[derive(Debug)]
pub enum SdfParsingError {
    MissingHeader { line: usize },
    InvalidOrMissingCounts { line: usize },
    InvalidOrMissingAtom { line: usize },
    MissingProperty(String),
}

impl fmt::Display for SdfParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for SdfParsingError {}

#[derive(Debug, Clone, PartialEq)]
pub struct SdfAtom {
    pub position: XYZ,
    pub element: String,
}

/// One molecule record of an SD file: atoms and data items, no bonds.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfBlock {
    pub name: String,
    pub program: String,
    pub atoms: Vec<SdfAtom>,
    pub properties: Vec<(String, String)>,
}

fn parse_atom(line: &str, line_number: usize) -> Result<SdfAtom, SdfParsingError> {
    let err = || SdfParsingError::InvalidOrMissingAtom { line: line_number };
    let tokens = line.split_whitespace().collect::<Vec<_>>();
    if tokens.len() < 4 {
        return Err(err());
    }
    let coords = tokens[..3]
        .iter()
        .map(|v| v.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| err())?;
    Ok(SdfAtom {
        position: XYZ::from([coords[0], coords[1], coords[2]], 0),
        element: tokens[3].to_string(),
    })
}

fn parse_counts(line: &str) -> Option<(usize, usize)> {
    let atoms = line.get(0..3)?.trim().parse().ok()?;
    let bonds = line.get(3..6)?.trim().parse().ok()?;
    Some((atoms, bonds))
}

fn parse_value<'a, I>(lines: &mut Peekable<I>) -> String
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let mut value = Vec::new();
    while let Some((_, line)) = lines.next_if(|(_, l)| !l.trim().is_empty() && *l != BLOCK_END) {
        value.push(line.trim_end());
    }
    value.join("\n")
}

impl SdfBlock {
    pub fn new(name: &str, program: &str) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            atoms: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn push_atom(&mut self, position: XYZ, element: &str) {
        self.atoms.push(SdfAtom {
            position,
            element: element.to_string(),
        });
    }

    pub fn push_property(&mut self, key: &str, value: impl ToString) {
        self.properties.push((key.to_string(), value.to_string()));
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Atom positions without hydrogens and dummy atoms.
    pub fn heavy_points(&self) -> Vec<XYZ> {
        self.atoms
            .iter()
            .filter(|atom| atom.element != "H" && atom.element != "?")
            .enumerate()
            .map(|(i, atom)| XYZ::from_vector(*atom.position, i))
            .collect()
    }

    fn parse<'a, I>(lines: &mut Peekable<I>) -> Result<Option<Self>, SdfParsingError>
    where
        I: Iterator<Item = (usize, &'a str)>,
    {
        while lines.next_if(|(_, l)| l.trim().is_empty()).is_some() {}
        let Some((header_line, name)) = lines.next() else {
            return Ok(None);
        };
        let program = lines
            .next()
            .map(|(_, l)| l.split_whitespace().next().unwrap_or_default().to_string())
            .ok_or(SdfParsingError::MissingHeader { line: header_line })?;
        lines
            .next()
            .ok_or(SdfParsingError::MissingHeader { line: header_line })?;
        let (atoms_count, bonds_count) = lines
            .next()
            .and_then(|(_, l)| parse_counts(l))
            .ok_or(SdfParsingError::InvalidOrMissingCounts { line: header_line + 3 })?;

        let mut block = Self::new(name.trim(), &program);
        for i in 0..atoms_count {
            let (n, line) = lines
                .next()
                .ok_or(SdfParsingError::InvalidOrMissingAtom { line: header_line + 4 + i })?;
            block.atoms.push(parse_atom(line, n)?);
        }
        lines.by_ref().take(bonds_count).for_each(drop);
        if !lines.by_ref().any(|(_, l)| l.starts_with(ATOMS_END)) {
            return Ok(Some(block));
        }
        while let Some((_, line)) = lines.next() {
            if line == BLOCK_END {
                break;
            }
            if let Some(key) = line
                .strip_prefix("> ")
                .and_then(|l| l.split_once('<'))
                .and_then(|(_, l)| l.split_once('>'))
                .map(|(key, _)| key.to_string())
            {
                let value = parse_value(lines);
                block.properties.push((key, value));
            }
        }
        Ok(Some(block))
    }

    pub fn parse_blocks<'a>(
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<Self>, SdfParsingError> {
        let mut lines = lines
            .into_iter()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .peekable();
        let mut blocks = Vec::new();
        while let Some(block) = Self::parse(&mut lines)? {
            blocks.push(block);
        }
        Ok(blocks)
    }
}

impl fmt::Display for SdfBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  {:<20}3D                             0", self.program)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:3}{:3}  0  0  0  0  0  0  0  0999 V2000",
            self.atoms.len(),
            0
        )?;
        for atom in &self.atoms {
            writeln!(
                f,
                "{:10.4}{:10.4}{:10.4} {:1} {:3}{:3}",
                atom.position.x(),
                atom.position.y(),
                atom.position.z(),
                atom.element,
                0,
                0
            )?;
        }
        writeln!(f, "{ATOMS_END}")?;
        for (key, value) in &self.properties {
            writeln!(f, "> <{key}>")?;
            writeln!(f, "{value}")?;
            writeln!(f)?;
        }
        writeln!(f, "{BLOCK_END}")
    }
}

pub struct SdfFile {
    blocks: Vec<SdfBlock>,
}

impl SdfFile {
    #[must_use]
    pub fn new(blocks: Vec<SdfBlock>) -> Self {
        Self { blocks }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let lines = BufReader::new(
            File::open(path).context(format!("Reading {}", path.to_string_lossy()))?,
        )
        .lines()
        .collect::<Result<Vec<_>, _>>()?;
        let blocks = SdfBlock::parse_blocks(lines.iter().map(String::as_str))
            .context(format!("Parsing {}", path.to_string_lossy()))?;
        Ok(Self { blocks })
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let f = fs::File::create(path)?;
        let mut w = io::BufWriter::new(f);
        for block in &self.blocks {
            write!(w, "{block}")?;
        }
        w.flush()
    }

    #[must_use]
    pub fn get_blocks(&self) -> &[SdfBlock] {
        &self.blocks
    }
}

pub fn pattern_name(number: usize) -> String {
    format!("TWN_Pattern_{number}")
}

pub fn region_name(region_id: usize) -> String {
    format!("TWN_Region_{region_id}")
}

/// Block for the `number`-th kept pattern, numbered from 1.
pub fn pattern_block(number: usize, scored: &ScoredPattern) -> SdfBlock {
    let mut block = SdfBlock::new(&pattern_name(number), PATTERN_PROGRAM);
    scored
        .pattern
        .points()
        .for_each(|xyz| block.push_atom(*xyz, "O"));
    let occupancy = &scored.occupancy;
    block.push_property(KEY_CENTER_NAME, scored.name());
    block.push_property(KEY_OCCUPATION, occupancy.trajectories().join(LIST_SEPARATOR));
    block.push_property(KEY_FREQUENCY, occupancy.breadth());
    block.push_property(
        KEY_WATER_NAMES,
        occupancy
            .matches()
            .iter()
            .map(|m| m.residue_label())
            .join(LIST_SEPARATOR),
    );
    block
}

pub fn region_block(region: &RegionRecord, clouds: &[PatternCloud]) -> SdfBlock {
    let mut block = SdfBlock::new(&region_name(region.region_id), REGION_PROGRAM);
    region
        .points(clouds)
        .into_iter()
        .for_each(|xyz| block.push_atom(*xyz, "O"));
    block.push_property(KEY_REGION_FREQUENCY, region.frequency());
    block.push_property(KEY_PATTERN_NAMES, region.members.iter().join(LIST_SEPARATOR));
    block
}

impl TryFrom<&SdfBlock> for PatternCloud {
    type Error = SdfParsingError;

    fn try_from(block: &SdfBlock) -> Result<Self, Self::Error> {
        let trajectories = block
            .property(KEY_OCCUPATION)
            .ok_or_else(|| SdfParsingError::MissingProperty(KEY_OCCUPATION.to_string()))?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        Ok(PatternCloud::new(&block.name, block.heavy_points(), trajectories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{OccupancyRecord, TrajectoryMatch};
    use crate::pattern::{CandidatePattern, Center};
    use assert_float_eq::assert_f64_near;

    const PATTERNS: &str = "\
TWN_Pattern_1
  TWNPATTERN          3D                             0

  2  0  0  0  0  0  0  0  0  0999 V2000
    1.0000    2.0000    3.0000 O   0  0
   -1.5000    0.2500    8.0000 O   0  0
M  END
> <twn.center.name>
TWN_3_7

> <twn.occupation.trjs>
3  0  5

> <twn.frequency>
3

$$$$
TWN_Pattern_2
  TWNPATTERN          3D                             0

  2  0  0  0  0  0  0  0  0  0999 V2000
    9.0000    9.0000    9.0000 O   0  0
    9.5000    9.0000    9.0000 H   0  0
M  END
> <twn.occupation.trjs>
1  2

$$$$
";

    fn scored() -> ScoredPattern {
        let pattern = CandidatePattern::new(
            "TWN_3_7",
            vec![
                Center::new("SOL10", [1.0, 2.0, 3.0]),
                Center::new("SOL11", [4.0, 5.0, 6.0]),
            ],
        );
        let occupancy = OccupancyRecord::new(
            "TWN_3_7",
            vec![
                TrajectoryMatch {
                    trajectory: "3".to_string(),
                    residues: vec!["SOL10".to_string(), "SOL11".to_string()],
                },
                TrajectoryMatch {
                    trajectory: "0".to_string(),
                    residues: vec!["W001".to_string(), "W0042".to_string()],
                },
            ],
        );
        ScoredPattern::new(pattern, occupancy)
    }

    #[test]
    fn test_parse_blocks() {
        let blocks = SdfBlock::parse_blocks(PATTERNS.lines()).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "TWN_Pattern_1");
        assert_eq!(blocks[0].program, PATTERN_PROGRAM);
        assert_eq!(blocks[0].atoms.len(), 2);
        assert_f64_near!(blocks[0].atoms[1].position.x(), -1.5);
        assert_eq!(blocks[0].property(KEY_CENTER_NAME), Some("TWN_3_7"));
        assert_eq!(blocks[0].property(KEY_FREQUENCY), Some("3"));
        assert_eq!(blocks[1].heavy_points().len(), 1);
        assert!(blocks[1].property(KEY_CENTER_NAME).is_none());
    }

    #[test]
    fn test_cloud_from_block() {
        let blocks = SdfBlock::parse_blocks(PATTERNS.lines()).unwrap();
        let cloud = PatternCloud::try_from(&blocks[0]).unwrap();
        assert_eq!(cloud.name, "TWN_Pattern_1");
        assert_eq!(cloud.points.len(), 2);
        assert_eq!(
            cloud.trajectories.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["0", "3", "5"]
        );
        let empty = SdfBlock::new("x", PATTERN_PROGRAM);
        assert!(matches!(
            PatternCloud::try_from(&empty),
            Err(SdfParsingError::MissingProperty(_))
        ));
    }

    #[test]
    fn test_pattern_block_layout() {
        let text = pattern_block(4, &scored()).to_string();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "TWN_Pattern_4");
        assert_eq!(
            lines[1],
            "  TWNPATTERN          3D                             0"
        );
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "  2  0  0  0  0  0  0  0  0  0999 V2000");
        assert_eq!(lines[4], "    1.0000    2.0000    3.0000 O   0  0");
        assert_eq!(lines[6], "M  END");
        assert_eq!(lines[7], "> <twn.center.name>");
        assert_eq!(lines[8], "TWN_3_7");
        assert_eq!(lines[11], "3  0");
        assert_eq!(lines[17], "SOL10-SOL11  W001-W0042");
        assert_eq!(lines.last(), Some(&"$$$$"));
    }

    #[test]
    fn test_region_block() {
        let blocks = SdfBlock::parse_blocks(PATTERNS.lines()).unwrap();
        let clouds = blocks
            .iter()
            .map(PatternCloud::try_from)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let region = RegionRecord {
            region_id: 2,
            members: vec!["TWN_Pattern_1".to_string(), "TWN_Pattern_2".to_string()],
            trajectories: ["0", "1", "2", "3", "5"].iter().map(|t| t.to_string()).collect(),
        };
        let text = region_block(&region, &clouds).to_string();
        let parsed = SdfBlock::parse_blocks(text.lines()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "TWN_Region_2");
        assert_eq!(parsed[0].program, REGION_PROGRAM);
        assert_eq!(parsed[0].atoms.len(), 3);
        assert_eq!(parsed[0].property(KEY_REGION_FREQUENCY), Some("5"));
        assert_eq!(
            parsed[0].property(KEY_PATTERN_NAMES),
            Some("TWN_Pattern_1  TWN_Pattern_2")
        );
    }

    #[test]
    fn test_truncated_block() {
        let text = "TWN_Pattern_1\n  TWNPATTERN\n\n  2  0\n    1.0 2.0 3.0 O\n";
        assert!(matches!(
            SdfBlock::parse_blocks(text.lines()),
            Err(SdfParsingError::InvalidOrMissingAtom { .. })
        ));
    }
}
