mod boundary;
mod dedup;
mod error;
mod math;
mod matcher;
mod pattern;
mod pdb;
mod pipeline;
mod region;
mod report;
mod sdf;
mod water;
mod xyz;

pub use boundary::{Boundary, BoundaryMethod, BoundaryParsingError};
pub use dedup::{
    deduplicate, is_contained, AcceptedPatternSet, Redundancy, ScoredPattern, MIN_OCCUPANCY,
};
pub use error::{PatternError, RecordError};
pub use math::{mean_position, IteratorMean};
pub use matcher::{Matcher, OccupancyRecord, TrajectoryMatch};
pub use pattern::{
    load_candidates, source_trajectory_from_name, CandidatePattern, Center, PointRecord,
};
pub use pdb::{
    candidate_points, file_stem, list_pdb_files, parse_atoms, read_atoms, trajectory_waters,
    water_label, PdbAtom, PdbParsingError,
};
pub use pipeline::{extract_regions, identify_patterns, load_inputs};
pub use region::{merge_regions, PatternCloud, RegionRecord};
pub use report::{Event, LogReporter, Reporter};
pub use sdf::{
    pattern_block, pattern_name, region_block, region_name, SdfAtom, SdfBlock, SdfFile,
    SdfParsingError,
};
pub use water::{Trajectories, WaterObservation, WaterRecord};
pub use xyz::{check_cutoff, MATCH_RADIUS, XYZ};
