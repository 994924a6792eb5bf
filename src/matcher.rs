use itertools::Itertools;
use kd_tree::KdTree;
use nalgebra::Vector3;
use rayon::prelude::*;

use crate::error::PatternError;
use crate::pattern::CandidatePattern;
use crate::water::{Trajectories, WaterObservation};
use crate::{check_cutoff, MATCH_RADIUS, XYZ};

/// Residues matched for each center of a pattern in one trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryMatch {
    pub trajectory: String,
    pub residues: Vec<String>,
}

impl TrajectoryMatch {
    pub fn residue_label(&self) -> String {
        self.residues.iter().join("-")
    }
}

/// Trajectories in which every center of a pattern found a water.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyRecord {
    pub pattern_name: String,
    matches: Vec<TrajectoryMatch>,
}

impl OccupancyRecord {
    pub fn new(pattern_name: &str, matches: Vec<TrajectoryMatch>) -> Self {
        Self {
            pattern_name: pattern_name.to_string(),
            matches,
        }
    }

    /// Number of occupied trajectories, the source trajectory included.
    #[inline]
    pub fn breadth(&self) -> usize {
        self.matches.len()
    }

    pub fn matches(&self) -> &[TrajectoryMatch] {
        &self.matches
    }

    pub fn trajectories(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.trajectory.as_str())
    }

    pub fn get(&self, trajectory_id: &str) -> Option<&TrajectoryMatch> {
        self.matches.iter().find(|m| m.trajectory == trajectory_id)
    }

    pub fn contains(&self, trajectory_id: &str) -> bool {
        self.get(trajectory_id).is_some()
    }
}

struct TrajectoryIndex<'a> {
    id: &'a str,
    waters: &'a [WaterObservation],
    tree: Option<KdTree<XYZ>>,
}

impl<'a> TrajectoryIndex<'a> {
    fn new(id: &'a str, waters: &'a [WaterObservation]) -> Self {
        let tree = (!waters.is_empty()).then(|| {
            KdTree::build_by_ordered_float(waters.iter().map(|w| w.position).collect())
        });
        Self { id, waters, tree }
    }

    /// Closest water within the match radius, earliest one on equal distance.
    fn nearest_water(&self, center: &XYZ) -> Option<&'a WaterObservation> {
        let tree = self.tree.as_ref()?;
        let waters = self.waters;
        let reach = Vector3::repeat(MATCH_RADIUS);
        let bounds = [
            XYZ::from_vector(**center - reach, 0),
            XYZ::from_vector(**center + reach, 0),
        ];
        // `within_radius` drops points lying exactly on the radius.
        tree.within(&bounds)
            .into_iter()
            .filter(|xyz| check_cutoff(xyz, center, MATCH_RADIUS))
            .min_by(|a, b| {
                a.distance(center)
                    .total_cmp(&b.distance(center))
                    .then(a.index().cmp(&b.index()))
            })
            .map(|xyz| &waters[xyz.index()])
    }
}

/// Scores candidate patterns against every trajectory's waters.
pub struct Matcher<'a> {
    indices: Vec<TrajectoryIndex<'a>>,
}

impl<'a> Matcher<'a> {
    pub fn new(trajectories: &'a Trajectories) -> Self {
        let indices = trajectories
            .iter()
            .map(|(id, waters)| TrajectoryIndex::new(id, waters))
            .collect();
        Self { indices }
    }

    pub fn match_pattern(
        &self,
        pattern: &CandidatePattern,
    ) -> Result<OccupancyRecord, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::InconsistentCenterCount {
                pattern: pattern.name.clone(),
            });
        }
        let source = pattern.source_trajectory.as_deref();
        let own = source.map(|trajectory| TrajectoryMatch {
            trajectory: trajectory.to_string(),
            residues: pattern.labels(),
        });
        let matched = self
            .indices
            .iter()
            .filter(|index| Some(index.id) != source)
            .filter_map(|index| {
                pattern
                    .points()
                    .map(|center| index.nearest_water(center).map(|w| w.residue_label.clone()))
                    .collect::<Option<Vec<_>>>()
                    .map(|residues| TrajectoryMatch {
                        trajectory: index.id.to_string(),
                        residues,
                    })
            });
        Ok(OccupancyRecord::new(
            &pattern.name,
            own.into_iter().chain(matched).collect(),
        ))
    }

    /// Matches every candidate in parallel; results keep the input order.
    pub fn match_all(
        &self,
        patterns: &[CandidatePattern],
    ) -> Vec<Result<OccupancyRecord, PatternError>> {
        patterns
            .par_iter()
            .map(|pattern| self.match_pattern(pattern))
            .collect()
    }
}
