use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::dedup::ScoredPattern;
use crate::math::mean_position;
use crate::{check_cutoff, MATCH_RADIUS, XYZ};

/// A kept pattern seen as a labeled point group.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCloud {
    pub name: String,
    pub points: Vec<XYZ>,
    pub trajectories: BTreeSet<String>,
}

impl PatternCloud {
    pub fn new(name: &str, points: Vec<XYZ>, trajectories: BTreeSet<String>) -> Self {
        Self {
            name: name.to_string(),
            points,
            trajectories,
        }
    }

    pub fn mean(&self) -> Option<XYZ> {
        mean_position(&self.points)
    }
}

impl From<&ScoredPattern> for PatternCloud {
    fn from(scored: &ScoredPattern) -> Self {
        Self::new(
            scored.name(),
            scored.pattern.points().copied().collect(),
            scored
                .occupancy
                .trajectories()
                .map(str::to_string)
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub region_id: usize,
    pub members: Vec<String>,
    pub trajectories: BTreeSet<String>,
}

impl RegionRecord {
    /// Number of trajectories covered by at least one member.
    #[inline]
    pub fn frequency(&self) -> usize {
        self.trajectories.len()
    }

    /// Member points in member order, looked up by pattern name.
    pub fn points<'a>(&self, clouds: &'a [PatternCloud]) -> Vec<&'a XYZ> {
        self.members
            .iter()
            .filter_map(|name| clouds.iter().find(|cloud| &cloud.name == name))
            .flat_map(|cloud| cloud.points.iter())
            .collect()
    }
}

struct Group {
    anchor: usize,
    members: Vec<usize>,
    trajectories: BTreeSet<String>,
}

fn get_groups(clouds: &[PatternCloud]) -> Vec<Group> {
    let means = clouds.iter().map(PatternCloud::mean).collect::<Vec<_>>();
    means
        .iter()
        .enumerate()
        .filter_map(|(anchor, mean)| {
            let mean = mean.as_ref()?;
            let members = means
                .iter()
                .enumerate()
                .filter(|(_, other)| {
                    other
                        .as_ref()
                        .is_some_and(|other| check_cutoff(mean, other, MATCH_RADIUS))
                })
                .map(|(j, _)| j)
                .collect::<Vec<_>>();
            let trajectories = members
                .iter()
                .flat_map(|&j| clouds[j].trajectories.iter().cloned())
                .collect();
            Some(Group {
                anchor,
                members,
                trajectories,
            })
        })
        .collect()
}

/// Groups patterns around each mean position, ranks the groups by union
/// coverage and greedily accepts those whose members are all unclaimed.
pub fn merge_regions(clouds: &[PatternCloud]) -> Vec<RegionRecord> {
    let mut groups = get_groups(clouds);
    groups.sort_by_key(|g| (Reverse(g.trajectories.len()), g.anchor));

    let mut claimed = vec![false; clouds.len()];
    let mut regions = Vec::new();
    for group in groups {
        if group.members.iter().any(|&j| claimed[j]) {
            continue;
        }
        group.members.iter().for_each(|&j| claimed[j] = true);
        regions.push(RegionRecord {
            region_id: regions.len() + 1,
            members: group
                .members
                .iter()
                .map(|&j| clouds[j].name.clone())
                .collect(),
            trajectories: group.trajectories,
        });
    }
    regions
}
