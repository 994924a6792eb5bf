use std::cmp::Reverse;

use crate::matcher::OccupancyRecord;
use crate::pattern::CandidatePattern;
use crate::{check_cutoff, MATCH_RADIUS};

/// Patterns seen in fewer trajectories than this are not frequent.
pub const MIN_OCCUPANCY: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPattern {
    pub pattern: CandidatePattern,
    pub occupancy: OccupancyRecord,
}

impl ScoredPattern {
    pub fn new(pattern: CandidatePattern, occupancy: OccupancyRecord) -> Self {
        Self { pattern, occupancy }
    }

    pub fn name(&self) -> &str {
        &self.pattern.name
    }

    #[inline]
    pub fn breadth(&self) -> usize {
        self.occupancy.breadth()
    }
}

/// A pattern rejected because an already kept pattern is reproduced by it.
#[derive(Debug, Clone, PartialEq)]
pub struct Redundancy {
    pub pattern: String,
    pub contained: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptedPatternSet {
    /// Kept patterns, most occupied first.
    pub kept: Vec<ScoredPattern>,
    pub redundant: Vec<Redundancy>,
    /// Patterns from the first infrequent one onward, never evaluated.
    pub infrequent: Vec<String>,
}

impl AcceptedPatternSet {
    pub fn total(&self) -> usize {
        self.kept.len() + self.redundant.len() + self.infrequent.len()
    }
}

/// True when every center of `kept` has a point of `pattern` within the match radius.
pub fn is_contained(kept: &CandidatePattern, pattern: &CandidatePattern) -> bool {
    kept.points().all(|center| {
        pattern
            .points()
            .any(|point| check_cutoff(center, point, MATCH_RADIUS))
    })
}

/// Sorts by descending occupancy (ties keep input order) and greedily keeps
/// the patterns that do not reproduce an already kept one.
pub fn deduplicate(scored: Vec<ScoredPattern>) -> AcceptedPatternSet {
    let mut ranked = scored.into_iter().enumerate().collect::<Vec<_>>();
    ranked.sort_by_key(|(i, p)| (Reverse(p.breadth()), *i));

    let mut set = AcceptedPatternSet::default();
    let mut ranked = ranked.into_iter().map(|(_, p)| p);
    while let Some(candidate) = ranked.next() {
        if candidate.breadth() < MIN_OCCUPANCY {
            set.infrequent = std::iter::once(candidate)
                .chain(ranked)
                .map(|p| p.pattern.name)
                .collect();
            break;
        }
        let container = set
            .kept
            .iter()
            .find(|kept| is_contained(&kept.pattern, &candidate.pattern));
        match container {
            Some(kept) => set.redundant.push(Redundancy {
                pattern: candidate.name().to_string(),
                contained: kept.name().to_string(),
            }),
            None => set.kept.push(candidate),
        }
    }
    set
}
