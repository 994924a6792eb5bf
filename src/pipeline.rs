use crate::dedup::{deduplicate, AcceptedPatternSet, ScoredPattern};
use crate::matcher::Matcher;
use crate::pattern::{load_candidates, CandidatePattern, PointRecord};
use crate::region::{merge_regions, PatternCloud, RegionRecord};
use crate::report::{Event, Reporter};
use crate::water::{Trajectories, WaterRecord};

/// Normalizes raw tuples, reporting and skipping malformed ones.
pub fn load_inputs(
    waters: impl IntoIterator<Item = WaterRecord>,
    points: impl IntoIterator<Item = PointRecord>,
    reporter: &mut impl Reporter,
) -> (Vec<CandidatePattern>, Trajectories) {
    let mut trajectories = Trajectories::new();
    let skipped_waters = trajectories.extend_records(waters);
    let (candidates, skipped_points) = load_candidates(points);
    skipped_waters
        .into_iter()
        .chain(skipped_points)
        .for_each(|err| reporter.report(Event::RecordSkipped(err)));
    (candidates, trajectories)
}

/// Matches every candidate, then keeps the frequent non-redundant ones.
pub fn identify_patterns(
    candidates: &[CandidatePattern],
    trajectories: &Trajectories,
    reporter: &mut impl Reporter,
) -> AcceptedPatternSet {
    reporter.report(Event::Loaded {
        candidates: candidates.len(),
        trajectories: trajectories.len(),
        observations: trajectories.observations_count(),
    });
    if candidates.is_empty() || trajectories.is_empty() {
        reporter.report(Event::EmptyInput);
        return AcceptedPatternSet::default();
    }

    let matcher = Matcher::new(trajectories);
    let scored = candidates
        .iter()
        .zip(matcher.match_all(candidates))
        .filter_map(|(pattern, occupancy)| match occupancy {
            Ok(occupancy) => {
                reporter.report(Event::Matched {
                    pattern: pattern.name.clone(),
                    breadth: occupancy.breadth(),
                });
                Some(ScoredPattern::new(pattern.clone(), occupancy))
            }
            Err(err) => {
                reporter.report(Event::PatternSkipped(err));
                None
            }
        })
        .collect::<Vec<_>>();

    let total = scored.len();
    let set = deduplicate(scored);
    for redundancy in &set.redundant {
        reporter.report(Event::Redundant {
            pattern: redundancy.pattern.clone(),
            contained: redundancy.contained.clone(),
        });
    }
    if let Some(first) = set.infrequent.first() {
        reporter.report(Event::Cutoff {
            pattern: first.clone(),
            remaining: set.infrequent.len(),
        });
    }
    reporter.report(Event::PatternsSummary {
        total,
        duplicated: total - set.kept.len(),
        unique: set.kept.len(),
    });
    set
}

/// Merges kept patterns into disjoint regions.
pub fn extract_regions(clouds: &[PatternCloud], reporter: &mut impl Reporter) -> Vec<RegionRecord> {
    let regions = merge_regions(clouds);
    for region in &regions {
        reporter.report(Event::Region {
            region_id: region.region_id,
            members: region.members.len(),
            frequency: region.frequency(),
        });
    }
    reporter.report(Event::RegionsSummary {
        patterns: clouds.len(),
        regions: regions.len(),
    });
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PatternError, RecordError};

    fn water(id: usize, trajectory: &str, xyz: [f64; 3]) -> WaterRecord {
        WaterRecord {
            id,
            trajectory: trajectory.to_string(),
            residue: format!("W{id:04}"),
            x: xyz[0],
            y: xyz[1],
            z: xyz[2],
            occupancy: 1.0,
            temperature_factor: 0.0,
            element: "O".to_string(),
        }
    }

    fn point(point_id: usize, group: &str, xyz: [f64; 3]) -> PointRecord {
        PointRecord {
            point_id,
            group_name: group.to_string(),
            label: format!("W{point_id:04}"),
            x: xyz[0],
            y: xyz[1],
            z: xyz[2],
        }
    }

    fn waters() -> Vec<WaterRecord> {
        let mut waters = Vec::new();
        for (t, trajectory) in ["0", "1", "2", "3"].iter().enumerate() {
            waters.push(water(10 * t + 1, trajectory, [0.1, 0.0, 0.0]));
            waters.push(water(10 * t + 2, trajectory, [3.0, 0.1, 0.0]));
            if t < 2 {
                waters.push(water(10 * t + 3, trajectory, [20.0, 0.0, 0.1]));
            }
        }
        waters
    }

    #[test]
    fn test_identify_patterns() {
        let points = vec![
            point(1, "TWN_0_1", [0.0, 0.0, 0.0]),
            point(2, "TWN_0_1", [3.0, 0.0, 0.0]),
            point(3, "TWN_1_1", [0.0, 0.2, 0.0]),
            point(4, "TWN_1_1", [3.0, 0.0, 0.2]),
            point(5, "TWN_1_1", [20.0, 0.0, 0.0]),
            point(6, "TWN_2_1", [40.0, 0.0, 0.0]),
            point(7, "TWN_3_1", [f64::NAN, 0.0, 0.0]),
        ];
        let mut events: Vec<Event> = Vec::new();
        let (candidates, trajectories) = load_inputs(waters(), points, &mut events);
        let set = identify_patterns(&candidates, &trajectories, &mut events);

        assert_eq!(
            set.kept.iter().map(ScoredPattern::name).collect::<Vec<_>>(),
            vec!["TWN_0_1"]
        );
        assert_eq!(set.kept[0].breadth(), 4);
        assert_eq!(set.redundant.len(), 1);
        assert_eq!(set.redundant[0].pattern, "TWN_1_1");
        assert_eq!(set.infrequent, vec!["TWN_2_1"]);

        assert!(events.contains(&Event::RecordSkipped(
            RecordError::NonFiniteCoordinate { id: 7 }
        )));
        assert!(events.contains(&Event::PatternSkipped(
            PatternError::InconsistentCenterCount {
                pattern: "TWN_3_1".to_string()
            }
        )));
        assert!(events.contains(&Event::PatternsSummary {
            total: 3,
            duplicated: 2,
            unique: 1,
        }));
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let mut events: Vec<Event> = Vec::new();
        let set = identify_patterns(&[], &Trajectories::new(), &mut events);
        assert_eq!(set, AcceptedPatternSet::default());
        assert!(events.contains(&Event::EmptyInput));
        let regions = extract_regions(&[], &mut events);
        assert!(regions.is_empty());
    }

    #[test]
    fn test_patterns_to_regions() {
        let mut waters = Vec::new();
        for (t, trajectory) in ["0", "1", "2", "3"].iter().enumerate() {
            waters.push(water(10 * t + 1, trajectory, [0.0, 0.0, 0.0]));
            waters.push(water(10 * t + 2, trajectory, [1.8, 0.0, 0.1]));
            if t < 2 {
                waters.push(water(10 * t + 3, trajectory, [20.0, 0.0, 0.0]));
            }
        }
        let points = vec![
            point(1, "TWN_1_1", [0.0, 0.1, 0.0]),
            point(2, "TWN_1_1", [1.8, 0.0, 0.0]),
            point(3, "TWN_0_1", [0.3, 0.0, 0.0]),
            point(4, "TWN_0_2", [20.0, 0.0, 0.0]),
        ];
        let mut events: Vec<Event> = Vec::new();
        let (candidates, trajectories) = load_inputs(waters, points, &mut events);
        let set = identify_patterns(&candidates, &trajectories, &mut events);
        assert_eq!(set.kept.len(), 3);

        let clouds = set.kept.iter().map(PatternCloud::from).collect::<Vec<_>>();
        let regions = extract_regions(&clouds, &mut events);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].members, vec!["TWN_1_1", "TWN_0_1"]);
        assert_eq!(regions[0].frequency(), 4);
        assert_eq!(regions[1].members, vec!["TWN_0_2"]);
        assert_eq!(regions[1].frequency(), 2);
        assert!(events.contains(&Event::RegionsSummary {
            patterns: 3,
            regions: 2
        }));
    }
}
