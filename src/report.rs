use log::{debug, info, warn};

use crate::error::{PatternError, RecordError};

/// Progress and summary events emitted by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Loaded {
        candidates: usize,
        trajectories: usize,
        observations: usize,
    },
    EmptyInput,
    RecordSkipped(RecordError),
    PatternSkipped(PatternError),
    Matched {
        pattern: String,
        breadth: usize,
    },
    Redundant {
        pattern: String,
        contained: String,
    },
    Cutoff {
        pattern: String,
        remaining: usize,
    },
    PatternsSummary {
        total: usize,
        duplicated: usize,
        unique: usize,
    },
    Region {
        region_id: usize,
        members: usize,
        frequency: usize,
    },
    RegionsSummary {
        patterns: usize,
        regions: usize,
    },
}

pub trait Reporter {
    fn report(&mut self, event: Event);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, event: Event) {
        match event {
            Event::Loaded {
                candidates,
                trajectories,
                observations,
            } => info!(
                "Loaded {candidates} candidate patterns, {observations} waters in {trajectories} trajectories"
            ),
            Event::EmptyInput => warn!("No candidates or no trajectories, nothing to match"),
            Event::RecordSkipped(err) => warn!("Skipping record: {err}"),
            Event::PatternSkipped(err) => warn!("Skipping pattern: {err}"),
            Event::Matched { pattern, breadth } => {
                debug!("{pattern} occupies {breadth} trajectories")
            }
            Event::Redundant { pattern, contained } => {
                debug!("{pattern} reproduces {contained}, dropped")
            }
            Event::Cutoff { pattern, remaining } => info!(
                "Occupancy below cutoff from {pattern} on, {remaining} patterns not evaluated"
            ),
            Event::PatternsSummary {
                total,
                duplicated,
                unique,
            } => info!(
                "Unique patterns = {total}(total) - {duplicated}(duplicated) = {unique}"
            ),
            Event::Region {
                region_id,
                members,
                frequency,
            } => debug!("Region {region_id}: {members} patterns, frequency {frequency}"),
            Event::RegionsSummary { patterns, regions } => {
                info!("{regions} regions extracted from {patterns} patterns")
            }
        }
    }
}

impl Reporter for Vec<Event> {
    fn report(&mut self, event: Event) {
        self.push(event);
    }
}
