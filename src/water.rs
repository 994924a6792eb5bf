use std::collections::BTreeMap;

use crate::error::RecordError;
use crate::XYZ;

/// Water atom tuple as handed over by a trajectory reader.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterRecord {
    pub id: usize,
    pub trajectory: String,
    pub residue: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub occupancy: f64,
    pub temperature_factor: f64,
    pub element: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaterObservation {
    pub source_id: usize,
    pub trajectory_id: String,
    pub residue_label: String,
    pub position: XYZ,
    pub element: String,
}

impl TryFrom<WaterRecord> for WaterObservation {
    type Error = RecordError;

    fn try_from(record: WaterRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        if record.trajectory.trim().is_empty() {
            return Err(RecordError::MissingTrajectory { id });
        }
        if record.residue.trim().is_empty() {
            return Err(RecordError::MissingResidue { id });
        }
        if ![record.x, record.y, record.z].iter().all(|c| c.is_finite()) {
            return Err(RecordError::NonFiniteCoordinate { id });
        }
        let element = match record.element.trim() {
            "" => "O".to_string(),
            element => element.to_string(),
        };
        Ok(Self {
            source_id: id,
            trajectory_id: record.trajectory.trim().to_string(),
            residue_label: record.residue.trim().to_string(),
            position: XYZ::from([record.x, record.y, record.z], 0),
            element,
        })
    }
}

/// Water observations grouped by trajectory id.
#[derive(Debug, Default, Clone)]
pub struct Trajectories {
    waters: BTreeMap<String, Vec<WaterObservation>>,
}

impl Trajectories {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a trajectory even if no water survives for it.
    pub fn insert_trajectory(&mut self, trajectory_id: &str) {
        self.waters.entry(trajectory_id.to_string()).or_default();
    }

    pub fn push(&mut self, mut observation: WaterObservation) {
        let waters = self
            .waters
            .entry(observation.trajectory_id.clone())
            .or_default();
        observation.position = XYZ::from_vector(*observation.position, waters.len());
        waters.push(observation);
    }

    /// Validates and adds records, returning the ones that were skipped.
    pub fn extend_records(
        &mut self,
        records: impl IntoIterator<Item = WaterRecord>,
    ) -> Vec<RecordError> {
        records
            .into_iter()
            .filter_map(|record| match WaterObservation::try_from(record) {
                Ok(observation) => {
                    self.push(observation);
                    None
                }
                Err(err) => Some(err),
            })
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.waters.keys().map(String::as_str)
    }

    pub fn get(&self, trajectory_id: &str) -> Option<&[WaterObservation]> {
        self.waters.get(trajectory_id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[WaterObservation])> {
        self.waters
            .iter()
            .map(|(id, waters)| (id.as_str(), waters.as_slice()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.waters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waters.is_empty()
    }

    pub fn observations_count(&self) -> usize {
        self.waters.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: usize, trajectory: &str, residue: &str, xyz: [f64; 3]) -> WaterRecord {
        WaterRecord {
            id,
            trajectory: trajectory.to_string(),
            residue: residue.to_string(),
            x: xyz[0],
            y: xyz[1],
            z: xyz[2],
            occupancy: 1.0,
            temperature_factor: 0.0,
            element: String::new(),
        }
    }

    #[test]
    fn test_extend_records_skips_malformed() {
        let mut trajectories = Trajectories::new();
        let skipped = trajectories.extend_records([
            record(1, "0", "W0001", [0.0, 0.0, 0.0]),
            record(2, "", "W0002", [0.0, 0.0, 0.0]),
            record(3, "1", " ", [0.0, 0.0, 0.0]),
            record(4, "1", "W0004", [f64::NAN, 0.0, 0.0]),
            record(5, "1", "W0005", [1.0, 2.0, 3.0]),
            record(6, "0", "W0006", [4.0, 5.0, 6.0]),
        ]);
        assert_eq!(
            skipped,
            vec![
                RecordError::MissingTrajectory { id: 2 },
                RecordError::MissingResidue { id: 3 },
                RecordError::NonFiniteCoordinate { id: 4 },
            ]
        );
        assert_eq!(trajectories.len(), 2);
        assert_eq!(trajectories.observations_count(), 3);
        let first = trajectories.get("0").unwrap();
        assert_eq!(first[0].element, "O");
        assert_eq!(first[0].position.index(), 0);
        assert_eq!(first[1].position.index(), 1);
        assert_eq!(first[1].residue_label, "W0006");
    }

    #[test]
    fn test_insert_empty_trajectory() {
        let mut trajectories = Trajectories::new();
        trajectories.insert_trajectory("7");
        assert_eq!(trajectories.len(), 1);
        assert_eq!(trajectories.get("7").map(<[_]>::len), Some(0));
        assert_eq!(trajectories.ids().collect::<Vec<_>>(), vec!["7"]);
    }
}
