use crate::error::RecordError;
use crate::XYZ;

/// Cluster point tuple as handed over by a candidate reader.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub point_id: usize,
    pub group_name: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Center {
    pub label: String,
    pub position: XYZ,
}

impl Center {
    pub fn new(label: &str, coords: [f64; 3]) -> Self {
        Self {
            label: label.to_string(),
            position: XYZ::from(coords, 0),
        }
    }
}

impl TryFrom<&PointRecord> for Center {
    type Error = RecordError;

    fn try_from(record: &PointRecord) -> Result<Self, Self::Error> {
        let id = record.point_id;
        if record.group_name.trim().is_empty() {
            return Err(RecordError::MissingGroup { id });
        }
        if record.label.trim().is_empty() {
            return Err(RecordError::MissingLabel { id });
        }
        if ![record.x, record.y, record.z].iter().all(|c| c.is_finite()) {
            return Err(RecordError::NonFiniteCoordinate { id });
        }
        Ok(Center::new(record.label.trim(), [record.x, record.y, record.z]))
    }
}

/// A hypothesized water arrangement extracted from one trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePattern {
    pub name: String,
    pub source_trajectory: Option<String>,
    centers: Vec<Center>,
}

impl CandidatePattern {
    pub fn new(name: &str, centers: Vec<Center>) -> Self {
        let centers = centers
            .into_iter()
            .enumerate()
            .map(|(i, center)| Center {
                position: XYZ::from_vector(*center.position, i),
                ..center
            })
            .collect();
        Self {
            name: name.to_string(),
            source_trajectory: source_trajectory_from_name(name),
            centers,
        }
    }

    pub fn with_source_trajectory(mut self, trajectory_id: &str) -> Self {
        self.source_trajectory = Some(trajectory_id.to_string());
        self
    }

    /// Builds a candidate from the point records of one candidate file.
    pub fn from_records<'a>(
        name: &str,
        records: impl IntoIterator<Item = &'a PointRecord>,
    ) -> (Self, Vec<RecordError>) {
        let mut skipped = Vec::new();
        let centers = records
            .into_iter()
            .filter_map(|record| {
                Center::try_from(record)
                    .map_err(|err| skipped.push(err))
                    .ok()
            })
            .collect();
        (Self::new(name, centers), skipped)
    }

    pub fn centers(&self) -> &[Center] {
        &self.centers
    }

    pub fn points(&self) -> impl Iterator<Item = &XYZ> {
        self.centers.iter().map(|center| &center.position)
    }

    pub fn labels(&self) -> Vec<String> {
        self.centers.iter().map(|c| c.label.clone()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

/// Candidate files are named `<prefix>_<trajectory>[_...]`.
pub fn source_trajectory_from_name(name: &str) -> Option<String> {
    name.split('_')
        .nth(1)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Groups flat point records by candidate name, keeping first-seen order.
pub fn load_candidates(
    records: impl IntoIterator<Item = PointRecord>,
) -> (Vec<CandidatePattern>, Vec<RecordError>) {
    let mut groups: Vec<(String, Vec<PointRecord>)> = Vec::new();
    let mut ungrouped = Vec::new();
    for record in records {
        let name = record.group_name.trim().to_string();
        if name.is_empty() {
            ungrouped.push(RecordError::MissingGroup {
                id: record.point_id,
            });
            continue;
        }
        match groups.iter_mut().find(|(group, _)| *group == name) {
            Some((_, group)) => group.push(record),
            None => groups.push((name, vec![record])),
        }
    }
    groups
        .into_iter()
        .fold((Vec::new(), ungrouped), |(mut patterns, mut skipped), (name, group)| {
            let (pattern, errors) = CandidatePattern::from_records(&name, &group);
            skipped.extend(errors);
            patterns.push(pattern);
            (patterns, skipped)
        })
}
