use kd_tree::KdPoint;
use nalgebra::Vector3;
use std::ops::Deref;

/// Distance used for water-to-center matching, containment and grouping.
pub const MATCH_RADIUS: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
pub struct XYZ {
    coords: Vector3<f64>,
    index: usize,
}

impl XYZ {
    pub fn from(coords: [f64; 3], index: usize) -> Self {
        Self {
            coords: Vector3::from(coords),
            index,
        }
    }

    pub fn from_vector(coords: Vector3<f64>, index: usize) -> Self {
        Self { coords, index }
    }

    pub fn x(&self) -> f64 {
        self.coords.x
    }
    pub fn y(&self) -> f64 {
        self.coords.y
    }
    pub fn z(&self) -> f64 {
        self.coords.z
    }

    /// Position of the record this point was built from.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn distance(&self, other: &XYZ) -> f64 {
        (self.coords - other.coords).norm()
    }
}

impl Deref for XYZ {
    type Target = Vector3<f64>;

    fn deref(&self) -> &Self::Target {
        &self.coords
    }
}

impl PartialEq for XYZ {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
    }
}

impl KdPoint for XYZ {
    type Scalar = f64;
    type Dim = typenum::U3;
    fn at(&self, i: usize) -> f64 {
        self.coords[i]
    }
}

pub fn check_cutoff(a: &XYZ, b: &XYZ, cutoff: f64) -> bool {
    let d_x = a.x() - b.x();
    let d_y = a.y() - b.y();
    let d_z = a.z() - b.z();
    d_x * d_x + d_y * d_y + d_z * d_z <= cutoff * cutoff
}
