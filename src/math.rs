use nalgebra::Vector3;
use std::iter;

use crate::XYZ;

pub trait IteratorMean<T>: Iterator<Item = T> {
    fn mean(self) -> Option<Vector3<f64>>;
}

impl<I> IteratorMean<Vector3<f64>> for I
where
    I: Iterator<Item = Vector3<f64>>,
{
    fn mean(self) -> Option<Vector3<f64>> {
        iter::zip(self, 1usize..)
            .reduce(|(sum, _), (next, cnt)| (sum + next, cnt))
            .map(|(sum, cnt)| sum / cnt as f64)
    }
}

/// Mean position of a point cloud, `None` when it is empty.
pub fn mean_position<'a>(points: impl IntoIterator<Item = &'a XYZ>) -> Option<XYZ> {
    points
        .into_iter()
        .map(|xyz| **xyz)
        .mean()
        .map(|mean| XYZ::from_vector(mean, 0))
}
