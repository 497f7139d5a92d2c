use geo::{CoordNum, Rect};

use crate::errors::{NdmiError, Result};

pub trait Intersection {
    type Output;
    fn intersection(&self, rhs: &Self) -> Result<Self::Output>;
}

/// Intersection of two rects with a non zero area.
impl<T: CoordNum> Intersection for Rect<T> {
    type Output = Rect<T>;
    fn intersection(&self, rhs: &Self) -> Result<Rect<T>> {
        let (lhs_min, lhs_max) = (self.min(), self.max());
        let (rhs_min, rhs_max) = (rhs.min(), rhs.max());
        if (lhs_max.x <= rhs_min.x) | (lhs_max.y <= rhs_min.y) {
            return Err(NdmiError::NoIntersection);
        }
        if (lhs_min.x >= rhs_max.x) | (lhs_min.y >= rhs_max.y) {
            return Err(NdmiError::NoIntersection);
        }

        let max_of = |x: T, y: T| if x > y { x } else { y };
        let min_of = |x: T, y: T| if x < y { x } else { y };
        let min = (max_of(lhs_min.x, rhs_min.x), max_of(lhs_min.y, rhs_min.y));
        let max = (min_of(lhs_max.x, rhs_max.x), min_of(lhs_max.y, rhs_max.y));

        Ok(Self::new(min, max))
    }
}
