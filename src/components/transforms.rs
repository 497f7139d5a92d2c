use geo::{AffineTransform, Coord};
use itertools::Itertools;
use shrinkwraprs::Shrinkwrap;

use crate::errors::{NdmiError, Result};

/// Pixel (col, row) to map coordinates of a band.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(AffineTransform);

impl GeoTransform {
    pub fn new(a: f64, b: f64, xoff: f64, d: f64, e: f64, yoff: f64) -> Self {
        Self(AffineTransform::new(a, b, xoff, d, e, yoff))
    }

    /// From gdal's `[xoff, a, b, yoff, d, e]` ordering.
    pub fn from_gdal(gdal_transform: [f64; 6]) -> Self {
        Self::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        )
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.xoff(),
            self.a(),
            self.b(),
            self.yoff(),
            self.d(),
            self.e(),
        ]
    }

    /// Map to pixel coordinates.
    pub fn inverse(&self) -> Result<AffineTransform> {
        self.0.inverse().ok_or(NdmiError::NonInvertibleTransform)
    }

    pub fn pixel_center(&self, col: usize, row: usize) -> Coord {
        self.apply(Coord {
            x: col as f64 + 0.5,
            y: row as f64 + 0.5,
        })
    }

    /// Transform of a window whose top left pixel is `(col, row)` of this one.
    pub fn shifted(&self, col: usize, row: usize) -> Self {
        let origin = self.apply(Coord {
            x: col as f64,
            y: row as f64,
        });
        Self::new(self.a(), self.b(), origin.x, self.d(), self.e(), origin.y)
    }

    /// Map extent covered by `width` x `height` pixels.
    pub fn extent(&self, width: usize, height: usize) -> Extent {
        let corners = [(0., 0.), (width as f64, 0.), (0., height as f64), (width as f64, height as f64)]
            .map(|(x, y)| self.apply(Coord { x, y }));
        let (left, right) = corners
            .iter()
            .map(|corner| corner.x)
            .minmax_by(f64::total_cmp)
            .into_option()
            .unwrap_or_default();
        let (bottom, top) = corners
            .iter()
            .map(|corner| corner.y)
            .minmax_by(f64::total_cmp)
            .into_option()
            .unwrap_or_default();
        Extent {
            left,
            right,
            bottom,
            top,
        }
    }
}

/// Bounding box in map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn contains(&self, other: &Extent) -> bool {
        self.left <= other.left
            && other.right <= self.right
            && self.bottom <= other.bottom
            && other.top <= self.top
    }
}
