use ndarray::Array2;

use super::{Extent, GeoTransform};

/// A single georeferenced band held in memory, indexed `[row, col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandRaster<T> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: String,
    nodata: Option<f64>,
}

/// Index values in [-1, 1], NaN where undefined.
pub type NdmiRaster = BandRaster<f64>;

impl<T> BandRaster<T> {
    pub fn new(data: Array2<T>, transform: GeoTransform, crs: impl Into<String>) -> Self {
        Self {
            data,
            transform,
            crs: crs.into(),
            nodata: None,
        }
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn into_data(self) -> Array2<T> {
        self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn extent(&self) -> Extent {
        self.transform.extent(self.width(), self.height())
    }
}

impl<T: Copy> BandRaster<T> {
    pub fn value(&self, row: usize, col: usize) -> Option<T> {
        self.data.get((row, col)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rstest::rstest;

    #[rstest]
    fn shape_and_extent_follow_the_array() {
        let raster = BandRaster::new(
            array![[1u16, 2, 3], [4, 5, 6]],
            GeoTransform::new(10., 0., 100., 0., -10., 50.),
            "EPSG:32645",
        );
        assert_eq!(raster.shape(), (2, 3));
        assert_eq!((raster.width(), raster.height()), (3, 2));
        assert_eq!(
            raster.extent(),
            Extent {
                left: 100.,
                right: 130.,
                bottom: 30.,
                top: 50.
            }
        );
        assert_eq!(raster.value(1, 2), Some(6));
        assert_eq!(raster.value(2, 0), None);
        assert_eq!(raster.nodata(), None);
    }
}
