use std::{fmt::Debug, path::Path};

use crate::{
    components::{BandRaster, GeoTransform},
    crs_geo::crs_identifier,
    errors::Result,
};

/// Implementations for gdal
pub mod gdal_backend {
    use super::*;
    use gdal::{raster::GdalType, Dataset as GdalDataset};
    use log::debug;
    use ndarray::Array2;
    use num_traits::AsPrimitive;

    /// Pixel types a band can be read as.
    pub trait DataType: GdalType + AsPrimitive<f64> + Copy + Debug {}

    impl<T: GdalType + AsPrimitive<f64> + Copy + Debug> DataType for T {}

    impl<T: DataType> BandRaster<T> {
        /// Reads the first band of a raster file, with its georeferencing and nodata value.
        pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            let dataset = GdalDataset::open(path.as_ref())?;
            let (width, height) = dataset.raster_size();
            let transform = GeoTransform::from_gdal(dataset.geo_transform()?);
            let crs = match dataset.spatial_ref() {
                Ok(mut spatial_ref) => crs_identifier(&mut spatial_ref)?,
                Err(_) => dataset.projection(),
            };
            let rasterband = dataset.rasterband(1)?;
            let nodata = rasterband.no_data_value();
            let buffer = rasterband.read_as::<T>((0, 0), (width, height), (width, height), None)?;
            let data = Array2::from_shape_vec((height, width), buffer.data().to_vec())?;
            debug!(
                "read {}x{} band from {:?} in {crs}, nodata {nodata:?}",
                width,
                height,
                path.as_ref()
            );
            Ok(BandRaster::new(data, transform, crs).with_nodata(nodata))
        }
    }
}
