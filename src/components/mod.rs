pub mod backends;
pub mod raster;
pub mod transforms;

pub use backends::gdal_backend::DataType;
pub use raster::{BandRaster, NdmiRaster};
pub use transforms::{Extent, GeoTransform};
