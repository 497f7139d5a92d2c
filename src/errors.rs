pub type Result<T> = std::result::Result<T, NdmiError>;

#[derive(thiserror::Error, Debug)]
pub enum NdmiError {
    #[error(transparent)]
    ProjError(#[from] proj::ProjError),
    #[error(transparent)]
    ProjCreateError(#[from] proj::ProjCreateError),
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
    #[error(transparent)]
    HttpError(#[from] reqwest::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error(transparent)]
    FontError(#[from] ab_glyph::InvalidFont),
    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("NIR band shape {nir:?} does not match SWIR band shape {swir:?}")]
    ShapeMismatch {
        nir: (usize, usize),
        swir: (usize, usize),
    },
    #[error("There is no intersection between the area of interest and the raster")]
    NoIntersection,
    #[error("No raster was fetched for band {band}")]
    InsufficientBands { band: String },
    #[error("Area of interest contains no polygon features")]
    EmptyAoi,
    #[error("Geometry is not a polygon or multipolygon")]
    UnsupportedGeometry,
    #[error("Raster geo transform is not invertible")]
    NonInvertibleTransform,
    #[error("Scene {id} is invalid: {reason}")]
    InvalidScene { id: String, reason: String },
}

impl NdmiError {
    /// Errors that only invalidate the scene being processed.
    ///
    /// Anything else (reprojection, I/O on the output directory, catalog
    /// failures) halts the whole run.
    pub fn aborts_scene_only(&self) -> bool {
        matches!(
            self,
            NdmiError::ShapeMismatch { .. }
                | NdmiError::InsufficientBands { .. }
                | NdmiError::NoIntersection
        )
    }
}
