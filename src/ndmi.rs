use geo::{BoundingRect, Contains, Coord, MultiPolygon, Point, Rect};
use itertools::Itertools;
use log::info;
use ndarray::{Array2, Zip};
use num_traits::AsPrimitive;

use crate::{
    aoi::AreaOfInterest,
    components::{BandRaster, DataType, Extent, NdmiRaster},
    errors::{NdmiError, Result},
    intersection::Intersection,
};

/// Index cropped to an area of interest, ready for display.
#[derive(Debug, Clone)]
pub struct ClippedResult {
    pub raster: NdmiRaster,
    /// Map extent of `raster`.
    pub extent: Extent,
    /// Mean over the pixels that are not NaN, NaN when there are none.
    pub mean: f64,
    /// Area of interest in the raster CRS.
    pub outline: MultiPolygon,
}

/// Per pixel `(NIR - SWIR) / (NIR + SWIR)` of two aligned bands.
///
/// Pixels where either band holds its nodata value, or where both bands sum
/// to zero, are NaN.
pub fn normalized_difference<N: DataType, S: DataType>(
    nir: &BandRaster<N>,
    swir: &BandRaster<S>,
) -> Result<NdmiRaster> {
    if nir.shape() != swir.shape() {
        return Err(NdmiError::ShapeMismatch {
            nir: nir.shape(),
            swir: swir.shape(),
        });
    }
    let is_nodata = |value: f64, nodata: Option<f64>| nodata.is_some_and(|nodata| value == nodata);

    let mut data = Array2::from_elem(nir.shape(), f64::NAN);
    Zip::from(&mut data)
        .and(nir.data())
        .and(swir.data())
        .for_each(|index, &nir_value, &swir_value| {
            let (nir_value, swir_value): (f64, f64) = (nir_value.as_(), swir_value.as_());
            if is_nodata(nir_value, nir.nodata()) || is_nodata(swir_value, swir.nodata()) {
                return;
            }
            let sum = nir_value + swir_value;
            if sum != 0. {
                *index = (nir_value - swir_value) / sum;
            }
        });
    Ok(NdmiRaster::new(data, *nir.transform(), nir.crs()))
}

/// Crops `ndmi` to the pixel window covering `geometry` and masks it.
///
/// `geometry` must be in the raster CRS. A pixel is kept when its centre lies
/// inside the geometry; kept pixels equal to zero count as nodata.
pub fn clip(ndmi: &NdmiRaster, geometry: &MultiPolygon) -> Result<NdmiRaster> {
    let window = pixel_window(ndmi, geometry)?;
    let (col_offset, row_offset) = (window.min().x as usize, window.min().y as usize);
    let (cols, rows) = (window.width() as usize, window.height() as usize);
    let transform = ndmi.transform().shifted(col_offset, row_offset);

    let data = Array2::from_shape_fn((rows, cols), |(row, col)| {
        let value = ndmi.data()[[row_offset + row, col_offset + col]];
        let center = Point::from(transform.pixel_center(col, row));
        if value == 0. || !geometry.contains(&center) {
            f64::NAN
        } else {
            value
        }
    });
    Ok(NdmiRaster::new(data, transform, ndmi.crs()))
}

/// Pixel rect `(col, row)` of the raster the geometry bounds fall on.
fn pixel_window(raster: &NdmiRaster, geometry: &MultiPolygon) -> Result<Rect<isize>> {
    let bounds = geometry.bounding_rect().ok_or(NdmiError::EmptyAoi)?;
    let inverse = raster.transform().inverse()?;
    let (min, max) = (bounds.min(), bounds.max());
    let corners = [
        min,
        max,
        Coord { x: min.x, y: max.y },
        Coord { x: max.x, y: min.y },
    ]
    .map(|corner| inverse.apply(corner));
    let (Some((left, right)), Some((top, bottom))) = (
        corners.iter().map(|c| c.x).minmax_by(f64::total_cmp).into_option(),
        corners.iter().map(|c| c.y).minmax_by(f64::total_cmp).into_option(),
    ) else {
        return Err(NdmiError::NoIntersection);
    };
    let requested = Rect::new(
        (left.floor() as isize, top.floor() as isize),
        (right.ceil() as isize, bottom.ceil() as isize),
    );
    let full = Rect::new((0, 0), (raster.width() as isize, raster.height() as isize));
    let window = full.intersection(&requested)?;
    if window.width() == 0 || window.height() == 0 {
        return Err(NdmiError::NoIntersection);
    }
    Ok(window)
}

/// Mean of the values that are not NaN.
pub fn nan_mean(values: &Array2<f64>) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|value| !value.is_nan())
        .fold((0., 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Index of `nir` and `swir` clipped to `aoi`, with its mean.
pub fn compute<N: DataType, S: DataType>(
    nir: &BandRaster<N>,
    swir: &BandRaster<S>,
    aoi: &AreaOfInterest,
) -> Result<ClippedResult> {
    let ndmi = normalized_difference(nir, swir)?;
    let outline = aoi.mask_geometry().projected_geometry(ndmi.crs())?;
    let raster = clip(&ndmi, &outline)?;
    let extent = raster.extent();
    let mean = nan_mean(raster.data());
    info!(
        "clipped {}x{} index to {}x{} pixels, mean NDMI {mean:.4}",
        ndmi.width(),
        ndmi.height(),
        raster.width(),
        raster.height()
    );
    Ok(ClippedResult {
        raster,
        extent,
        mean,
        outline,
    })
}
