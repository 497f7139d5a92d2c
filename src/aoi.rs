use gdal::{vector::LayerAccess, Dataset};
use geo::{Geometry, MultiPolygon};
use log::{info, warn};
use std::path::Path;

use crate::{
    crs_geo::{crs_identifier, CrsGeometry, WGS84},
    errors::{NdmiError, Result},
};

/// Polygon features constraining all processing, with the CRS they are in.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    crs: String,
    features: Vec<MultiPolygon>,
}

impl AreaOfInterest {
    pub fn new(crs: impl Into<String>, features: Vec<MultiPolygon>) -> Result<Self> {
        if features.is_empty() {
            return Err(NdmiError::EmptyAoi);
        }
        Ok(Self {
            crs: crs.into(),
            features,
        })
    }

    /// Reads every areal feature of the first layer of a vector file.
    ///
    /// Layers without a spatial reference are taken to be [WGS84].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dataset = Dataset::open(path.as_ref())?;
        let mut layer = dataset.layer(0)?;
        let crs = match layer.spatial_ref() {
            Some(mut spatial_ref) => crs_identifier(&mut spatial_ref)?,
            None => {
                warn!("{:?} has no spatial reference, assuming {WGS84}", path.as_ref());
                WGS84.to_string()
            }
        };

        let mut features = Vec::new();
        for (index, feature) in layer.features().enumerate() {
            let Some(geometry) = feature.geometry() else {
                warn!("feature {index} has no geometry, skipping");
                continue;
            };
            match into_multi_polygon(geometry.to_geo()?) {
                Ok(polygons) => features.push(polygons),
                Err(_) => warn!("feature {index} is not areal, skipping"),
            }
        }

        let aoi = Self::new(crs, features)?;
        info!(
            "loaded {} area of interest feature(s) from {:?} in {}",
            aoi.features.len(),
            path.as_ref(),
            aoi.crs
        );
        Ok(aoi)
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn features(&self) -> &[MultiPolygon] {
        &self.features
    }

    /// First feature, used to query the catalog.
    pub fn search_geometry(&self) -> CrsGeometry<MultiPolygon> {
        CrsGeometry::new(self.crs.as_str(), self.features[0].clone())
    }

    /// All features as one multipolygon, used for masking and outlines.
    pub fn mask_geometry(&self) -> CrsGeometry<MultiPolygon> {
        let polygons = self
            .features
            .iter()
            .flat_map(|feature| feature.0.iter().cloned())
            .collect();
        CrsGeometry::new(self.crs.as_str(), MultiPolygon::new(polygons))
    }
}

fn into_multi_polygon(geometry: Geometry) -> Result<MultiPolygon> {
    match geometry {
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(polygons) => Ok(polygons),
        Geometry::Rect(rect) => Ok(MultiPolygon::new(vec![rect.to_polygon()])),
        _ => Err(NdmiError::UnsupportedGeometry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use rstest::rstest;

    #[rstest]
    fn empty_feature_list_is_rejected() {
        assert!(matches!(
            AreaOfInterest::new(WGS84, vec![]),
            Err(NdmiError::EmptyAoi)
        ));
    }

    #[rstest]
    fn search_uses_first_feature_and_mask_uses_all() {
        let first: MultiPolygon = polygon![(x: 0., y: 0.), (x: 1., y: 0.), (x: 1., y: 1.)].into();
        let second: MultiPolygon = polygon![(x: 5., y: 5.), (x: 6., y: 5.), (x: 6., y: 6.)].into();
        let aoi = AreaOfInterest::new(WGS84, vec![first.clone(), second]).unwrap();

        assert_eq!(aoi.search_geometry().geometry(), &first);
        assert_eq!(aoi.mask_geometry().geometry().0.len(), 2);
        assert_eq!(aoi.mask_geometry().crs(), WGS84);
    }

    #[rstest]
    fn points_are_not_areal() {
        let point = Geometry::Point(geo::Point::new(1., 2.));
        assert!(matches!(
            into_multi_polygon(point),
            Err(NdmiError::UnsupportedGeometry)
        ));
    }
}
