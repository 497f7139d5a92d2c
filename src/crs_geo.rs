use std::rc::Rc;

use gdal::spatial_ref::SpatialRef;
use geo::{BoundingRect, Rect};
use proj::{Proj, Transform};

use crate::errors::Result;

/// Geographic WGS84, longitude first.
pub const WGS84: &str = "EPSG:4326";

/// A geometry tagged with the identifier of the CRS its coordinates are in.
#[derive(Debug, Clone)]
pub struct CrsGeometry<G> {
    crs: Rc<str>,
    geometry: G,
}

impl<G> CrsGeometry<G> {
    pub fn new(crs: impl Into<Rc<str>>, geometry: G) -> Self {
        Self {
            crs: crs.into(),
            geometry,
        }
    }

    pub fn crs(&self) -> &str {
        self.crs.as_ref()
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn into_geometry(self) -> G {
        self.geometry
    }
}

impl<G: Transform<f64, Output = G> + Clone> CrsGeometry<G> {
    pub fn with_crs(mut self, crs: &str) -> Result<Self> {
        if self.crs().ne(crs) {
            let proj = Proj::new_known_crs(self.crs(), crs, None)?;
            self.geometry.transform(&proj)?;
            self.crs = Rc::from(crs);
        }
        Ok(self)
    }

    /// Clones if crs is same.
    pub fn projected_geometry(&self, crs: &str) -> Result<G> {
        if self.crs().ne(crs) {
            let proj = Proj::new_known_crs(self.crs(), crs, None)?;
            Ok(self.geometry.transformed(&proj)?)
        } else {
            Ok(self.geometry.clone())
        }
    }
}

impl<G: BoundingRect<f64>> CrsGeometry<G> {
    pub fn bounding_rect(&self) -> Option<CrsGeometry<Rect>> {
        let geometry: Option<Rect> = self.geometry.bounding_rect().into();
        Some(CrsGeometry {
            crs: Rc::clone(&self.crs),
            geometry: geometry?,
        })
    }
}

/// `AUTHORITY:CODE` when gdal can identify the reference system, WKT otherwise.
pub fn crs_identifier(spatial_ref: &mut SpatialRef) -> Result<String> {
    // Shapefile .prj files usually carry ESRI WKT without authority nodes.
    let _ = spatial_ref.auto_identify_epsg();
    match (spatial_ref.auth_name(), spatial_ref.auth_code()) {
        (Some(name), Ok(code)) => Ok(format!("{name}:{code}")),
        _ => Ok(spatial_ref.to_wkt()?),
    }
}
